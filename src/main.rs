use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use vortexfoil::config::SimulationConfig;
use vortexfoil::map::outline;
use vortexfoil::{PerformanceMetrics, Simulation, Snapshot};

/// Outline resolution for drawing the body.
const OUTLINE_POINTS: usize = 200;
/// Colour levels per vortex sign.
const SHADES: usize = 4;

/// Vortex shedding past an airfoil, run and shown interactively.
#[derive(Parser)]
#[command(name = "vortexfoil")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discrete vortex shedding past a conformally mapped airfoil", long_about = None)]
struct Cli {
    /// Scenario file (YAML); built-in NACA 4412 case when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

struct VortexViewer {
    config: SimulationConfig,
    naca_code: String,
    simulation: Option<Simulation>,
    running: bool,
    steps_per_frame: usize,
    frame: usize,
    follow: bool,
    show_vortices: bool,
    show_tracers: bool,
    status: Option<String>,
}

impl VortexViewer {
    fn new(_cc: &eframe::CreationContext<'_>, config: SimulationConfig) -> Self {
        let naca_code = match &config.airfoil.code {
            Some(code) => code.clone(),
            None => format!(
                "{:.0}{:.0}{:02.0}",
                config.airfoil.camber * 100.0,
                config.airfoil.camber_location * 10.0,
                config.airfoil.thickness * 100.0
            ),
        };
        Self {
            config,
            naca_code,
            simulation: None,
            running: false,
            steps_per_frame: 4,
            frame: 0,
            follow: true,
            show_vortices: true,
            show_tracers: true,
            status: None,
        }
    }

    fn start_simulation(&mut self) {
        self.config.airfoil.code = Some(self.naca_code.clone());
        self.frame = 0;
        match Simulation::from_config(&self.config) {
            Ok(simulation) => {
                self.simulation = Some(simulation);
                self.running = true;
                self.status = None;
            }
            Err(err) => {
                error!(%err, "could not start simulation");
                self.simulation = None;
                self.running = false;
                self.status = Some(err.to_string());
            }
        }
    }

    fn advance(&mut self) {
        let Some(simulation) = self.simulation.as_mut() else {
            self.running = false;
            return;
        };
        for _ in 0..self.steps_per_frame {
            if simulation.time() + 0.5 * simulation.dt() >= self.config.numerics.t_end {
                self.running = false;
                break;
            }
            if let Err(err) = simulation.step() {
                error!(%err, "simulation stopped");
                self.status = Some(err.to_string());
                self.running = false;
                break;
            }
        }
        if self.follow {
            self.frame = simulation.trajectory().snapshots().len().saturating_sub(1);
        }
    }

    fn snapshot(&self) -> Option<&Snapshot> {
        let snapshots = self.simulation.as_ref()?.trajectory().snapshots();
        snapshots.get(self.frame.min(snapshots.len().checked_sub(1)?))
    }

    fn body_points(&self, snapshot: &Snapshot) -> Option<PlotPoints> {
        let simulation = self.simulation.as_ref()?;
        let mut points: Vec<[f64; 2]> = outline(simulation.state().body.map(), OUTLINE_POINTS)
            .into_iter()
            .map(|z| {
                let z = snapshot.pose.to_physical(z);
                [z.re, z.im]
            })
            .collect();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Some(PlotPoints::new(points))
    }

    fn strength_to_color(gamma: f64, max: f64) -> egui::Color32 {
        // Red counterclockwise, blue clockwise, fading with strength
        let t = if max > 0.0 { (gamma.abs() / max).min(1.0) } else { 0.0 };
        let shade = ((1.0 - t) * 180.0) as u8;
        if gamma >= 0.0 {
            egui::Color32::from_rgb(255, shade, shade)
        } else {
            egui::Color32::from_rgb(shade, shade, 255)
        }
    }

    fn draw_wake(&self, plot_ui: &mut egui_plot::PlotUi, snapshot: &Snapshot) {
        if self.show_tracers && !snapshot.tracers.is_empty() {
            let tracers: Vec<[f64; 2]> = snapshot.tracers.iter().map(|z| [z.re, z.im]).collect();
            plot_ui.points(
                Points::new(tracers)
                    .radius(1.0)
                    .color(egui::Color32::GRAY)
                    .name("Tracers"),
            );
        }

        if self.show_vortices {
            let max = snapshot
                .vortices
                .iter()
                .map(|(_, gamma)| gamma.abs())
                .fold(0.0_f64, f64::max);
            // One plot item per shade
            let mut buckets = vec![Vec::new(); 2 * SHADES];
            for &(z, gamma) in &snapshot.vortices {
                let level = if max > 0.0 {
                    ((gamma.abs() / max) * SHADES as f64).ceil() as usize
                } else {
                    1
                };
                let offset = if gamma >= 0.0 { 0 } else { SHADES };
                buckets[offset + level.clamp(1, SHADES) - 1].push([z.re, z.im]);
            }
            for (k, points) in buckets.into_iter().enumerate() {
                if points.is_empty() {
                    continue;
                }
                let sign = if k < SHADES { 1.0 } else { -1.0 };
                let gamma = sign * ((k % SHADES) + 1) as f64 / SHADES as f64;
                plot_ui.points(
                    Points::new(points)
                        .radius(2.0)
                        .color(Self::strength_to_color(gamma, 1.0))
                        .name(if sign > 0.0 { "Γ > 0" } else { "Γ < 0" }),
                );
            }
        }
    }

    fn coefficient_history(&self) -> Option<(Vec<[f64; 2]>, Vec<[f64; 2]>)> {
        let simulation = self.simulation.as_ref()?;
        let direction = simulation.state().freestream.direction();
        let axes = vortexfoil::C64::from_polar(1.0, -direction);
        let times = simulation.trajectory().times();
        let mut lift = Vec::new();
        let mut drag = Vec::new();
        for (t, c) in times.iter().skip(1).zip(simulation.force_coefficients()) {
            let c = c * axes;
            lift.push([*t, c.im]);
            drag.push([*t, c.re]);
        }
        Some((lift, drag))
    }

    fn show_performance_metrics(ui: &mut egui::Ui, metrics: &PerformanceMetrics) {
        ui.heading("Mean Coefficients");

        egui::Frame::none()
            .fill(ui.visuals().extreme_bg_color)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.label(format!("Lift Coefficient (CL): {:.3}", metrics.cl));
                    ui.label(format!("Drag Coefficient (CD): {:.4}", metrics.cd));
                    if metrics.cd.abs() > 1e-12 {
                        ui.label(format!("Lift-to-Drag Ratio (L/D): {:.1}", metrics.cl / metrics.cd));
                    }
                });
            });
    }
}

impl eframe::App for VortexViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.running {
            self.advance();
            ctx.request_repaint();
        }

        egui::SidePanel::left("controls").show(ctx, |ui| {
            ui.heading("Simulation Controls");

            ui.horizontal(|ui| {
                ui.label("NACA:");
                ui.text_edit_singleline(&mut self.naca_code);
            });

            ui.add(egui::Slider::new(&mut self.config.body.angle_deg, -30.0..=30.0)
                .text("Body Angle (°)"));
            ui.add(egui::Slider::new(&mut self.config.freestream.speed, 0.0..=5.0)
                .text("Freestream Speed"));
            ui.add(egui::Slider::new(&mut self.config.numerics.t_end, 0.1..=10.0)
                .text("End Time"));
            ui.add(egui::Slider::new(&mut self.steps_per_frame, 1..=20)
                .text("Steps per Frame"));

            ui.horizontal(|ui| {
                if ui.button("Run Simulation").clicked() {
                    self.start_simulation();
                }
                let label = if self.running { "Pause" } else { "Resume" };
                if ui
                    .add_enabled(self.simulation.is_some(), egui::Button::new(label))
                    .clicked()
                {
                    self.running = !self.running;
                }
            });

            ui.checkbox(&mut self.show_vortices, "Show Vortices");
            ui.checkbox(&mut self.show_tracers, "Show Tracers");

            if let Some(status) = &self.status {
                ui.colored_label(egui::Color32::RED, status);
            }

            ui.separator();
            if let Some(simulation) = &self.simulation {
                let state = simulation.state();
                ui.label(format!("t = {:.3}", state.t));
                ui.label(format!("Vortices: {}", state.vortices.len()));
                ui.label(format!("Wake Circulation: {:.4}", state.vortices.circulation()));
                Self::show_performance_metrics(ui, &simulation.mean_coefficients());

                ui.separator();
                let last = simulation.trajectory().snapshots().len().saturating_sub(1);
                ui.checkbox(&mut self.follow, "Follow Latest");
                ui.add_enabled(!self.follow, egui::Slider::new(&mut self.frame, 0..=last)
                    .text("Snapshot"));
            } else {
                ui.label("Run simulation to see the wake");
            }
        });

        egui::TopBottomPanel::bottom("history")
            .resizable(true)
            .show(ctx, |ui| {
                Plot::new("coefficient_plot")
                    .height(180.0)
                    .legend(Legend::default())
                    .show(ui, |plot_ui| {
                        if let Some((lift, drag)) = self.coefficient_history() {
                            plot_ui.line(Line::new(lift)
                                .color(egui::Color32::from_rgb(255, 100, 100))
                                .name("CL"));
                            plot_ui.line(Line::new(drag)
                                .color(egui::Color32::from_rgb(100, 100, 255))
                                .name("CD"));
                        }
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Wake");

            let plot = Plot::new("wake_plot")
                .data_aspect(1.0)
                .include_x(-1.0)
                .include_x(3.0)
                .include_y(-1.0)
                .include_y(1.0);

            plot.show(ui, |plot_ui| {
                let Some(snapshot) = self.snapshot() else {
                    return;
                };
                if let Some(points) = self.body_points(snapshot) {
                    plot_ui.line(Line::new(points)
                        .color(egui::Color32::DARK_RED)
                        .width(2.0));
                }
                self.draw_wake(plot_ui, snapshot);
            });
        });
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = match &cli.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vortex Shedding Simulator",
        options,
        Box::new(move |cc| Box::new(VortexViewer::new(cc, config))),
    )
    .map_err(|err| anyhow::anyhow!("viewer failed: {err}"))
}
