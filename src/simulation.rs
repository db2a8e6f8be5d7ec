//! A complete run: initial seeding, stepping, archiving and force history.

use std::sync::Arc;

use tracing::{debug, info};

use crate::body::{Pose, RigidBody};
use crate::config::{AirfoilConfig, MapKind, NumericsConfig, SimulationConfig, TracerConfig};
use crate::diagnostics::{
    force_coefficients, impulse, mean_coefficients, DivergenceMonitor, PerformanceMetrics,
};
use crate::elements::Blob;
use crate::error::{ConfigError, MapError, Result};
use crate::freestream::Freestream;
use crate::integrator::Integrator;
use crate::map::{chord, ConformalMap, JoukowskiMap, TheodorsenMap};
use crate::motion::Kinematics;
use crate::solver::{enforce_no_flow_through, SheddingModel};
use crate::state::{SystemState, Trajectory};
use crate::C64;

/// Outline points used to measure the reference chord.
const CHORD_SAMPLES: usize = 256;

#[derive(Debug)]
pub struct Simulation {
    integrator: Integrator,
    kinematics: Box<dyn Kinematics>,
    shedding: SheddingModel,
    trajectory: Trajectory,
    monitor: DivergenceMonitor,
    collocation_points: usize,
    sample_every: usize,
    steps: usize,
    chord: f64,
    scale: f64,
}

impl Simulation {
    /// Build the body, freestream, tracers and shedding edges described by
    /// `config`, then seed the edges.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let map = section_map(&config.airfoil)?;
        let [x, y] = config.body.centroid;
        let pose = Pose::new(C64::new(x, y), config.body.angle_deg.to_radians());
        let edges = config.edges.iter().map(|e| e.vertex).collect();
        let body = RigidBody::new(map, pose, edges)?.with_circulation(config.body.circulation);
        let freestream = Freestream::new(
            config.freestream.speed,
            config.freestream.angle_deg.to_radians(),
        );

        let mut state = SystemState::new(body, freestream);
        if let Some(tracers) = &config.tracers {
            seed_tracers(&mut state, tracers)?;
        }
        let shedding = SheddingModel::new(
            config.edges.iter().map(|e| e.suction).collect(),
            config.numerics.shed_fraction,
            config.numerics.seed_offset,
        );
        Simulation::new(state, config.motion.kinematics(), shedding, &config.numerics)
    }

    /// Start a run from `state` at its current time. Every shedding edge
    /// receives its seed blob here.
    pub fn new(
        mut state: SystemState,
        kinematics: Box<dyn Kinematics>,
        mut shedding: SheddingModel,
        numerics: &NumericsConfig,
    ) -> Result<Self> {
        numerics.validate()?;
        let t = state.t;
        let motion = kinematics.motion(t);
        enforce_no_flow_through(&mut state.body, &motion, &state.freestream, &[&state.vortices], t);
        shedding.seed(&mut state.body, &motion, &state.freestream, &mut state.vortices, t)?;

        let chord = chord(state.body.map(), CHORD_SAMPLES);
        // Force coefficients are scaled by the freestream; unit speed in still fluid.
        let speed = match state.freestream.speed() {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let scale = 2.0 / (speed * speed * chord);

        let mut trajectory = Trajectory::default();
        let p = impulse(&state.body, &[&state.vortices], numerics.collocation_points);
        trajectory.record_impulse(t, p);
        trajectory.record_snapshot(state.snapshot());
        let mut monitor = DivergenceMonitor::new(numerics.divergence_radius);
        monitor.check(&state, p);

        info!(
            chord,
            edges = state.body.edges().len(),
            shedding = shedding.shedding_edges(),
            tracers = state.tracers.len(),
            dt = numerics.dt,
            "simulation initialised"
        );

        Ok(Simulation {
            integrator: Integrator::new(state, numerics.kernel, numerics.dt),
            kinematics,
            shedding,
            trajectory,
            monitor,
            collocation_points: numerics.collocation_points,
            sample_every: numerics.sample_every,
            steps: 0,
            chord,
            scale,
        })
    }

    /// One time step followed by the impulse and, at the sampling cadence,
    /// a snapshot.
    pub fn step(&mut self) -> Result<()> {
        self.integrator.step(self.kinematics.as_ref(), &mut self.shedding)?;
        self.steps += 1;

        let state = self.integrator.state();
        let p = impulse(&state.body, &[&state.vortices], self.collocation_points);
        self.trajectory.record_impulse(state.t, p);
        self.monitor.check(state, p);
        if self.steps % self.sample_every == 0 {
            self.trajectory.record_snapshot(state.snapshot());
        }
        debug!(t = state.t, vortices = state.vortices.len(), "step complete");
        Ok(())
    }

    /// Step until `until`, the number of steps rounded to the nearest whole
    /// step. Stops at the first error; a non-finite `until` is rejected.
    pub fn run(&mut self, until: f64) -> Result<()> {
        if !until.is_finite() {
            return Err(ConfigError::invalid("until", until, "must be finite").into());
        }
        let remaining = ((until - self.time()) / self.integrator.dt()).round();
        let steps = if remaining > 0.0 { remaining as usize } else { 0 };
        info!(from = self.time(), until, steps, "running");
        for _ in 0..steps {
            self.step()?;
        }
        let metrics = self.mean_coefficients();
        let state = self.state();
        info!(
            t = state.t,
            vortices = state.vortices.len(),
            circulation = state.vortices.circulation(),
            cl = metrics.cl,
            cd = metrics.cd,
            "run finished"
        );
        Ok(())
    }

    pub fn time(&self) -> f64 {
        self.state().t
    }

    pub fn state(&self) -> &SystemState {
        self.integrator.state()
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn shedding(&self) -> &SheddingModel {
        &self.shedding
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn dt(&self) -> f64 {
        self.integrator.dt()
    }

    /// Reference chord used for the coefficients.
    pub fn chord(&self) -> f64 {
        self.chord
    }

    /// Force coefficient at every step, from the impulse history.
    pub fn force_coefficients(&self) -> Vec<C64> {
        force_coefficients(self.trajectory.impulse(), self.integrator.dt(), self.scale)
    }

    pub fn mean_coefficients(&self) -> PerformanceMetrics {
        mean_coefficients(&self.force_coefficients(), &self.state().freestream)
    }
}

fn section_map(airfoil: &AirfoilConfig) -> Result<Arc<dyn ConformalMap>> {
    let profile = airfoil.profile()?;
    let map: Arc<dyn ConformalMap> = match airfoil.map {
        MapKind::Theodorsen => Arc::new(TheodorsenMap::from_naca(
            &profile,
            airfoil.chord,
            airfoil.modes,
        )?),
        MapKind::Joukowski => Arc::new(JoukowskiMap::from_naca(
            &profile,
            airfoil.chord,
            airfoil.laurent_terms,
        )?),
    };
    Ok(map)
}

/// Fill a square with tracers, skipping points inside the body.
fn seed_tracers(state: &mut SystemState, config: &TracerConfig) -> Result<()> {
    let n = config.density;
    let spacing = if n > 1 { config.side / (n - 1) as f64 } else { 0.0 };
    let origin = C64::new(config.center[0], config.center[1])
        - C64::new(config.side, config.side) * if n > 1 { 0.5 } else { 0.0 };
    for i in 0..n {
        for j in 0..n {
            let z = origin + C64::new(i as f64 * spacing, j as f64 * spacing);
            match state.body.to_circle(z) {
                Ok(zeta) => {
                    state.tracers.push(Blob::tracer(zeta));
                }
                Err(MapError::Interior { .. }) => {}
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeConfig, TracerConfig};
    use crate::error::SimError;
    use crate::motion::Stationary;

    fn short(config: &mut SimulationConfig) {
        config.numerics.dt = 0.01;
        config.numerics.sample_every = 2;
        config.numerics.collocation_points = 64;
    }

    #[test]
    fn run_archives_at_the_sampling_cadence() {
        let mut config = SimulationConfig::default();
        short(&mut config);
        let mut sim = Simulation::from_config(&config).unwrap();
        assert_eq!(sim.state().vortices.len(), 1);
        sim.run(0.05).unwrap();
        assert_eq!(sim.steps(), 5);
        assert!((sim.time() - 0.05).abs() < 1e-12);
        assert_eq!(sim.state().vortices.len(), 6);
        // t = 0, 0.02, 0.04
        assert_eq!(sim.trajectory().snapshots().len(), 3);
        assert_eq!(sim.trajectory().impulse().len(), 6);
        assert_eq!(sim.force_coefficients().len(), 5);
    }

    #[test]
    fn running_to_the_past_does_nothing() {
        let mut config = SimulationConfig::default();
        short(&mut config);
        let mut sim = Simulation::from_config(&config).unwrap();
        sim.run(-1.0).unwrap();
        assert_eq!(sim.steps(), 0);
        assert_eq!(sim.mean_coefficients(), PerformanceMetrics::default());
    }

    #[test]
    fn tracers_outside_the_body_only() {
        let mut config = SimulationConfig::default();
        config.body.angle_deg = 0.0;
        config.tracers = Some(TracerConfig {
            center: [0.0, 0.0],
            side: 0.4,
            density: 5,
        });
        let sim = Simulation::from_config(&config).unwrap();
        let tracers = sim.state().tracers.len();
        // The row along the chord line lies inside the section.
        assert!(tracers < 25 && tracers >= 10, "{tracers}");
        assert!(sim.state().tracers.iter().all(|b| b.zeta.norm() >= 1.0 - 1e-9));
    }

    fn plate_state() -> SystemState {
        let map = Arc::new(JoukowskiMap::flat_plate(1.0, 4).unwrap());
        let body = RigidBody::new(map, Pose::new(C64::default(), -0.2), vec![0]).unwrap();
        SystemState::new(body, Freestream::new(1.0, 0.0))
    }

    fn plate_shedding() -> SheddingModel {
        SheddingModel::new(vec![0.0], crate::solver::DEFAULT_SHED_FRACTION, 0.01)
    }

    #[test]
    fn zero_sampling_interval_is_rejected() {
        let numerics = NumericsConfig {
            sample_every: 0,
            ..NumericsConfig::default()
        };
        let err = Simulation::new(plate_state(), Box::new(Stationary), plate_shedding(), &numerics)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Config(ConfigError::InvalidValue { ref key, .. }) if key == "numerics.sample_every"
        ));
    }

    #[test]
    fn non_positive_time_step_is_rejected() {
        for dt in [0.0, -0.01, f64::NAN] {
            let numerics = NumericsConfig {
                dt,
                ..NumericsConfig::default()
            };
            let result =
                Simulation::new(plate_state(), Box::new(Stationary), plate_shedding(), &numerics);
            assert!(
                matches!(
                    result,
                    Err(SimError::Config(ConfigError::InvalidValue { ref key, .. })) if key == "numerics.dt"
                ),
                "dt = {dt}"
            );
        }
    }

    #[test]
    fn non_finite_end_time_is_rejected() {
        let numerics = NumericsConfig {
            collocation_points: 64,
            ..NumericsConfig::default()
        };
        let mut sim =
            Simulation::new(plate_state(), Box::new(Stationary), plate_shedding(), &numerics)
                .unwrap();
        for until in [f64::INFINITY, f64::NAN] {
            assert!(matches!(sim.run(until), Err(SimError::Config(_))));
        }
        assert_eq!(sim.steps(), 0);
    }

    #[test]
    fn unknown_edge_is_rejected() {
        let mut config = SimulationConfig::default();
        config.edges = vec![EdgeConfig {
            vertex: 3,
            suction: 0.0,
        }];
        assert!(Simulation::from_config(&config).is_err());
    }
}
