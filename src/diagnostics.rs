//! Impulse, force coefficients and run-health checks.

use std::f64::consts::PI;

use tracing::warn;

use crate::body::RigidBody;
use crate::elements::VortexSet;
use crate::freestream::Freestream;
use crate::map::circle_points;
use crate::solver::surface_conj_velocity;
use crate::state::SystemState;
use crate::C64;

/// Mean aerodynamic coefficients in freestream axes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceMetrics {
    pub cl: f64, // Lift coefficient
    pub cd: f64, // Drag coefficient
}

/// Discretised bound vortex sheet on the body surface.
#[derive(Debug, Clone, Default)]
pub struct BoundSheet {
    pub points: Vec<C64>,
    /// Circulation carried by the sheet segment at each point.
    pub strengths: Vec<f64>,
    /// First moment 2α̇∫z dA of the rigidly rotating interior.
    pub interior: C64,
}

impl BoundSheet {
    /// Σ dΓₖ zₖ plus the interior moment.
    pub fn moment(&self) -> C64 {
        self.points
            .iter()
            .zip(&self.strengths)
            .map(|(z, g)| z * *g)
            .sum::<C64>()
            + self.interior
    }
}

/// Sample the slip between fluid and body at `n` equally spaced circle
/// points. The strength of each segment is
/// dΓₖ = [Re(iζF′) − Re(conj(v_body)·dz/dθ)]·Δθ.
pub fn bound_sheet(body: &RigidBody, sources: &[&VortexSet], n: usize) -> BoundSheet {
    let spacing = 2.0 * PI / n as f64;
    let rotation = body.pose().rotation();
    let alpha_dot = body.bound().body_motion().alpha_dot;

    let mut sheet = BoundSheet {
        points: Vec::with_capacity(n),
        strengths: Vec::with_capacity(n),
        interior: C64::default(),
    };
    // ∫z dA = (1/2i)∮|z|² dz
    let mut area_moment = C64::default();
    for zeta in circle_points(n) {
        let (d1, _) = body.map().derivatives(zeta);
        let tangent = rotation * d1 * C64::i() * zeta;
        let z = body.to_physical(zeta);
        let fluid = (C64::i() * zeta * surface_conj_velocity(body, sources, zeta)).re;
        let wall = (body.body_velocity(z).conj() * tangent).re;
        sheet.points.push(z);
        sheet.strengths.push((fluid - wall) * spacing);
        area_moment += tangent * z.norm_sqr() * spacing;
    }
    if alpha_dot != 0.0 {
        sheet.interior = area_moment / C64::new(0.0, 2.0) * (2.0 * alpha_dot);
    }
    sheet
}

/// Linear impulse of the fluid, P = −i(ΣΓⱼzⱼ + ΣdΓₖzₖ + 2α̇∫z dA), with
/// the bound system as last enforced.
pub fn impulse(body: &RigidBody, sources: &[&VortexSet], n: usize) -> C64 {
    let free: C64 = sources
        .iter()
        .flat_map(|set| set.iter())
        .filter(|b| b.gamma != 0.0)
        .map(|b| body.to_physical(b.zeta) * b.gamma)
        .sum();
    -C64::i() * (free + bound_sheet(body, sources, n).moment())
}

/// Cₖ = −(Pₖ − Pₖ₋₁)/Δt · scale, one per consecutive impulse pair.
pub fn force_coefficients(impulse: &[C64], dt: f64, scale: f64) -> Vec<C64> {
    impulse
        .windows(2)
        .map(|pair| -(pair[1] - pair[0]) / dt * scale)
        .collect()
}

/// Time-averaged lift and drag: the force coefficient rotated into
/// freestream axes.
pub fn mean_coefficients(coefficients: &[C64], freestream: &Freestream) -> PerformanceMetrics {
    if coefficients.is_empty() {
        return PerformanceMetrics::default();
    }
    let mean = coefficients.iter().sum::<C64>() / coefficients.len() as f64;
    let axes = mean * C64::from_polar(1.0, -freestream.direction());
    PerformanceMetrics {
        cl: axes.im,
        cd: axes.re,
    }
}

/// Watches a run for elements escaping to infinity and impulse blow-up.
/// Only reports, each kind of problem once.
#[derive(Debug, Clone)]
pub struct DivergenceMonitor {
    radius: f64,
    jump_factor: f64,
    previous: Option<C64>,
    escaped: bool,
    jumped: bool,
}

impl DivergenceMonitor {
    pub fn new(radius: f64) -> Self {
        DivergenceMonitor {
            radius,
            jump_factor: 10.0,
            previous: None,
            escaped: false,
            jumped: false,
        }
    }

    /// Returns true while the run looks healthy.
    pub fn check(&mut self, state: &SystemState, impulse: C64) -> bool {
        let mut healthy = true;
        let centroid = state.body.pose().centroid;
        let far = state
            .vortices
            .iter()
            .chain(state.tracers.iter())
            .map(|b| (state.body.to_physical(b.zeta) - centroid).norm())
            .fold(0.0_f64, f64::max);
        if far > self.radius {
            healthy = false;
            if !self.escaped {
                warn!(t = state.t, distance = far, radius = self.radius, "element left the domain");
                self.escaped = true;
            }
        }

        if let Some(previous) = self.previous {
            let jump = (impulse - previous).norm();
            if jump > self.jump_factor * previous.norm().max(1.0) {
                healthy = false;
                if !self.jumped {
                    warn!(t = state.t, jump, "impulse jumped");
                    self.jumped = true;
                }
            }
        }
        self.previous = Some(impulse);
        healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Pose;
    use crate::elements::Blob;
    use crate::map::PowerSeriesMap;
    use crate::motion::Motion;
    use crate::solver::enforce_no_flow_through;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn cylinder(centroid: C64) -> RigidBody {
        let map = Arc::new(PowerSeriesMap::circle(1.0).unwrap());
        RigidBody::new(map, Pose::new(centroid, 0.0), vec![]).unwrap()
    }

    #[test]
    fn vortex_and_image_make_the_impulse() {
        let mut body = cylinder(C64::default());
        let vortices: VortexSet = vec![Blob::new(C64::new(3.0, 0.0), 1.5)].into_iter().collect();
        enforce_no_flow_through(&mut body, &Motion::default(), &Freestream::default(), &[&vortices], 0.0);
        let p = impulse(&body, &[&vortices], 256);
        // −iΓ(z − 1/z̄) for a vortex outside a unit cylinder.
        assert_relative_eq!(p.re, 0.0, epsilon = 1e-10);
        assert_relative_eq!(p.im, -1.5 * 8.0 / 3.0, epsilon = 1e-10);
    }

    #[test]
    fn spinning_cylinder_in_still_fluid_has_no_impulse() {
        let mut body = cylinder(C64::new(2.0, -1.0));
        let motion = Motion {
            alpha_dot: 0.8,
            ..Motion::default()
        };
        let empty = VortexSet::new();
        enforce_no_flow_through(&mut body, &motion, &Freestream::default(), &[&empty], 0.0);
        let sheet = bound_sheet(&body, &[&empty], 128);
        assert!(sheet.interior.norm() > 1.0);
        let p = impulse(&body, &[&empty], 128);
        assert!(p.norm() < 1e-10, "impulse {p}");
    }

    #[test]
    fn force_is_the_impulse_rate() {
        let impulse = [C64::new(0.0, 0.0), C64::new(0.1, -0.2), C64::new(0.1, -0.5)];
        let c = force_coefficients(&impulse, 0.1, 2.0);
        assert_eq!(c.len(), 2);
        assert_relative_eq!(c[0].re, -2.0, epsilon = 1e-12);
        assert_relative_eq!(c[0].im, 4.0, epsilon = 1e-12);
        assert_relative_eq!(c[1].im, 6.0, epsilon = 1e-12);
    }

    #[test]
    fn mean_coefficients_use_freestream_axes() {
        let freestream = Freestream::new(1.0, PI / 2.0);
        // Force along −x is lift for a flow going up.
        let metrics = mean_coefficients(&[C64::new(-1.0, 0.0), C64::new(-3.0, 0.0)], &freestream);
        assert_relative_eq!(metrics.cl, 2.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.cd, 0.0, epsilon = 1e-12);
        assert_eq!(mean_coefficients(&[], &freestream), PerformanceMetrics::default());
    }

    #[test]
    fn monitor_flags_escaped_elements() {
        let mut state = SystemState::new(cylinder(C64::default()), Freestream::default());
        state.tracers.push(Blob::tracer(C64::new(5.0, 0.0)));
        let mut monitor = DivergenceMonitor::new(100.0);
        assert!(monitor.check(&state, C64::default()));
        state.tracers.push(Blob::tracer(C64::new(500.0, 0.0)));
        assert!(!monitor.check(&state, C64::default()));
        assert!(!monitor.check(&state, C64::new(50.0, 0.0)));
    }
}
