//! Unsteady potential flow past a rigid airfoil with discrete vortex shedding.
//!
//! The body is the image of the exterior of the unit circle under a
//! conformal map. Free vortex blobs are stored in that circle plane, the
//! bound vorticity is an image system that keeps the body impermeable, and
//! sharp edges release a new blob every step according to an edge-suction
//! criterion.

pub mod body;
pub mod config;
pub mod diagnostics;
pub mod elements;
pub mod error;
pub mod freestream;
pub mod integrator;
pub mod map;
pub mod motion;
pub mod naca;
pub mod simulation;
pub mod solver;
pub mod state;

/// Complex number used for positions and velocities in both planes.
pub type C64 = num_complex::Complex64;

pub use body::{Pose, RigidBody};
pub use config::SimulationConfig;
pub use diagnostics::PerformanceMetrics;
pub use elements::{Blob, Kernel, VortexSet};
pub use error::{ConfigError, MapError, Result, SimError};
pub use freestream::Freestream;
pub use map::{ConformalMap, JoukowskiMap, Laurent, PowerSeriesMap, TheodorsenMap};
pub use motion::{Kinematics, Motion};
pub use naca::Naca4;
pub use simulation::Simulation;
pub use state::{Snapshot, SystemState, Trajectory};

#[cfg(test)]
mod tests {
    use super::C64;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn complex_helpers_are_available() {
        let z = C64::from_polar(2.0, FRAC_PI_2);
        assert_relative_eq!(z.norm(), 2.0, epsilon = 1e-15);
        assert_relative_eq!(z.arg(), FRAC_PI_2, epsilon = 1e-15);
        let root = C64::new(-4.0, 0.0).sqrt();
        assert_relative_eq!(root.re, 0.0, epsilon = 1e-15);
        assert_relative_eq!(root.im, 2.0, epsilon = 1e-15);
    }
}
