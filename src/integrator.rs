//! Fixed-step forward-Euler integrator over a double-buffered state.
//!
//! One step reads the current buffer and writes the next one; the buffers
//! are swapped only once the whole step, shedding included, has succeeded.

use crate::elements::Kernel;
use crate::error::{Result, SimError};
use crate::motion::Kinematics;
use crate::solver::{
    enforce_no_flow_through, self_induce_velocity, transform_velocity, SheddingModel,
    VelocityBuffers,
};
use crate::state::SystemState;

/// Current and spare state. The spare holds garbage between steps.
#[derive(Debug, Clone)]
pub struct StateBuffers {
    current: SystemState,
    next: SystemState,
}

impl StateBuffers {
    pub fn new(state: SystemState) -> Self {
        StateBuffers {
            next: state.clone(),
            current: state,
        }
    }

    pub fn current(&self) -> &SystemState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut SystemState {
        &mut self.current
    }

    /// Read the current buffer while writing the spare one.
    pub fn split(&mut self) -> (&SystemState, &mut SystemState) {
        (&self.current, &mut self.next)
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.current, &mut self.next);
    }
}

#[derive(Debug)]
pub struct Integrator {
    buffers: StateBuffers,
    velocity: VelocityBuffers,
    kernel: Kernel,
    dt: f64,
}

impl Integrator {
    pub fn new(state: SystemState, kernel: Kernel, dt: f64) -> Self {
        Integrator {
            buffers: StateBuffers::new(state),
            velocity: VelocityBuffers::default(),
            kernel,
            dt,
        }
    }

    pub fn state(&self) -> &SystemState {
        self.buffers.current()
    }

    pub fn state_mut(&mut self) -> &mut SystemState {
        self.buffers.current_mut()
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Advance by one Δt:
    /// 1. motion at t, enforce, velocities of all elements
    /// 2. Euler update of elements and pose into the spare buffer
    /// 3. motion at t + Δt, enforce, shed
    /// 4. commit the shed blobs and swap
    pub fn step(&mut self, kinematics: &dyn Kinematics, shedding: &mut SheddingModel) -> Result<()> {
        let dt = self.dt;
        let current = self.buffers.current_mut();
        let t = current.t;
        let motion = kinematics.motion(t);

        enforce_no_flow_through(
            &mut current.body,
            &motion,
            &current.freestream,
            &[&current.vortices],
            t,
        );
        self_induce_velocity(current, &self.kernel, &mut self.velocity);
        transform_velocity(&current.body, &current.vortices, &mut self.velocity.vortices)?;
        transform_velocity(&current.body, &current.tracers, &mut self.velocity.tracers)?;

        let (current, next) = self.buffers.split();
        next.copy_from(current);
        next.vortices.advance(&self.velocity.vortices, dt);
        next.tracers.advance(&self.velocity.tracers, dt);
        next.body.advance(&motion, dt);
        next.t = t + dt;
        if !next.is_finite() {
            return Err(SimError::NonFinite { time: next.t });
        }

        let motion = kinematics.motion(next.t);
        enforce_no_flow_through(
            &mut next.body,
            &motion,
            &next.freestream,
            &[&next.vortices],
            next.t,
        );
        shedding.shed(&mut next.body, &motion, &next.freestream, &mut next.vortices, next.t)?;
        if !next.vortices.is_finite() {
            return Err(SimError::NonFinite { time: next.t });
        }

        shedding.commit();
        self.buffers.swap();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Pose, RigidBody};
    use crate::elements::Blob;
    use crate::freestream::Freestream;
    use crate::map::JoukowskiMap;
    use crate::motion::{Motion, Stationary};
    use crate::naca::Naca4;
    use crate::solver::{suction_parameter, DEFAULT_SHED_FRACTION};
    use crate::C64;
    use std::sync::Arc;

    /// Body velocity turns NaN from `after` on.
    #[derive(Debug)]
    struct Runaway {
        after: f64,
    }

    impl Kinematics for Runaway {
        fn motion(&self, t: f64) -> Motion {
            if t < self.after {
                return Motion::default();
            }
            Motion {
                c_dot: C64::new(f64::NAN, 0.0),
                ..Motion::default()
            }
        }
    }

    fn seeded() -> (Integrator, SheddingModel) {
        let map = Arc::new(JoukowskiMap::from_naca(&Naca4::new(0.02, 0.5, 0.12), 1.0, 32).unwrap());
        let body = RigidBody::new(map, Pose::new(C64::default(), -0.15), vec![0]).unwrap();
        let mut state = SystemState::new(body, Freestream::new(1.0, 0.0));
        state.tracers.push(Blob::tracer(C64::new(-8.0, 0.5)));
        let mut shedding = SheddingModel::new(vec![0.0], DEFAULT_SHED_FRACTION, 0.01);
        shedding
            .seed(
                &mut state.body,
                &Motion::default(),
                &Freestream::new(1.0, 0.0),
                &mut state.vortices,
                0.0,
            )
            .unwrap();
        (Integrator::new(state, Kernel::default(), 0.01), shedding)
    }

    #[test]
    fn each_step_sheds_one_blob_and_keeps_the_kutta_condition() {
        let (mut integrator, mut shedding) = seeded();
        for n in 1..=5 {
            integrator.step(&Stationary, &mut shedding).unwrap();
            let state = integrator.state();
            assert_eq!(state.vortices.len(), 1 + n);
            assert_eq!(state.tracers.len(), 1);
            assert!((state.t - n as f64 * 0.01).abs() < 1e-12);
            assert!(suction_parameter(&state.body, &[&state.vortices], 0).abs() < 1e-9);
        }
    }

    #[test]
    fn tracers_follow_the_freestream() {
        let (mut integrator, mut shedding) = seeded();
        let before = integrator.state().snapshot().tracers[0];
        integrator.step(&Stationary, &mut shedding).unwrap();
        let after = integrator.state().snapshot().tracers[0];
        // Upstream tracer moves downstream, roughly at freestream speed.
        let displacement = (after - before) / 0.01;
        assert!(displacement.re > 0.5 && displacement.re < 1.5, "{displacement}");
    }

    #[test]
    fn failed_step_leaves_the_state_untouched() {
        let (mut integrator, mut shedding) = seeded();
        let runaway = Runaway { after: 0.015 };
        integrator.step(&runaway, &mut shedding).unwrap();
        let vortices = integrator.state().vortices.clone();
        let pose = integrator.state().body.pose();

        let err = integrator.step(&runaway, &mut shedding).unwrap_err();
        assert!(matches!(err, SimError::NonFinite { .. }));
        let state = integrator.state();
        assert!((state.t - 0.01).abs() < 1e-15);
        assert_eq!(state.vortices, vortices);
        assert_eq!(state.body.pose(), pose);
        assert_eq!(shedding.last_released(0), Some(1));
    }

    #[test]
    fn swap_exchanges_the_buffers() {
        let (integrator, _) = seeded();
        let mut buffers = StateBuffers::new(integrator.state().clone());
        let (_, next) = buffers.split();
        next.t = 3.0;
        buffers.swap();
        assert_eq!(buffers.current().t, 3.0);
    }
}
