//! Prescribed rigid-body kinematics.

use crate::C64;

/// Instantaneous rigid-body motion: centroid velocity and acceleration,
/// angular velocity and acceleration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    pub c_dot: C64,
    pub c_ddot: C64,
    pub alpha_dot: f64,
    pub alpha_ddot: f64,
}

impl Motion {
    /// Velocity of the rigid body at physical point `z` for centroid `c`.
    pub fn velocity_at(&self, z: C64, centroid: C64) -> C64 {
        self.c_dot + C64::new(0.0, self.alpha_dot) * (z - centroid)
    }
}

/// A kinematic law `t ↦ (ċ, c̈, α̇, α̈)`.
pub trait Kinematics: std::fmt::Debug + Send + Sync {
    fn motion(&self, t: f64) -> Motion;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl Kinematics for Stationary {
    fn motion(&self, _t: f64) -> Motion {
        Motion::default()
    }
}

/// Constant translational and angular velocity.
#[derive(Debug, Clone, Copy)]
pub struct Translation {
    pub velocity: C64,
    pub angular_velocity: f64,
}

impl Kinematics for Translation {
    fn motion(&self, _t: f64) -> Motion {
        Motion {
            c_dot: self.velocity,
            alpha_dot: self.angular_velocity,
            ..Motion::default()
        }
    }
}

/// Sinusoidal heave (along y) and pitch about the centroid.
///
/// h(t) = h₀ sin(ωt + φ), α(t) = α₀ sin(ωt), measured from the initial pose.
#[derive(Debug, Clone, Copy)]
pub struct Oscillation {
    pub heave_amplitude: f64,
    pub pitch_amplitude: f64,
    pub angular_frequency: f64,
    pub phase: f64,
}

impl Kinematics for Oscillation {
    fn motion(&self, t: f64) -> Motion {
        let omega = self.angular_frequency;
        let heave = omega * t + self.phase;
        let pitch = omega * t;
        Motion {
            c_dot: C64::new(0.0, self.heave_amplitude * omega * heave.cos()),
            c_ddot: C64::new(0.0, -self.heave_amplitude * omega * omega * heave.sin()),
            alpha_dot: self.pitch_amplitude * omega * pitch.cos(),
            alpha_ddot: -self.pitch_amplitude * omega * omega * pitch.sin(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn oscillation_accelerations_match_velocity_derivatives() {
        let law = Oscillation {
            heave_amplitude: 0.2,
            pitch_amplitude: 0.1,
            angular_frequency: 3.0,
            phase: 0.5,
        };
        let h = 1e-6;
        let t = 0.7;
        let fd = (law.motion(t + h).c_dot - law.motion(t - h).c_dot) / (2.0 * h);
        assert_relative_eq!(fd.im, law.motion(t).c_ddot.im, epsilon = 1e-6);
        let fd = (law.motion(t + h).alpha_dot - law.motion(t - h).alpha_dot) / (2.0 * h);
        assert_relative_eq!(fd, law.motion(t).alpha_ddot, epsilon = 1e-6);
    }

    #[test]
    fn rigid_velocity_includes_rotation() {
        let motion = Motion {
            c_dot: C64::new(1.0, 0.0),
            alpha_dot: 2.0,
            ..Motion::default()
        };
        let v = motion.velocity_at(C64::new(0.0, 1.0), C64::default());
        assert_relative_eq!(v.re, -1.0);
        assert_relative_eq!(v.im, 0.0);
    }
}
