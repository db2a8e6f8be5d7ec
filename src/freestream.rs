use crate::C64;

/// Uniform far-field flow, as the complex velocity u + iv.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Freestream {
    pub velocity: C64,
}

impl Freestream {
    /// Speed and direction (radians, counterclockwise from +x).
    pub fn new(speed: f64, angle: f64) -> Self {
        Freestream {
            velocity: C64::from_polar(speed, angle),
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    pub fn direction(&self) -> f64 {
        self.velocity.arg()
    }

    /// The same flow seen in the frame of a body rotated by `angle`.
    pub fn body_frame(&self, angle: f64) -> C64 {
        self.velocity * C64::from_polar(1.0, -angle)
    }
}
