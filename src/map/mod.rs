//! Conformal maps from the exterior of the unit circle (ζ) onto the exterior
//! of a body in its own frame.
//!
//! The solver never builds a map itself. It only needs the forward and
//! inverse transforms, the first two derivatives and the Laurent expansion
//! at infinity, `z = c₁ζ + c₀ + Σₖ c₋ₖ ζ⁻ᵏ`.

mod joukowski;
mod power_series;
mod theodorsen;

pub use joukowski::JoukowskiMap;
pub use power_series::PowerSeriesMap;
pub use theodorsen::TheodorsenMap;

use std::f64::consts::PI;

use crate::error::MapError;
use crate::C64;

/// Smallest |dz/dζ| accepted where the map derivative is divided by.
pub const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Laurent coefficients of an exterior map.
#[derive(Debug, Clone, PartialEq)]
pub struct Laurent {
    pub leading: C64,
    pub constant: C64,
    /// c₋₁, c₋₂, ...
    pub tail: Vec<C64>,
}

impl Laurent {
    pub fn new(leading: C64, constant: C64, tail: Vec<C64>) -> Self {
        Laurent { leading, constant, tail }
    }

    /// Coefficient of ζ^power, zero outside the stored range.
    pub fn coefficient(&self, power: i64) -> C64 {
        match power {
            1 => self.leading,
            0 => self.constant,
            p if p < 0 => self
                .tail
                .get((-p - 1) as usize)
                .copied()
                .unwrap_or_default(),
            _ => C64::default(),
        }
    }

    pub fn lowest_power(&self) -> i64 {
        -(self.tail.len() as i64)
    }

    pub fn evaluate(&self, zeta: C64) -> C64 {
        let inv = zeta.inv();
        let mut sum = self.leading * zeta + self.constant;
        let mut power = inv;
        for c in &self.tail {
            sum += c * power;
            power *= inv;
        }
        sum
    }

    /// First and second derivatives of the series.
    pub fn derivatives(&self, zeta: C64) -> (C64, C64) {
        let inv = zeta.inv();
        let mut d1 = self.leading;
        let mut d2 = C64::default();
        let mut power = inv * inv;
        for (i, c) in self.tail.iter().enumerate() {
            let k = (i + 1) as f64;
            d1 -= c * power * k;
            d2 += c * power * inv * (k * (k + 1.0));
            power *= inv;
        }
        (d1, d2)
    }
}

/// A conformal map of the unit-circle exterior onto a body exterior.
pub trait ConformalMap: std::fmt::Debug + Send + Sync {
    /// Circle plane to body frame.
    fn forward(&self, zeta: C64) -> C64;

    /// Body frame to circle plane, picking the preimage with |ζ| ≥ 1.
    fn inverse(&self, z: C64) -> Result<C64, MapError>;

    /// dz/dζ and d²z/dζ².
    fn derivatives(&self, zeta: C64) -> (C64, C64);

    fn laurent(&self) -> &Laurent;

    /// Preimages of the sharp edges, all on the unit circle.
    fn prevertices(&self) -> &[C64];

    /// Derivatives at a point where the map must be locally invertible.
    fn metric(&self, zeta: C64) -> Result<(C64, C64), MapError> {
        let (d1, d2) = self.derivatives(zeta);
        if !(d1.norm() > DEGENERATE_TOLERANCE) {
            return Err(MapError::degenerate(zeta));
        }
        Ok((d1, d2))
    }
}

/// Unit circle points at equal angles, starting at ζ = 1.
pub fn circle_points(n: usize) -> impl Iterator<Item = C64> {
    let spacing = 2.0 * PI / n as f64;
    (0..n).map(move |k| C64::from_polar(1.0, k as f64 * spacing))
}

pub fn outline(map: &dyn ConformalMap, n: usize) -> Vec<C64> {
    circle_points(n).map(|zeta| map.forward(zeta)).collect()
}

/// Longest distance between two outline points.
pub fn chord(map: &dyn ConformalMap, n: usize) -> f64 {
    let points = outline(map, n);
    let mut longest: f64 = 0.0;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            longest = longest.max((a - b).norm());
        }
    }
    longest
}
