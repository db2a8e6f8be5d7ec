use tracing::warn;

use super::{ConformalMap, Laurent};
use crate::error::MapError;
use crate::naca::Naca4;
use crate::C64;

/// Thickness ratio of a symmetric Joukowski section per unit offset ε.
const THICKNESS_PER_OFFSET: f64 = 1.299_038_105_676_658; // 3√3/4

/// Joukowski section `z = w + a²/w` with `w = Rζ + μ`.
///
/// The generating circle `|w − μ| = R` passes through the critical point
/// `w = a`, which becomes the cusped trailing edge. When μ = 0 the section
/// degenerates to a flat plate and `w = −a` is a second sharp edge.
#[derive(Debug, Clone)]
pub struct JoukowskiMap {
    scale: f64,
    center: C64,
    radius: f64,
    laurent: Laurent,
    prevertices: Vec<C64>,
}

impl JoukowskiMap {
    /// `terms` is the length of the truncated Laurent tail.
    pub fn new(scale: f64, center: C64, terms: usize) -> Result<Self, MapError> {
        if !(scale > 0.0) || !center.re.is_finite() || !center.im.is_finite() {
            return Err(MapError::InvalidParameters(format!(
                "scale {scale} and center {center} must be finite, scale positive"
            )));
        }
        let edge = C64::new(scale, 0.0);
        let radius = (edge - center).norm();
        if center.norm() >= radius {
            return Err(MapError::InvalidParameters(format!(
                "generating circle (center {center}, radius {radius}) must enclose the origin"
            )));
        }

        let mut prevertices = vec![(edge - center) / radius];
        let leading_edge = C64::new(-scale, 0.0);
        if ((leading_edge - center).norm() - radius).abs() < 1e-12 * scale {
            prevertices.push((leading_edge - center) / radius);
        }

        // a²/(Rζ + μ) = Σₖ a²(−μ)ᵏ / (R^{k+1} ζ^{k+1})
        let mut tail = Vec::with_capacity(terms);
        let mut coefficient = C64::new(scale * scale / radius, 0.0);
        for _ in 0..terms {
            tail.push(coefficient);
            coefficient *= -center / radius;
        }

        Ok(JoukowskiMap {
            scale,
            center,
            radius,
            laurent: Laurent::new(C64::new(radius, 0.0), center, tail),
            prevertices,
        })
    }

    /// Plate of the given chord along the real axis, edges at ζ = 1 and ζ = −1.
    pub fn flat_plate(chord: f64, terms: usize) -> Result<Self, MapError> {
        Self::new(chord / 4.0, C64::default(), terms)
    }

    /// Joukowski section with the thickness and camber of a NACA 4-digit
    /// profile. The circle offset ε sets the thickness, the vertical offset
    /// β the camber of the mean line.
    pub fn from_naca(profile: &Naca4, chord: f64, terms: usize) -> Result<Self, MapError> {
        if (profile.camber_location - 0.5).abs() > 1e-9 && profile.camber > 0.0 {
            warn!(
                camber_location = profile.camber_location,
                "Joukowski sections place maximum camber at mid-chord; use the theodorsen map"
            );
        }
        let scale = chord / 4.0;
        let offset = profile.thickness / THICKNESS_PER_OFFSET;
        let lift = 2.0 * profile.camber;
        Self::new(scale, C64::new(-offset * scale, lift * scale), terms)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn center(&self) -> C64 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    fn w(&self, zeta: C64) -> C64 {
        zeta * self.radius + self.center
    }
}

impl ConformalMap for JoukowskiMap {
    fn forward(&self, zeta: C64) -> C64 {
        let w = self.w(zeta);
        w + w.inv() * (self.scale * self.scale)
    }

    fn inverse(&self, z: C64) -> Result<C64, MapError> {
        let a2 = self.scale * self.scale;
        let root = (z * z - 4.0 * a2).sqrt();
        // w₁w₂ = a², so exactly one root lies outside the generating circle.
        let w1 = (z + root) * 0.5;
        let w2 = (z - root) * 0.5;
        let w = if (w1 - self.center).norm() >= (w2 - self.center).norm() {
            w1
        } else {
            w2
        };
        let zeta = (w - self.center) / self.radius;
        if zeta.norm() < 1.0 - 1e-9 {
            return Err(MapError::interior(z));
        }
        Ok(zeta)
    }

    fn derivatives(&self, zeta: C64) -> (C64, C64) {
        let w = self.w(zeta);
        let a2 = self.scale * self.scale;
        let inv = w.inv();
        let d1 = (C64::new(1.0, 0.0) - inv * inv * a2) * self.radius;
        let d2 = inv * inv * inv * (2.0 * a2 * self.radius * self.radius);
        (d1, d2)
    }

    fn laurent(&self) -> &Laurent {
        &self.laurent
    }

    fn prevertices(&self) -> &[C64] {
        &self.prevertices
    }
}
