//! Free vortex elements: blobs, tracers and the interaction kernel.

use std::f64::consts::PI;

use serde::Deserialize;

use crate::C64;

/// A regularised point vortex in the circle plane. Γ = 0 is a passive tracer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob {
    pub zeta: C64,
    pub gamma: f64,
}

impl Blob {
    pub fn new(zeta: C64, gamma: f64) -> Self {
        Blob { zeta, gamma }
    }

    pub fn tracer(zeta: C64) -> Self {
        Blob { zeta, gamma: 0.0 }
    }
}

/// Growable collection of blobs. Elements are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VortexSet {
    blobs: Vec<Blob>,
}

impl VortexSet {
    pub fn new() -> Self {
        VortexSet::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        VortexSet {
            blobs: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, blob: Blob) -> usize {
        self.blobs.push(blob);
        self.blobs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Blob> {
        self.blobs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Blob> {
        self.blobs.iter()
    }

    pub fn as_slice(&self) -> &[Blob] {
        &self.blobs
    }

    pub(crate) fn set_gamma(&mut self, index: usize, gamma: f64) {
        self.blobs[index].gamma = gamma;
    }

    pub fn circulation(&self) -> f64 {
        self.blobs.iter().map(|b| b.gamma).sum()
    }

    /// `ζ += dt · rate`, element by element.
    pub fn advance(&mut self, rates: &[C64], dt: f64) {
        debug_assert_eq!(rates.len(), self.blobs.len());
        for (blob, rate) in self.blobs.iter_mut().zip(rates) {
            blob.zeta += rate * dt;
        }
    }

    pub fn copy_from(&mut self, other: &VortexSet) {
        self.blobs.clear();
        self.blobs.extend_from_slice(&other.blobs);
    }

    pub fn is_finite(&self) -> bool {
        self.blobs
            .iter()
            .all(|b| b.zeta.re.is_finite() && b.zeta.im.is_finite() && b.gamma.is_finite())
    }
}

impl FromIterator<Blob> for VortexSet {
    fn from_iter<I: IntoIterator<Item = Blob>>(iter: I) -> Self {
        VortexSet {
            blobs: iter.into_iter().collect(),
        }
    }
}

/// Induced-velocity kernel, fixed for a whole simulation.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Kernel {
    /// Singular point vortex.
    Point,
    /// Krasny blob with smoothing radius δ (circle-plane units).
    Blob { radius: f64 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Blob { radius: 0.02 }
    }
}

impl Kernel {
    pub fn radius(&self) -> f64 {
        match self {
            Kernel::Point => 0.0,
            Kernel::Blob { radius } => *radius,
        }
    }

    /// dF/dζ at `target` from a unit-circulation vortex at `source`:
    /// `conj(ζ − ζⱼ) / (2πi (|ζ − ζⱼ|² + δ²))`. Coincident points give zero.
    pub fn conj_velocity(&self, target: C64, source: C64) -> C64 {
        let offset = target - source;
        let radius = self.radius();
        let r2 = offset.norm_sqr() + radius * radius;
        if r2 == 0.0 {
            return C64::default();
        }
        offset.conj() * C64::new(0.0, -1.0 / (2.0 * PI * r2))
    }
}
