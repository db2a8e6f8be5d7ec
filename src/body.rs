//! The rigid, conformally mapped body and the bound vorticity it carries.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::elements::{Blob, Kernel};
use crate::error::{MapError, Result, SimError};
use crate::map::{circle_points, ConformalMap};
use crate::motion::Motion;
use crate::C64;

/// Position of the body frame in the physical plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub centroid: C64,
    pub angle: f64, // radians, counterclockwise
}

impl Pose {
    pub fn new(centroid: C64, angle: f64) -> Self {
        Pose { centroid, angle }
    }

    pub fn rotation(&self) -> C64 {
        C64::from_polar(1.0, self.angle)
    }

    pub fn to_physical(&self, body_frame: C64) -> C64 {
        self.centroid + self.rotation() * body_frame
    }

    pub fn to_body(&self, z: C64) -> C64 {
        (z - self.centroid) * self.rotation().conj()
    }
}

/// Image system that makes the body impermeable, rebuilt on every
/// enforcement. In the circle plane it consists of
/// * the freestream and its circle-theorem image,
/// * the potential of the body's own translation and rotation,
/// * one image of −Γ at 1/ζ̄ for every free blob,
/// * a centre vortex with the body's net circulation.
#[derive(Debug, Clone, Default)]
pub struct BoundVorticity {
    pub(crate) images: Vec<Blob>,
    pub(crate) center: f64,
    pub(crate) leading: C64,
    pub(crate) stream: C64,
    /// bₙ of Σ bₙ ζ⁻ⁿ, n = 1, 2, ...
    pub(crate) motion: Vec<C64>,
    pub(crate) body_motion: Motion,
}

impl BoundVorticity {
    pub fn circulation(&self) -> f64 {
        self.center + self.images.iter().map(|b| b.gamma).sum::<f64>()
    }

    pub fn images(&self) -> &[Blob] {
        &self.images
    }

    pub fn body_motion(&self) -> &Motion {
        &self.body_motion
    }

    /// dF/dζ of the bound system, freestream included.
    pub(crate) fn conj_velocity(&self, zeta: C64, kernel: &Kernel) -> C64 {
        let inv = zeta.inv();
        let inv2 = inv * inv;
        let mut w = self.stream.conj() * self.leading - self.stream * self.leading.conj() * inv2;

        let mut power = inv2;
        for (i, b) in self.motion.iter().enumerate() {
            w -= b * power * (i + 1) as f64;
            power *= inv;
        }

        w += inv * C64::new(0.0, -self.center / (2.0 * PI));
        for image in &self.images {
            w += kernel.conj_velocity(zeta, image.zeta) * image.gamma;
        }
        w
    }

    fn copy_from(&mut self, other: &BoundVorticity) {
        self.images.clear();
        self.images.extend_from_slice(&other.images);
        self.motion.clear();
        self.motion.extend_from_slice(&other.motion);
        self.center = other.center;
        self.leading = other.leading;
        self.stream = other.stream;
        self.body_motion = other.body_motion;
    }
}

/// A rigid body whose exterior is the image of |ζ| > 1 under its map.
#[derive(Debug, Clone)]
pub struct RigidBody {
    map: Arc<dyn ConformalMap>,
    pose: Pose,
    edges: Vec<usize>,
    circulation: f64,
    pub(crate) bound: BoundVorticity,
}

impl RigidBody {
    /// `edges` index the map's prevertices and designate the shedding edges.
    pub fn new(map: Arc<dyn ConformalMap>, pose: Pose, edges: Vec<usize>) -> Result<Self> {
        let available = map.prevertices().len();
        if let Some(&index) = edges.iter().find(|&&e| e >= available) {
            return Err(SimError::UnknownEdge { index, available });
        }
        Ok(RigidBody {
            map,
            pose,
            edges,
            circulation: 0.0,
            bound: BoundVorticity::default(),
        })
    }

    /// Net circulation of body plus wake, conserved for the whole run.
    pub fn with_circulation(mut self, circulation: f64) -> Self {
        self.circulation = circulation;
        self
    }

    pub fn map(&self) -> &dyn ConformalMap {
        self.map.as_ref()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    pub fn circulation(&self) -> f64 {
        self.circulation
    }

    pub fn bound(&self) -> &BoundVorticity {
        &self.bound
    }

    pub fn bound_circulation(&self) -> f64 {
        self.bound.circulation()
    }

    /// Circle-plane prevertex of designated edge `slot`.
    pub fn edge_prevertex(&self, slot: usize) -> C64 {
        self.map.prevertices()[self.edges[slot]]
    }

    pub fn edge_position(&self, slot: usize) -> C64 {
        self.to_physical(self.edge_prevertex(slot))
    }

    pub fn to_physical(&self, zeta: C64) -> C64 {
        self.pose.to_physical(self.map.forward(zeta))
    }

    pub fn to_circle(&self, z: C64) -> Result<C64, MapError> {
        self.map.inverse(self.pose.to_body(z))
    }

    /// Rigid-body velocity at physical point `z` for the enforced motion.
    pub fn body_velocity(&self, z: C64) -> C64 {
        self.bound.body_motion.velocity_at(z, self.pose.centroid)
    }

    pub fn advance(&mut self, motion: &Motion, dt: f64) {
        self.pose.centroid += motion.c_dot * dt;
        self.pose.angle += motion.alpha_dot * dt;
    }

    /// Physical outline through `n` equally spaced circle points.
    pub fn outline(&self, n: usize) -> Vec<C64> {
        circle_points(n).map(|zeta| self.to_physical(zeta)).collect()
    }

    pub(crate) fn copy_from(&mut self, other: &RigidBody) {
        if !Arc::ptr_eq(&self.map, &other.map) {
            self.map = Arc::clone(&other.map);
        }
        if self.edges != other.edges {
            self.edges.clone_from(&other.edges);
        }
        self.pose = other.pose;
        self.circulation = other.circulation;
        self.bound.copy_from(&other.bound);
    }
}
