//! Vortex shedding from sharp edges.
//!
//! The edge suction parameter σ is the circle-plane slip velocity at an edge
//! prevertex. The physical velocity there is σ divided by a vanishing map
//! derivative, so σ = 0 is the Kutta condition. Each shedding edge carries a
//! critical value σ_c: while |σ| ≤ σ_c the edge releases a blob of zero
//! strength, otherwise the new blob's circulation brings σ back to ±σ_c.
//! σ_c = ∞ turns the edge off entirely.

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use super::no_flow_through::{enforce_no_flow_through, reflect, surface_conj_velocity};
use crate::body::RigidBody;
use crate::elements::{Blob, Kernel, VortexSet};
use crate::error::{Result, SimError};
use crate::freestream::Freestream;
use crate::motion::Motion;
use crate::C64;

pub const DEFAULT_SHED_FRACTION: f64 = 1.0 / 3.0;

/// Relative determinant below which the suction system counts as singular.
const SINGULAR_TOLERANCE: f64 = 1e-12;
/// Radial step used to find the outward bisector of an edge.
const BISECTOR_STEP: f64 = 1e-3;

/// A blob about to be released at designated edge `slot`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub slot: usize,
    pub zeta: C64,
    pub suction: f64,
}

/// σ at designated edge `slot` for the currently enforced bound system.
pub fn suction_parameter(body: &RigidBody, sources: &[&VortexSet], slot: usize) -> f64 {
    let edge = body.edge_prevertex(slot);
    (C64::i() * edge * surface_conj_velocity(body, sources, edge)).re
}

/// Change of σ at `edge` per unit circulation placed at `candidate`,
/// image included.
fn unit_suction(edge: C64, candidate: C64) -> f64 {
    let kernel = Kernel::Point;
    let w = kernel.conj_velocity(edge, candidate) - kernel.conj_velocity(edge, reflect(candidate));
    (C64::i() * edge * w).re
}

/// Circulations for `candidates` so that every edge meets its suction
/// criterion. With the other circulations fixed σ is affine in each
/// candidate strength, so the active edges are solved together as one
/// linear system. The candidates must already be part of `sources` with
/// zero strength.
pub fn vorticity_flux(
    body: &RigidBody,
    sources: &[&VortexSet],
    candidates: &[Candidate],
    t: f64,
) -> Result<Vec<f64>> {
    let mut strengths = vec![0.0; candidates.len()];
    let mut active = Vec::with_capacity(candidates.len());
    let mut rhs = Vec::with_capacity(candidates.len());
    for (k, candidate) in candidates.iter().enumerate() {
        let sigma = suction_parameter(body, sources, candidate.slot);
        if !sigma.is_finite() {
            return Err(SimError::NonFinite { time: t });
        }
        if sigma.abs() > candidate.suction {
            active.push(k);
            rhs.push(candidate.suction.copysign(sigma) - sigma);
        }
    }
    if active.is_empty() {
        return Ok(strengths);
    }

    let ill_posed = || SimError::IllPosedShedding {
        time: t,
        edges: active.iter().map(|&k| candidates[k].slot).collect(),
    };

    let n = active.len();
    let matrix = DMatrix::from_fn(n, n, |i, j| {
        let edge = body.edge_prevertex(candidates[active[i]].slot);
        unit_suction(edge, candidates[active[j]].zeta)
    });
    let scale = matrix.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let lu = matrix.lu();
    let determinant = lu.determinant();
    if !(determinant.abs() > SINGULAR_TOLERANCE * scale.powi(n as i32)) {
        return Err(ill_posed());
    }
    let solution = lu.solve(&DVector::from_vec(rhs)).ok_or_else(ill_posed)?;
    for (i, &k) in active.iter().enumerate() {
        strengths[k] = solution[i];
    }
    Ok(strengths)
}

#[derive(Debug, Clone, Copy)]
struct EdgeState {
    suction: f64,
    last: Option<usize>,
    // released this step, not yet committed
    pending: Option<usize>,
}

impl EdgeState {
    fn suppressed(&self) -> bool {
        self.suction == f64::INFINITY
    }
}

/// Per-edge shedding state: criterion and the last blob released there.
#[derive(Debug, Clone)]
pub struct SheddingModel {
    edges: Vec<EdgeState>,
    fraction: f64,
    seed_offset: f64,
}

impl SheddingModel {
    /// One suction criterion per designated edge of the body, in order.
    /// New blobs sit `fraction` of the way from the edge to the previous
    /// blob; seeds sit `seed_offset` from the edge along its bisector.
    pub fn new(suction: Vec<f64>, fraction: f64, seed_offset: f64) -> Self {
        SheddingModel {
            edges: suction
                .into_iter()
                .map(|suction| EdgeState {
                    suction,
                    last: None,
                    pending: None,
                })
                .collect(),
            fraction,
            seed_offset,
        }
    }

    /// Number of edges that release a blob every step.
    pub fn shedding_edges(&self) -> usize {
        self.edges.iter().filter(|e| !e.suppressed()).count()
    }

    pub fn suction(&self, slot: usize) -> f64 {
        self.edges[slot].suction
    }

    /// Index in the vortex set of the last blob released at `slot`.
    pub fn last_released(&self, slot: usize) -> Option<usize> {
        self.edges[slot].last
    }

    /// Make the blobs of the last `shed` the reference for the next one.
    /// Until then a failed step can be retried without touching the edges.
    pub fn commit(&mut self) {
        for edge in &mut self.edges {
            if let Some(index) = edge.pending.take() {
                edge.last = Some(index);
            }
        }
    }

    /// Place one seed blob per shedding edge and solve its circulation.
    /// Seeds are committed immediately.
    pub fn seed(
        &mut self,
        body: &mut RigidBody,
        motion: &Motion,
        freestream: &Freestream,
        vortices: &mut VortexSet,
        t: f64,
    ) -> Result<Vec<f64>> {
        let mut candidates = Vec::with_capacity(self.edges.len());
        for (slot, edge) in self.edges.iter().enumerate() {
            if edge.suppressed() {
                continue;
            }
            candidates.push(self.candidate(slot, self.seed_position(body, slot)?));
        }
        let strengths = self.release(&candidates, body, motion, freestream, vortices, t)?;
        self.commit();
        Ok(strengths)
    }

    /// Release one blob per shedding edge, between the edge and the blob
    /// released there last. The new blobs stay pending until [`commit`].
    ///
    /// [`commit`]: SheddingModel::commit
    pub fn shed(
        &mut self,
        body: &mut RigidBody,
        motion: &Motion,
        freestream: &Freestream,
        vortices: &mut VortexSet,
        t: f64,
    ) -> Result<Vec<f64>> {
        let mut candidates = Vec::with_capacity(self.edges.len());
        for (slot, edge) in self.edges.iter().enumerate() {
            if edge.suppressed() {
                continue;
            }
            let zeta = match edge.last.and_then(|i| vortices.get(i)) {
                Some(previous) => {
                    let tip = body.edge_position(slot);
                    let target = tip + (body.to_physical(previous.zeta) - tip) * self.fraction;
                    body.to_circle(target)?
                }
                None => self.seed_position(body, slot)?,
            };
            candidates.push(self.candidate(slot, zeta));
        }
        self.release(&candidates, body, motion, freestream, vortices, t)
    }

    fn candidate(&self, slot: usize, zeta: C64) -> Candidate {
        Candidate {
            slot,
            zeta,
            suction: self.edges[slot].suction,
        }
    }

    fn seed_position(&self, body: &RigidBody, slot: usize) -> Result<C64> {
        let map = body.map();
        let prevertex = body.edge_prevertex(slot);
        let tip = map.forward(prevertex);
        let outward = map.forward(prevertex * (1.0 + BISECTOR_STEP)) - tip;
        let seed = tip + outward.unscale(outward.norm()) * self.seed_offset;
        Ok(body.to_circle(body.pose().to_physical(seed))?)
    }

    /// Append zero-strength candidates, enforce, solve their circulation,
    /// assign it and enforce again.
    fn release(
        &mut self,
        candidates: &[Candidate],
        body: &mut RigidBody,
        motion: &Motion,
        freestream: &Freestream,
        vortices: &mut VortexSet,
        t: f64,
    ) -> Result<Vec<f64>> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        for edge in &mut self.edges {
            edge.pending = None;
        }
        let first = vortices.len();
        for candidate in candidates {
            vortices.push(Blob::new(candidate.zeta, 0.0));
        }
        enforce_no_flow_through(body, motion, freestream, &[&*vortices], t);
        let strengths = vorticity_flux(body, &[&*vortices], candidates, t)?;

        for (k, (candidate, &gamma)) in candidates.iter().zip(&strengths).enumerate() {
            vortices.set_gamma(first + k, gamma);
            self.edges[candidate.slot].pending = Some(first + k);
            debug!(t, edge = candidate.slot, gamma, "released blob");
        }
        enforce_no_flow_through(body, motion, freestream, &[&*vortices], t);
        Ok(strengths)
    }
}
