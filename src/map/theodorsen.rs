//! Theodorsen–Garrick fit of a sharp-tailed outline.
//!
//! A Joukowski map `z = w + a²/w` sends the outline to a near-circle in the
//! w-plane that passes through the critical point `w = a`. The near-circle is
//! then the image of the unit circle under
//! `w = Rζ exp(Σₙ cₙ ζ⁻ⁿ)`, whose coefficients come from iterating the
//! conjugate-function relation between the boundary angle and the log radius.

use std::f64::consts::PI;

use tracing::debug;

use super::{ConformalMap, Laurent};
use crate::error::MapError;
use crate::naca::Naca4;
use crate::C64;

const FIT_ITERATIONS: usize = 200;
const FIT_TOLERANCE: f64 = 1e-12;
const NEWTON_ITERATIONS: usize = 60;
const NEWTON_TOLERANCE: f64 = 1e-13;
/// Panels per surface when sampling a NACA section.
const NACA_PANELS: usize = 400;
/// Log-radius depth below the near-circle treated as inside the body.
const INTERIOR_MARGIN: f64 = 0.05;

#[derive(Debug, Clone)]
pub struct TheodorsenMap {
    scale: f64,
    radius: f64,
    series: Vec<C64>, // c₁, c₂, ... of the exponent
    laurent: Laurent,
    prevertices: Vec<C64>,
    boundary_radius: Vec<(f64, f64)>, // (θ, ln|w|) on the near-circle
    boundary_shift: Vec<(f64, f64)>,  // (θ, θ − φ)
}

impl TheodorsenMap {
    /// Fit a map to `outline`, given in the body frame counterclockwise from
    /// the trailing edge at `z = 2·scale`. The outline must wind once around
    /// `z = −2·scale`, the other Joukowski singularity. `modes` is the length
    /// of the exponent series.
    pub fn fit(outline: &[C64], scale: f64, modes: usize) -> Result<Self, MapError> {
        if !(scale > 0.0 && scale.is_finite()) || modes == 0 || outline.len() < 8 {
            return Err(MapError::InvalidParameters(format!(
                "fit needs a positive scale, at least one mode and 8 outline points \
                 (scale {scale}, {modes} modes, {} points)",
                outline.len()
            )));
        }
        let trailing_edge = C64::new(2.0 * scale, 0.0);
        if (outline[0] - trailing_edge).norm() > 1e-9 * scale {
            return Err(MapError::InvalidParameters(format!(
                "outline starts at {} instead of the trailing edge {trailing_edge}",
                outline[0]
            )));
        }

        let near_circle = near_circle(outline, scale)?;
        let samples = 4 * modes;
        let phis: Vec<f64> = (0..samples).map(|j| 2.0 * PI * j as f64 / samples as f64).collect();
        let roots: Vec<C64> = phis.iter().map(|&phi| C64::from_polar(1.0, phi)).collect();

        let mut shift = vec![0.0; samples];
        let mut series = vec![C64::default(); modes];
        let mut mean = 0.0_f64;
        let mut converged = None;
        for iteration in 0..FIT_ITERATIONS {
            let psi: Vec<f64> = phis
                .iter()
                .zip(&shift)
                .map(|(phi, eps)| periodic_interp(&near_circle, phi + eps))
                .collect();
            mean = psi.iter().sum::<f64>() / samples as f64;
            for (k, c) in series.iter_mut().enumerate() {
                let n = k + 1;
                *c = psi
                    .iter()
                    .enumerate()
                    .map(|(j, p)| roots[(j * n) % samples] * *p)
                    .sum::<C64>()
                    * (2.0 / samples as f64);
            }

            let mut change: f64 = 0.0;
            for (j, eps) in shift.iter_mut().enumerate() {
                let updated: f64 = series
                    .iter()
                    .enumerate()
                    .map(|(k, c)| (c * roots[(j * (k + 1)) % samples].conj()).im)
                    .sum();
                change = change.max((updated - *eps).abs());
                *eps = updated;
            }
            if change < FIT_TOLERANCE {
                converged = Some(iteration + 1);
                break;
            }
        }
        let Some(iterations) = converged else {
            return Err(MapError::InvalidParameters(format!(
                "near-circle fit did not converge in {FIT_ITERATIONS} iterations"
            )));
        };

        let mut map = TheodorsenMap {
            scale,
            radius: scale * mean.exp(),
            series,
            laurent: Laurent::new(C64::default(), C64::default(), Vec::new()),
            prevertices: Vec::new(),
            boundary_radius: Vec::new(),
            boundary_shift: Vec::new(),
        };

        // The truncated series puts the trailing edge where the boundary
        // angle is zero; re-centre the Joukowski step on that point so dz/dζ
        // vanishes there exactly.
        let edge = map.trailing_edge_prevertex()?;
        map.scale = map.near_circle_point(edge).0.norm();
        map.prevertices.push(edge);
        map.tabulate_boundary(samples);
        map.laurent = map.expand(2 * modes);

        debug!(
            iterations,
            modes,
            scale = map.scale,
            radius = map.radius,
            "fitted near-circle map"
        );
        Ok(map)
    }

    /// Fit to a NACA 4-digit section of the given chord. The far singularity
    /// sits half-way between the nose and its centre of curvature.
    pub fn from_naca(profile: &Naca4, chord: f64, modes: usize) -> Result<Self, MapError> {
        if !(chord > 0.0 && chord.is_finite()) {
            return Err(MapError::InvalidParameters(format!("chord {chord} must be positive")));
        }
        let nose = 0.5 * profile.leading_edge_radius();
        let scale = chord * (1.0 - nose) / 4.0;
        let offset = C64::new(chord * (1.0 + nose) / 2.0, 0.0);
        let outline: Vec<C64> = profile
            .outline(NACA_PANELS)
            .into_iter()
            .map(|p| p * chord - offset)
            .collect();
        Self::fit(&outline, scale, modes)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Exponent series and its first two derivatives.
    fn exponent(&self, zeta: C64) -> (C64, C64, C64) {
        let inv = zeta.inv();
        let mut s = C64::default();
        let mut s1 = C64::default();
        let mut s2 = C64::default();
        let mut power = inv;
        for (k, c) in self.series.iter().enumerate() {
            let n = (k + 1) as f64;
            s += c * power;
            s1 -= c * power * inv * n;
            s2 += c * power * inv * inv * (n * (n + 1.0));
            power *= inv;
        }
        (s, s1, s2)
    }

    /// w(ζ) with its first two derivatives.
    fn near_circle_point(&self, zeta: C64) -> (C64, C64, C64) {
        let (s, s1, s2) = self.exponent(zeta);
        let w = zeta * s.exp() * self.radius;
        let g = zeta.inv() + s1;
        let d1 = w * g;
        let d2 = d1 * g + w * (s2 - zeta.inv() * zeta.inv());
        (w, d1, d2)
    }

    /// Circle angle whose image has zero boundary angle.
    fn trailing_edge_prevertex(&self) -> Result<C64, MapError> {
        let mut phi = 0.0_f64;
        for _ in 0..NEWTON_ITERATIONS {
            let zeta = C64::from_polar(1.0, phi);
            let (s, s1, _) = self.exponent(zeta);
            let residual = phi + s.im;
            if residual.abs() < NEWTON_TOLERANCE {
                return Ok(zeta);
            }
            let slope = 1.0 + (zeta * s1).re;
            if !(slope > 0.0) {
                break;
            }
            phi -= residual / slope;
        }
        Err(MapError::InvalidParameters(
            "fitted map has no trailing-edge critical point".to_string(),
        ))
    }

    /// Newton solve of w(ζ) = `w`, started from the tabulated boundary.
    fn solve_near_circle(&self, w: C64, height: f64) -> Option<C64> {
        let theta = w.arg();
        let phi = theta - periodic_interp(&self.boundary_shift, theta);
        let mut zeta = C64::from_polar(height.max(0.0).exp(), phi);
        let tolerance = NEWTON_TOLERANCE * w.norm().max(1.0);
        for _ in 0..NEWTON_ITERATIONS {
            let (value, d1, _) = self.near_circle_point(zeta);
            let residual = value - w;
            if residual.norm() < tolerance {
                return Some(zeta);
            }
            if !(d1.norm() > 0.0) {
                return None;
            }
            zeta -= residual / d1;
        }
        None
    }

    fn tabulate_boundary(&mut self, samples: usize) {
        let mut radius = Vec::with_capacity(samples);
        let mut shift = Vec::with_capacity(samples);
        for j in 0..samples {
            let phi = 2.0 * PI * j as f64 / samples as f64;
            let (s, _, _) = self.exponent(C64::from_polar(1.0, phi));
            let theta = (phi + s.im).rem_euclid(2.0 * PI);
            radius.push((theta, self.radius.ln() + s.re));
            shift.push((theta, s.im));
        }
        radius.sort_by(|a, b| a.0.total_cmp(&b.0));
        shift.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.boundary_radius = radius;
        self.boundary_shift = shift;
    }

    /// Laurent coefficients of z(ζ) from the exact leading terms and a
    /// discrete Fourier transform of the boundary values.
    fn expand(&self, terms: usize) -> Laurent {
        let samples = 4 * terms;
        let values: Vec<(C64, C64)> = (0..samples)
            .map(|j| {
                let zeta = C64::from_polar(1.0, 2.0 * PI * j as f64 / samples as f64);
                (zeta, self.forward(zeta))
            })
            .collect();
        let tail = (1..=terms as i32)
            .map(|k| {
                values.iter().map(|(zeta, z)| z * zeta.powi(k)).sum::<C64>() / samples as f64
            })
            .collect();
        let constant = self.series.first().copied().unwrap_or_default() * self.radius;
        Laurent::new(C64::new(self.radius, 0.0), constant, tail)
    }
}

/// Near-circle of the outline as (θ, ln|w/a|) samples sorted on [0, 2π).
fn near_circle(outline: &[C64], scale: f64) -> Result<Vec<(f64, f64)>, MapError> {
    let a2 = scale * scale;
    let start = C64::new(scale, 0.0);
    let mut previous = start;
    let mut theta = 0.0;
    let mut samples = vec![(0.0, 0.0)];
    for (j, &z) in outline.iter().enumerate().skip(1) {
        let root = (z * z - 4.0 * a2).sqrt();
        let (w1, w2) = ((z + root) * 0.5, (z - root) * 0.5);
        // Leave the trailing edge on the outer sheet, then follow the branch.
        let w = if previous == start {
            if w1.norm() >= w2.norm() { w1 } else { w2 }
        } else if (w1 - previous).norm() <= (w2 - previous).norm() {
            w1
        } else {
            w2
        };
        if w == previous {
            continue;
        }
        let step = (w / previous).arg();
        if !(step > 0.0) {
            return Err(MapError::InvalidParameters(format!(
                "outline is not star-shaped in the near-circle plane at point {j} ({z})"
            )));
        }
        theta += step;
        samples.push((theta, (w.norm() / scale).ln()));
        previous = w;
    }
    let closing = theta + (start / previous).arg();
    if (closing - 2.0 * PI).abs() > 1e-6 {
        return Err(MapError::InvalidParameters(format!(
            "outline winds through {closing} radians instead of once around the nose"
        )));
    }
    // The closing point repeats θ = 0.
    while samples.len() > 1 && samples[samples.len() - 1].0 >= 2.0 * PI - 1e-9 {
        samples.pop();
    }
    Ok(samples)
}

/// Linear interpolation of 2π-periodic samples sorted on [0, 2π).
fn periodic_interp(nodes: &[(f64, f64)], x: f64) -> f64 {
    let x = x.rem_euclid(2.0 * PI);
    let i = nodes.partition_point(|&(t, _)| t <= x);
    let (t0, v0) = match i {
        0 => {
            let (t, v) = nodes[nodes.len() - 1];
            (t - 2.0 * PI, v)
        }
        _ => nodes[i - 1],
    };
    let (t1, v1) = match nodes.get(i) {
        Some(&node) => node,
        None => (nodes[0].0 + 2.0 * PI, nodes[0].1),
    };
    if t1 > t0 {
        v0 + (x - t0) / (t1 - t0) * (v1 - v0)
    } else {
        v0
    }
}

impl ConformalMap for TheodorsenMap {
    fn forward(&self, zeta: C64) -> C64 {
        let (w, _, _) = self.near_circle_point(zeta);
        w + w.inv() * (self.scale * self.scale)
    }

    fn inverse(&self, z: C64) -> Result<C64, MapError> {
        let a2 = self.scale * self.scale;
        let root = (z * z - 4.0 * a2).sqrt();
        // Both Joukowski preimages, highest above the near-circle first. Close
        // to the trailing edge the two are nearly level, so the lower one is
        // tried as well.
        let mut candidates = [(z + root) * 0.5, (z - root) * 0.5]
            .map(|w| (w, w.norm().ln() - periodic_interp(&self.boundary_radius, w.arg())));
        if candidates[1].1 > candidates[0].1 {
            candidates.swap(0, 1);
        }

        let mut diverged = false;
        let mut inside = false;
        for (w, height) in candidates {
            if !height.is_finite() {
                diverged = true;
                continue;
            }
            if height < -INTERIOR_MARGIN {
                continue;
            }
            match self.solve_near_circle(w, height) {
                Some(zeta) if zeta.norm() >= 1.0 - 1e-9 => return Ok(zeta),
                Some(_) => inside = true,
                None => diverged = true,
            }
        }
        if diverged && !inside {
            Err(MapError::diverged(z))
        } else {
            Err(MapError::interior(z))
        }
    }

    fn derivatives(&self, zeta: C64) -> (C64, C64) {
        let (w, w1, w2) = self.near_circle_point(zeta);
        let a2 = self.scale * self.scale;
        let inv = w.inv();
        let stretch = C64::new(1.0, 0.0) - inv * inv * a2;
        let d1 = stretch * w1;
        let d2 = inv * inv * inv * w1 * w1 * (2.0 * a2) + stretch * w2;
        (d1, d2)
    }

    fn laurent(&self) -> &Laurent {
        &self.laurent
    }

    fn prevertices(&self) -> &[C64] {
        &self.prevertices
    }
}
