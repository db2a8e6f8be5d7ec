use super::{circle_points, ConformalMap, Laurent};
use crate::error::MapError;
use crate::C64;

const NEWTON_ITERATIONS: usize = 60;
const NEWTON_TOLERANCE: f64 = 1e-13;
const EDGE_SAMPLES: usize = 720;
const EDGE_TOLERANCE: f64 = 1e-8;

/// Map given directly by a finite Laurent series. The inverse is found by
/// Newton iteration started from the far-field inverse.
#[derive(Debug, Clone)]
pub struct PowerSeriesMap {
    laurent: Laurent,
    prevertices: Vec<C64>,
}

impl PowerSeriesMap {
    pub fn new(laurent: Laurent) -> Result<Self, MapError> {
        if !(laurent.leading.norm() > 0.0) {
            return Err(MapError::InvalidParameters(
                "leading coefficient must be nonzero".to_string(),
            ));
        }
        let prevertices = find_prevertices(&laurent);
        Ok(PowerSeriesMap { laurent, prevertices })
    }

    /// Circle of the given radius centred on the origin.
    pub fn circle(radius: f64) -> Result<Self, MapError> {
        Self::new(Laurent::new(C64::new(radius, 0.0), C64::default(), Vec::new()))
    }

    /// Ellipse `z = ζ + m/ζ` scaled by `scale`; m = 1 is a flat plate.
    pub fn ellipse(scale: f64, eccentricity: f64) -> Result<Self, MapError> {
        Self::new(Laurent::new(
            C64::new(scale, 0.0),
            C64::default(),
            vec![C64::new(scale * eccentricity, 0.0)],
        ))
    }
}

/// Zeros of dz/dζ on the unit circle: sample, then polish with Newton on dz/dζ.
fn find_prevertices(laurent: &Laurent) -> Vec<C64> {
    let samples: Vec<(C64, f64)> = circle_points(EDGE_SAMPLES)
        .map(|zeta| (zeta, laurent.derivatives(zeta).0.norm()))
        .collect();

    let mut found: Vec<C64> = Vec::new();
    for i in 0..samples.len() {
        let prev = samples[(i + samples.len() - 1) % samples.len()].1;
        let next = samples[(i + 1) % samples.len()].1;
        let (mut zeta, value) = samples[i];
        if value > prev || value > next {
            continue;
        }
        for _ in 0..NEWTON_ITERATIONS {
            let (d1, d2) = laurent.derivatives(zeta);
            if d2.norm() == 0.0 {
                break;
            }
            zeta -= d1 / d2;
        }
        let zeta = zeta / zeta.norm();
        if laurent.derivatives(zeta).0.norm() < EDGE_TOLERANCE
            && found.iter().all(|p| (p - zeta).norm() > 1e-6)
        {
            found.push(zeta);
        }
    }
    found
}

impl ConformalMap for PowerSeriesMap {
    fn forward(&self, zeta: C64) -> C64 {
        self.laurent.evaluate(zeta)
    }

    fn inverse(&self, z: C64) -> Result<C64, MapError> {
        let mut zeta = (z - self.laurent.constant) / self.laurent.leading;
        if zeta.norm() < 1.01 {
            zeta = C64::from_polar(1.01, zeta.arg());
        }
        let tolerance = NEWTON_TOLERANCE * z.norm().max(1.0);
        for _ in 0..NEWTON_ITERATIONS {
            let residual = self.laurent.evaluate(zeta) - z;
            if residual.norm() < tolerance {
                if zeta.norm() < 1.0 - 1e-9 {
                    return Err(MapError::interior(z));
                }
                return Ok(zeta);
            }
            let (d1, _) = self.laurent.derivatives(zeta);
            if d1.norm() == 0.0 {
                break;
            }
            zeta -= residual / d1;
        }
        Err(MapError::diverged(z))
    }

    fn derivatives(&self, zeta: C64) -> (C64, C64) {
        self.laurent.derivatives(zeta)
    }

    fn laurent(&self) -> &Laurent {
        &self.laurent
    }

    fn prevertices(&self) -> &[C64] {
        &self.prevertices
    }
}
