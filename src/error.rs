//! Error types for the map, configuration and simulation layers.

use crate::C64;

/// Failures of a conformal map query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// dz/dζ vanishes (or is not finite) where it has to be divided by.
    #[error("map derivative vanishes at zeta = {re:.6}{im:+.6}i")]
    Degenerate { re: f64, im: f64 },

    /// The physical point has no preimage outside the unit circle.
    #[error("point {re:.6}{im:+.6}i lies inside the body")]
    Interior { re: f64, im: f64 },

    /// Newton iteration for the inverse map did not converge.
    #[error("inverse map did not converge for z = {re:.6}{im:+.6}i")]
    InverseDiverged { re: f64, im: f64 },

    /// Parameters do not describe a valid exterior map.
    #[error("invalid map parameters: {0}")]
    InvalidParameters(String),
}

impl MapError {
    pub(crate) fn degenerate(zeta: C64) -> Self {
        MapError::Degenerate { re: zeta.re, im: zeta.im }
    }

    pub(crate) fn interior(z: C64) -> Self {
        MapError::Interior { re: z.re, im: z.im }
    }

    pub(crate) fn diverged(z: C64) -> Self {
        MapError::InverseDiverged { re: z.re, im: z.im }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value '{key}': {value} - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that halt a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The affine suction relation has no unique solution.
    #[error("shedding solve is singular at t = {time}: edges {edges:?}")]
    IllPosedShedding { time: f64, edges: Vec<usize> },

    #[error("edge vertex {index} does not exist ({available} prevertices on this map)")]
    UnknownEdge { index: usize, available: usize },

    #[error("state became non-finite at t = {time}")]
    NonFinite { time: f64 },
}

pub type Result<T, E = SimError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_key() {
        let err = ConfigError::invalid("dt", -1.0, "must be positive");
        assert!(err.to_string().contains("dt"));
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn map_error_converts_into_sim_error() {
        let err: SimError = MapError::degenerate(C64::new(1.0, 0.0)).into();
        assert!(matches!(err, SimError::Map(MapError::Degenerate { .. })));
    }
}
