//! Configuration types for loading simulation scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`AirfoilConfig`]   – section shape and map truncation
//! - [`BodyConfig`]      – initial pose and net circulation
//! - [`FreestreamConfig`] – uniform far-field flow
//! - [`MotionConfig`]    – prescribed kinematics
//! - [`NumericsConfig`]  – time step, kernel and sampling parameters
//! - [`EdgeConfig`]      – shedding edges and their suction criteria
//! - [`TracerConfig`]    – optional grid of passive tracers
//!
//! Every section may be omitted; missing values fall back to a NACA 4412
//! at 10° incidence in a unit stream.
//!
//! # YAML format
//!
//! ```yaml
//! airfoil:
//!   camber: 0.04            # or `code: "4412"`
//!   camber_location: 0.4
//!   thickness: 0.12
//!   chord: 1.0
//!   map: theodorsen         # joukowski: closed-form section, camber at mid-chord
//!   modes: 128
//!   laurent_terms: 32       # joukowski only
//!
//! body:
//!   centroid: [0.0, 0.0]
//!   angle_deg: -10.0        # negative pitches the nose up
//!   circulation: 0.0
//!
//! freestream:
//!   speed: 1.0
//!   angle_deg: 0.0
//!
//! motion:
//!   kind: stationary        # translation | oscillation
//!
//! numerics:
//!   dt: 0.005
//!   t_end: 2.0
//!   kernel: { kind: blob, radius: 0.02 }
//!   shed_fraction: 0.3333333333333333
//!   seed_offset: 0.01
//!   collocation_points: 256
//!   sample_every: 10
//!   divergence_radius: 1000.0
//!
//! edges:
//!   - vertex: 0
//!     suction: 0.0          # .inf switches the edge off
//!
//! tracers:
//!   center: [0.5, 0.0]
//!   side: 0.5
//!   density: 10
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::elements::Kernel;
use crate::error::ConfigError;
use crate::motion::{Kinematics, Oscillation, Stationary, Translation};
use crate::naca::Naca4;
use crate::solver::DEFAULT_SHED_FRACTION;
use crate::C64;

/// How the section outline becomes a conformal map.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    /// Near-circle fit of the exact NACA outline.
    #[default]
    Theodorsen,
    /// Joukowski section with matching thickness and camber.
    Joukowski,
}

/// Section shape. `code` takes precedence over the explicit parameters.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AirfoilConfig {
    pub code: Option<String>,
    pub camber: f64,          // maximum camber, fraction of chord
    pub camber_location: f64, // chordwise position of maximum camber
    pub thickness: f64,       // maximum thickness, fraction of chord
    pub chord: f64,
    pub map: MapKind,
    pub modes: usize,         // near-circle series length
    pub laurent_terms: usize, // Joukowski Laurent tail length
}

impl Default for AirfoilConfig {
    fn default() -> Self {
        AirfoilConfig {
            code: None,
            camber: 0.04,
            camber_location: 0.4,
            thickness: 0.12,
            chord: 1.0,
            map: MapKind::Theodorsen,
            modes: 128,
            laurent_terms: 32,
        }
    }
}

impl AirfoilConfig {
    pub fn profile(&self) -> Result<Naca4, ConfigError> {
        match &self.code {
            Some(code) => Naca4::from_code(code),
            None => Ok(Naca4::new(self.camber, self.camber_location, self.thickness)),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BodyConfig {
    pub centroid: [f64; 2],
    pub angle_deg: f64,   // counterclockwise rotation of the body frame
    pub circulation: f64, // net circulation of body plus wake
}

impl Default for BodyConfig {
    fn default() -> Self {
        BodyConfig {
            centroid: [0.0, 0.0],
            angle_deg: -10.0,
            circulation: 0.0,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FreestreamConfig {
    pub speed: f64,
    pub angle_deg: f64, // flow direction, counterclockwise from +x
}

impl Default for FreestreamConfig {
    fn default() -> Self {
        FreestreamConfig {
            speed: 1.0,
            angle_deg: 0.0,
        }
    }
}

/// Prescribed kinematics of the body.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionConfig {
    /// Body held fixed.
    #[default]
    Stationary,

    /// Constant velocity `[u, v]` and angular velocity (rad per time unit).
    Translation {
        velocity: [f64; 2],
        #[serde(default)]
        angular_velocity: f64,
    },

    /// Heave h₀ sin(ωt + φ) and pitch α₀ sin(ωt).
    Oscillation {
        #[serde(default)]
        heave_amplitude: f64,
        #[serde(default)]
        pitch_amplitude_deg: f64,
        angular_frequency: f64,
        #[serde(default)]
        phase_deg: f64,
    },
}

impl MotionConfig {
    pub fn kinematics(&self) -> Box<dyn Kinematics> {
        match *self {
            MotionConfig::Stationary => Box::new(Stationary),
            MotionConfig::Translation {
                velocity,
                angular_velocity,
            } => Box::new(Translation {
                velocity: C64::new(velocity[0], velocity[1]),
                angular_velocity,
            }),
            MotionConfig::Oscillation {
                heave_amplitude,
                pitch_amplitude_deg,
                angular_frequency,
                phase_deg,
            } => Box::new(Oscillation {
                heave_amplitude,
                pitch_amplitude: pitch_amplitude_deg.to_radians(),
                angular_frequency,
                phase: phase_deg.to_radians(),
            }),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct NumericsConfig {
    pub dt: f64,                    // fixed time step
    pub t_end: f64,                 // end time of a full run
    pub kernel: Kernel,             // point or blob, δ in circle-plane units
    pub shed_fraction: f64,         // new blob position between edge and previous blob
    pub seed_offset: f64,           // physical distance of the t = 0 seed from its edge
    pub collocation_points: usize,  // surface points for the bound sheet
    pub sample_every: usize,        // steps between archived snapshots
    pub divergence_radius: f64,     // warn once an element is farther from the centroid
}

impl Default for NumericsConfig {
    fn default() -> Self {
        NumericsConfig {
            dt: 0.005,
            t_end: 2.0,
            kernel: Kernel::default(),
            shed_fraction: DEFAULT_SHED_FRACTION,
            seed_offset: 0.01,
            collocation_points: 256,
            sample_every: 10,
            divergence_radius: 1000.0,
        }
    }
}

impl NumericsConfig {
    /// Check the step, kernel and sampling settings a run depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("numerics.dt", self.dt)?;
        if !(self.t_end >= 0.0 && self.t_end.is_finite()) {
            return Err(ConfigError::invalid("numerics.t_end", self.t_end, "must be non-negative"));
        }
        let radius = self.kernel.radius();
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(ConfigError::invalid("numerics.kernel.radius", radius, "must be non-negative"));
        }
        if !(self.shed_fraction > 0.0 && self.shed_fraction <= 1.0) {
            return Err(ConfigError::invalid(
                "numerics.shed_fraction",
                self.shed_fraction,
                "must lie in (0, 1]",
            ));
        }
        positive("numerics.seed_offset", self.seed_offset)?;
        if self.collocation_points < 8 {
            return Err(ConfigError::invalid(
                "numerics.collocation_points",
                self.collocation_points,
                "must be at least 8",
            ));
        }
        if self.sample_every == 0 {
            return Err(ConfigError::invalid("numerics.sample_every", 0, "must be at least 1"));
        }
        positive("numerics.divergence_radius", self.divergence_radius)?;
        Ok(())
    }
}

/// A shedding edge: index into the map's prevertices and critical suction.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct EdgeConfig {
    pub vertex: usize,
    #[serde(default)]
    pub suction: f64,
}

/// Square grid of `density × density` tracers.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TracerConfig {
    pub center: [f64; 2],
    pub side: f64,
    pub density: usize,
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub airfoil: AirfoilConfig,
    pub body: BodyConfig,
    pub freestream: FreestreamConfig,
    pub motion: MotionConfig,
    pub numerics: NumericsConfig,
    pub edges: Vec<EdgeConfig>,
    pub tracers: Option<TracerConfig>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            airfoil: AirfoilConfig::default(),
            body: BodyConfig::default(),
            freestream: FreestreamConfig::default(),
            motion: MotionConfig::default(),
            numerics: NumericsConfig::default(),
            edges: vec![EdgeConfig {
                vertex: 0,
                suction: 0.0,
            }],
            tracers: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let profile = self.airfoil.profile()?;
        positive("airfoil.chord", self.airfoil.chord)?;
        if !(profile.thickness > 0.0 && profile.thickness < 0.5) {
            return Err(ConfigError::invalid(
                "airfoil.thickness",
                profile.thickness,
                "must lie in (0, 0.5)",
            ));
        }
        if !(profile.camber >= 0.0 && profile.camber < 0.2) {
            return Err(ConfigError::invalid("airfoil.camber", profile.camber, "must lie in [0, 0.2)"));
        }
        if !(profile.camber_location > 0.0 && profile.camber_location < 1.0) && profile.camber > 0.0 {
            return Err(ConfigError::invalid(
                "airfoil.camber_location",
                profile.camber_location,
                "must lie in (0, 1)",
            ));
        }
        if self.airfoil.laurent_terms == 0 {
            return Err(ConfigError::invalid("airfoil.laurent_terms", 0, "must be at least 1"));
        }
        if self.airfoil.modes < 8 {
            return Err(ConfigError::invalid(
                "airfoil.modes",
                self.airfoil.modes,
                "must be at least 8",
            ));
        }

        finite("body.angle_deg", self.body.angle_deg)?;
        finite("body.circulation", self.body.circulation)?;
        for value in self.body.centroid {
            finite("body.centroid", value)?;
        }
        if !(self.freestream.speed >= 0.0 && self.freestream.speed.is_finite()) {
            return Err(ConfigError::invalid(
                "freestream.speed",
                self.freestream.speed,
                "must be finite and non-negative",
            ));
        }
        finite("freestream.angle_deg", self.freestream.angle_deg)?;
        if let MotionConfig::Oscillation {
            angular_frequency, ..
        } = self.motion
        {
            finite("motion.angular_frequency", angular_frequency)?;
        }

        self.numerics.validate()?;

        for (i, edge) in self.edges.iter().enumerate() {
            if !(edge.suction >= 0.0) {
                return Err(ConfigError::invalid(
                    &format!("edges[{i}].suction"),
                    edge.suction,
                    "must be non-negative (.inf disables the edge)",
                ));
            }
            if self.edges[..i].iter().any(|e| e.vertex == edge.vertex) {
                return Err(ConfigError::invalid(
                    &format!("edges[{i}].vertex"),
                    edge.vertex,
                    "edge listed twice",
                ));
            }
        }

        if let Some(tracers) = &self.tracers {
            positive("tracers.side", tracers.side)?;
            if tracers.density == 0 {
                return Err(ConfigError::invalid("tracers.density", 0, "must be at least 1"));
            }
        }
        Ok(())
    }
}

fn positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "must be positive and finite"))
    }
}

fn finite(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, value, "must be finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_default_scenario() {
        let config = SimulationConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        let profile = config.airfoil.profile().unwrap();
        assert_eq!(profile, Naca4::new(0.04, 0.4, 0.12));
        assert_eq!(config.numerics.kernel, Kernel::Blob { radius: 0.02 });
        assert_eq!(config.airfoil.map, MapKind::Theodorsen);
    }

    #[test]
    fn parses_a_full_scenario() {
        let yaml = r#"
airfoil:
  code: "0012"
  chord: 2.0
  map: joukowski
body:
  angle_deg: -5.0
freestream:
  speed: 2.0
motion:
  kind: oscillation
  heave_amplitude: 0.1
  angular_frequency: 6.0
numerics:
  dt: 0.01
  kernel: { kind: point }
edges:
  - vertex: 0
  - vertex: 1
    suction: .inf
tracers:
  center: [0.0, 0.0]
  side: 1.0
  density: 4
"#;
        let config = SimulationConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.airfoil.profile().unwrap(), Naca4::new(0.0, 0.0, 0.12));
        assert_eq!(config.airfoil.map, MapKind::Joukowski);
        assert_eq!(config.airfoil.chord, 2.0);
        assert_eq!(config.numerics.kernel, Kernel::Point);
        assert_eq!(config.numerics.sample_every, 10);
        assert_eq!(config.edges[0].suction, 0.0);
        assert_eq!(config.edges[1].suction, f64::INFINITY);
        assert!(matches!(
            config.motion,
            MotionConfig::Oscillation { heave_amplitude, phase_deg, .. }
                if heave_amplitude == 0.1 && phase_deg == 0.0
        ));
        assert_eq!(config.tracers.unwrap().density, 4);
    }

    #[test]
    fn translation_builds_its_kinematics() {
        let yaml = "motion: { kind: translation, velocity: [-1.0, 0.0] }";
        let config = SimulationConfig::from_yaml_str(yaml).unwrap();
        let motion = config.motion.kinematics().motion(3.0);
        assert_eq!(motion.c_dot, C64::new(-1.0, 0.0));
        assert_eq!(motion.alpha_dot, 0.0);
    }

    #[test]
    fn rejects_invalid_values() {
        let cases = [
            ("numerics: { dt: 0.0 }", "numerics.dt"),
            ("numerics: { shed_fraction: 1.5 }", "numerics.shed_fraction"),
            ("numerics: { kernel: { kind: blob, radius: -1.0 } }", "numerics.kernel.radius"),
            ("airfoil: { thickness: 0.0 }", "airfoil.thickness"),
            ("airfoil: { modes: 2 }", "airfoil.modes"),
            ("airfoil: { code: \"44x2\" }", "airfoil.code"),
            ("edges: [ { vertex: 0, suction: -1.0 } ]", "edges[0].suction"),
            ("edges: [ { vertex: 0 }, { vertex: 0 } ]", "edges[1].vertex"),
            ("tracers: { center: [0.0, 0.0], side: 1.0, density: 0 }", "tracers.density"),
        ];
        for (yaml, expected) in cases {
            match SimulationConfig::from_yaml_str(yaml) {
                Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, expected, "{yaml}"),
                other => panic!("{yaml}: expected invalid value, got {other:?}"),
            }
        }
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = SimulationConfig::from_yaml_str("numerics: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
