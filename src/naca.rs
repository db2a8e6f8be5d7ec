//! NACA 4-digit sections: mean camber line, thickness distribution and a
//! cosine-spaced outline.

use std::f64::consts::PI;

use crate::error::ConfigError;
use crate::C64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Naca4 {
    /// Maximum camber as a fraction of chord.
    pub camber: f64,
    /// Chordwise location of maximum camber.
    pub camber_location: f64,
    /// Maximum thickness as a fraction of chord.
    pub thickness: f64,
}

impl Naca4 {
    pub fn new(camber: f64, camber_location: f64, thickness: f64) -> Self {
        Naca4 {
            camber,
            camber_location,
            thickness,
        }
    }

    /// Parse a four-digit designation such as `"4412"`.
    pub fn from_code(code: &str) -> Result<Self, ConfigError> {
        let digits: Vec<u32> = code.chars().filter_map(|c| c.to_digit(10)).collect();
        if code.len() != 4 || digits.len() != 4 {
            return Err(ConfigError::invalid("airfoil.code", code, "expected four digits"));
        }
        Ok(Naca4 {
            camber: digits[0] as f64 / 100.0,
            camber_location: digits[1] as f64 / 10.0,
            thickness: (digits[2] * 10 + digits[3]) as f64 / 100.0,
        })
    }

    /// Mean camber line height and slope at chord fraction `x`.
    pub fn camber_line(&self, x: f64) -> (f64, f64) {
        let m = self.camber;
        let p = self.camber_location;
        if m == 0.0 || p <= 0.0 || p >= 1.0 {
            return (0.0, 0.0);
        }
        if x < p {
            (
                m * (x / p.powi(2)) * (2.0 * p - x),
                2.0 * m / p.powi(2) * (p - x),
            )
        } else {
            (
                m * ((1.0 - x) / (1.0 - p).powi(2)) * (1.0 + x - 2.0 * p),
                2.0 * m / (1.0 - p).powi(2) * (p - x),
            )
        }
    }

    /// Half thickness at chord fraction `x`, closed at the trailing edge.
    pub fn half_thickness(&self, x: f64) -> f64 {
        5.0 * self.thickness
            * (0.2969 * x.sqrt() - 0.1260 * x - 0.3516 * x.powi(2) + 0.2843 * x.powi(3)
                - 0.1036 * x.powi(4))
    }

    /// Radius of the nose circle as a fraction of chord.
    pub fn leading_edge_radius(&self) -> f64 {
        1.1019 * self.thickness.powi(2)
    }

    /// Closed outline with unit chord and the leading edge at the origin,
    /// counterclockwise from the trailing edge: upper surface forward to the
    /// nose, then the lower surface back. The trailing edge is the first and
    /// the last point.
    pub fn outline(&self, num_panels: usize) -> Vec<C64> {
        let spacing = PI / num_panels as f64;
        let stations: Vec<f64> = (0..=num_panels)
            .map(|i| 0.5 * (1.0 - (i as f64 * spacing).cos()))
            .collect();

        let mut upper = Vec::with_capacity(stations.len());
        let mut lower = Vec::with_capacity(stations.len());
        for &x in &stations {
            let (yc, slope) = self.camber_line(x);
            let yt = self.half_thickness(x);
            let theta = slope.atan();
            upper.push(C64::new(x - yt * theta.sin(), yc + yt * theta.cos()));
            lower.push(C64::new(x + yt * theta.sin(), yc - yt * theta.cos()));
        }

        upper.reverse();
        upper.extend(lower.into_iter().skip(1));
        upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_designation() {
        let profile = Naca4::from_code("4412").unwrap();
        assert_relative_eq!(profile.camber, 0.04);
        assert_relative_eq!(profile.camber_location, 0.4);
        assert_relative_eq!(profile.thickness, 0.12);
        assert!(Naca4::from_code("44a2").is_err());
        assert!(Naca4::from_code("441").is_err());
    }

    #[test]
    fn camber_peaks_at_its_location() {
        let profile = Naca4::new(0.04, 0.4, 0.12);
        let (peak, slope) = profile.camber_line(0.4);
        assert_relative_eq!(peak, 0.04, epsilon = 1e-12);
        assert_relative_eq!(slope, 0.0, epsilon = 1e-12);
        assert!(profile.camber_line(0.2).0 < peak);
        assert!(profile.camber_line(0.8).0 < peak);
    }

    #[test]
    fn outline_has_the_nominal_thickness() {
        let profile = Naca4::new(0.0, 0.0, 0.12);
        let outline = profile.outline(200);
        assert_eq!(outline.len(), 401);
        let upper = outline.iter().map(|z| z.im).fold(f64::MIN, f64::max);
        let lower = outline.iter().map(|z| z.im).fold(f64::MAX, f64::min);
        assert_relative_eq!(upper - lower, 0.12, epsilon = 1e-3);
    }

    #[test]
    fn outline_runs_counterclockwise_from_a_closed_trailing_edge() {
        let outline = Naca4::new(0.04, 0.4, 0.12).outline(100);
        let first = outline[0];
        let last = outline[outline.len() - 1];
        assert_relative_eq!(first.re, 1.0, epsilon = 1e-12);
        assert!(first.im.abs() < 1e-12 && last.im.abs() < 1e-12);
        assert_relative_eq!(last.re, 1.0, epsilon = 1e-12);
        // Nose in the middle, upper surface first.
        assert!(outline[100].norm() < 1e-12);
        assert!(outline[50].im > 0.0 && outline[150].im < 0.0);
        // Shoelace area is positive for a counterclockwise loop.
        let area: f64 = outline
            .windows(2)
            .map(|pair| pair[0].re * pair[1].im - pair[1].re * pair[0].im)
            .sum();
        assert!(area > 0.0);
    }
}
