//! Induced velocity of the free elements and its transform to circle-plane rates.

use std::f64::consts::PI;

use crate::body::RigidBody;
use crate::elements::{Kernel, VortexSet};
use crate::error::MapError;
use crate::state::SystemState;
use crate::C64;

/// Per-element velocity buffers, reused from step to step.
#[derive(Debug, Clone, Default)]
pub struct VelocityBuffers {
    pub vortices: Vec<C64>,
    pub tracers: Vec<C64>,
}

/// dF/dζ at `zeta` from the bound system, freestream and every free blob.
pub fn conj_velocity_at(
    body: &RigidBody,
    sources: &[&VortexSet],
    kernel: &Kernel,
    zeta: C64,
) -> C64 {
    let mut w = body.bound.conj_velocity(zeta, kernel);
    for blob in sources.iter().flat_map(|set| set.iter()) {
        if blob.gamma != 0.0 {
            w += kernel.conj_velocity(zeta, blob.zeta) * blob.gamma;
        }
    }
    w
}

/// Zero `out`, then write dF/dζ at every element of `targets`.
pub fn induce_velocity(
    body: &RigidBody,
    sources: &[&VortexSet],
    kernel: &Kernel,
    targets: &VortexSet,
    out: &mut Vec<C64>,
) {
    out.clear();
    out.resize(targets.len(), C64::default());
    for (w, target) in out.iter_mut().zip(targets.iter()) {
        *w = conj_velocity_at(body, sources, kernel, target.zeta);
    }
}

/// dF/dζ at every vortex and tracer of `state`. Requires the bound system to
/// be enforced for `state`.
pub fn self_induce_velocity(state: &SystemState, kernel: &Kernel, buffers: &mut VelocityBuffers) {
    let sources = [&state.vortices];
    induce_velocity(&state.body, &sources, kernel, &state.vortices, &mut buffers.vortices);
    induce_velocity(&state.body, &sources, kernel, &state.tracers, &mut buffers.tracers);
}

/// Replace each dF/dζ in `velocities` by the body-fixed circle-plane rate
///
/// dζ/dt = conj(F′ + iΓf″/(4πf′)) / |f′|² − e^{−iα} v_body / f′
///
/// where the f″ term is the Routh correction for a vortex in a mapped domain.
pub fn transform_velocity(
    body: &RigidBody,
    targets: &VortexSet,
    velocities: &mut [C64],
) -> Result<(), MapError> {
    let unrotate = body.pose().rotation().conj();
    for (blob, w) in targets.iter().zip(velocities.iter_mut()) {
        let (d1, d2) = body.map().metric(blob.zeta)?;
        let routh = C64::new(0.0, blob.gamma / (4.0 * PI)) * d2 / d1;
        let wall = body.body_velocity(body.to_physical(blob.zeta)) * unrotate;
        *w = (*w + routh).conj() / d1.norm_sqr() - wall / d1;
    }
    Ok(())
}

/// Physical velocity u + iv from dF/dζ at `zeta`.
pub fn physical_velocity(body: &RigidBody, zeta: C64, conj_velocity: C64) -> Result<C64, MapError> {
    let (d1, _) = body.map().metric(zeta)?;
    Ok((conj_velocity / (body.pose().rotation() * d1)).conj())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Pose;
    use crate::elements::Blob;
    use crate::freestream::Freestream;
    use crate::map::{JoukowskiMap, PowerSeriesMap};
    use crate::motion::Motion;
    use crate::naca::Naca4;
    use crate::solver::enforce_no_flow_through;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn section(angle: f64) -> RigidBody {
        let map = Arc::new(JoukowskiMap::from_naca(&Naca4::new(0.02, 0.5, 0.1), 1.0, 32).unwrap());
        RigidBody::new(map, Pose::new(C64::default(), angle), vec![0]).unwrap()
    }

    #[test]
    fn far_field_recovers_the_freestream() {
        let mut body = section(-0.3);
        let freestream = Freestream::new(1.5, 0.2);
        let empty = VortexSet::new();
        enforce_no_flow_through(&mut body, &Motion::default(), &freestream, &[&empty], 0.0);
        let zeta = body.to_circle(C64::new(400.0, -300.0)).unwrap();
        let w = conj_velocity_at(&body, &[&empty], &Kernel::Point, zeta);
        let u = physical_velocity(&body, zeta, w).unwrap();
        assert_relative_eq!(u.re, freestream.velocity.re, epsilon = 1e-4);
        assert_relative_eq!(u.im, freestream.velocity.im, epsilon = 1e-4);
    }

    #[test]
    fn transformed_rate_reproduces_physical_motion() {
        let mut body = section(0.4);
        let freestream = Freestream::new(1.0, 0.0);
        let tracers: VortexSet = vec![Blob::tracer(C64::new(1.3, 0.8))].into_iter().collect();
        let empty = VortexSet::new();
        enforce_no_flow_through(&mut body, &Motion::default(), &freestream, &[&empty], 0.0);

        let mut rates = Vec::new();
        induce_velocity(&body, &[&empty], &Kernel::Point, &tracers, &mut rates);
        let w = rates[0];
        transform_velocity(&body, &tracers, &mut rates).unwrap();

        let zeta = tracers.get(0).unwrap().zeta;
        let dt = 1e-7;
        let moved = body.to_physical(zeta + rates[0] * dt);
        let expected = physical_velocity(&body, zeta, w).unwrap();
        let actual = (moved - body.to_physical(zeta)) / dt;
        assert_relative_eq!(actual.re, expected.re, epsilon = 1e-5);
        assert_relative_eq!(actual.im, expected.im, epsilon = 1e-5);
    }

    #[test]
    fn circle_rate_is_relative_to_a_moving_body() {
        let map = Arc::new(PowerSeriesMap::circle(1.0).unwrap());
        let mut body = RigidBody::new(map, Pose::default(), vec![]).unwrap();
        let motion = Motion {
            c_dot: C64::new(1.0, 0.0),
            ..Motion::default()
        };
        let empty = VortexSet::new();
        enforce_no_flow_through(&mut body, &motion, &Freestream::default(), &[&empty], 0.0);
        let far: VortexSet = vec![Blob::tracer(C64::new(0.0, 1e4))].into_iter().collect();
        let mut rates = Vec::new();
        induce_velocity(&body, &[&empty], &Kernel::Point, &far, &mut rates);
        transform_velocity(&body, &far, &mut rates).unwrap();
        // Still fluid far away drifts backwards in the body frame.
        assert_relative_eq!(rates[0].re, -1.0, epsilon = 1e-6);
        assert_relative_eq!(rates[0].im, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn edges_are_degenerate_for_the_transform() {
        let body = section(0.0);
        let at_edge: VortexSet = vec![Blob::tracer(body.edge_prevertex(0))].into_iter().collect();
        let mut rates = vec![C64::default()];
        assert!(transform_velocity(&body, &at_edge, &mut rates).is_err());
    }
}
