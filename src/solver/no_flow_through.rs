//! Bound vorticity that makes the body impermeable.

use tracing::trace;

use crate::body::RigidBody;
use crate::elements::{Blob, Kernel, VortexSet};
use crate::freestream::Freestream;
use crate::map::Laurent;
use crate::motion::Motion;
use crate::C64;

/// Reflection of ζ in the unit circle.
pub fn reflect(zeta: C64) -> C64 {
    zeta / zeta.norm_sqr()
}

/// Rebuild the body's bound vorticity for the current pose, `motion`, the
/// freestream and every free blob in `sources`. Afterwards the flow has no
/// normal velocity relative to the body anywhere on |ζ| = 1.
pub fn enforce_no_flow_through(
    body: &mut RigidBody,
    motion: &Motion,
    freestream: &Freestream,
    sources: &[&VortexSet],
    t: f64,
) {
    let angle = body.pose().angle;
    let net = body.circulation();
    let leading = body.map().laurent().leading;

    let mut motion_terms = std::mem::take(&mut body.bound.motion);
    motion_coefficients(body.map().laurent(), motion, angle, &mut motion_terms);

    let bound = &mut body.bound;
    bound.motion = motion_terms;
    bound.images.clear();
    for blob in sources.iter().flat_map(|set| set.iter()) {
        if blob.gamma != 0.0 {
            bound.images.push(Blob::new(reflect(blob.zeta), -blob.gamma));
        }
    }
    bound.center = net;
    bound.leading = leading;
    bound.stream = freestream.body_frame(angle);
    bound.body_motion = *motion;

    trace!(
        t,
        images = bound.images.len(),
        bound_circulation = bound.circulation(),
        "enforced no-flow-through"
    );
}

/// Coefficients bₙ of the potential Σ bₙ ζ⁻ⁿ generated by rigid motion.
///
/// Translation with body-frame velocity U contributes −U c̄₁/ζ + Ū Σ c₋ₙ ζ⁻ⁿ.
/// Rotation contributes −iα̇ d₋ₙ with d₋ₙ = Σₚ c_{p−n} c̄ₚ, the negative-power
/// coefficients of |z|² on the circle.
fn motion_coefficients(laurent: &Laurent, motion: &Motion, angle: f64, out: &mut Vec<C64>) {
    let lowest = laurent.lowest_power();
    let order = (1 - lowest) as usize;
    out.clear();
    out.resize(order, C64::default());

    let velocity = motion.c_dot * C64::from_polar(1.0, -angle);
    out[0] -= velocity * laurent.leading.conj();
    for (n, b) in (1..=order as i64).zip(out.iter_mut()) {
        *b += velocity.conj() * laurent.coefficient(-n);
    }

    if motion.alpha_dot != 0.0 {
        let spin = C64::new(0.0, -motion.alpha_dot);
        for (n, b) in (1..=order as i64).zip(out.iter_mut()) {
            let d: C64 = ((lowest + n)..=1)
                .map(|p| laurent.coefficient(p - n) * laurent.coefficient(p).conj())
                .sum();
            *b += spin * d;
        }
    }
}

/// dF/dζ on or near the surface: bound system plus free blobs, all with the
/// singular kernel.
pub fn surface_conj_velocity(body: &RigidBody, sources: &[&VortexSet], zeta: C64) -> C64 {
    let kernel = Kernel::Point;
    let mut w = body.bound.conj_velocity(zeta, &kernel);
    for blob in sources.iter().flat_map(|set| set.iter()) {
        if blob.gamma != 0.0 {
            w += kernel.conj_velocity(zeta, blob.zeta) * blob.gamma;
        }
    }
    w
}
