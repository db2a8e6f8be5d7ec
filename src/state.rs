//! Simulation state and the archived trajectory.
//!
//! - [`SystemState`] is the full mutable state at one instant
//! - [`Snapshot`]    is an independent physical-plane copy kept for output
//! - [`Trajectory`]  collects snapshots and the impulse history

use crate::body::{Pose, RigidBody};
use crate::elements::VortexSet;
use crate::freestream::Freestream;
use crate::C64;

#[derive(Debug, Clone)]
pub struct SystemState {
    pub t: f64,               // time
    pub body: RigidBody,      // body, pose and bound vorticity
    pub freestream: Freestream,
    pub vortices: VortexSet,  // shed blobs, circle plane
    pub tracers: VortexSet,   // passive markers, circle plane
}

impl SystemState {
    pub fn new(body: RigidBody, freestream: Freestream) -> Self {
        SystemState {
            t: 0.0,
            body,
            freestream,
            vortices: VortexSet::new(),
            tracers: VortexSet::new(),
        }
    }

    /// Overwrite with `other`, reusing this state's allocations.
    pub fn copy_from(&mut self, other: &SystemState) {
        self.t = other.t;
        self.body.copy_from(&other.body);
        self.freestream = other.freestream;
        self.vortices.copy_from(&other.vortices);
        self.tracers.copy_from(&other.tracers);
    }

    pub fn total_circulation(&self) -> f64 {
        self.body.bound_circulation() + self.vortices.circulation()
    }

    pub fn is_finite(&self) -> bool {
        let pose = self.body.pose();
        self.t.is_finite()
            && pose.centroid.re.is_finite()
            && pose.centroid.im.is_finite()
            && pose.angle.is_finite()
            && self.vortices.is_finite()
            && self.tracers.is_finite()
    }

    /// Physical-plane copy of the current elements.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            t: self.t,
            pose: self.body.pose(),
            vortices: self
                .vortices
                .iter()
                .map(|b| (self.body.to_physical(b.zeta), b.gamma))
                .collect(),
            tracers: self
                .tracers
                .iter()
                .map(|b| self.body.to_physical(b.zeta))
                .collect(),
        }
    }
}

/// Archived positions at one instant, physical plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub t: f64,
    pub pose: Pose,
    pub vortices: Vec<(C64, f64)>,
    pub tracers: Vec<C64>,
}

/// Append-only run archive.
#[derive(Debug, Clone, Default)]
pub struct Trajectory {
    snapshots: Vec<Snapshot>,
    times: Vec<f64>, // one per step plus the initial state
    impulse: Vec<C64>,
}

impl Trajectory {
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// Sample times of [`Trajectory::impulse`].
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn impulse(&self) -> &[C64] {
        &self.impulse
    }

    pub fn record_impulse(&mut self, t: f64, impulse: C64) {
        self.times.push(t);
        self.impulse.push(impulse);
    }

    pub fn record_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::Blob;
    use crate::map::JoukowskiMap;
    use std::sync::Arc;

    fn state() -> SystemState {
        let map = Arc::new(JoukowskiMap::flat_plate(2.0, 4).unwrap());
        let body = RigidBody::new(map, Pose::new(C64::new(1.0, 0.0), 0.0), vec![0]).unwrap();
        let mut state = SystemState::new(body, Freestream::new(1.0, 0.0));
        state.vortices.push(Blob::new(C64::new(2.0, 0.0), 0.5));
        state.tracers.push(Blob::tracer(C64::new(0.0, 3.0)));
        state
    }

    #[test]
    fn snapshot_is_physical_and_independent() {
        let mut state = state();
        let snapshot = state.snapshot();
        // z = c + (ζ + 1/ζ)/2 for a plate of chord 2.
        assert!((snapshot.vortices[0].0 - C64::new(2.25, 0.0)).norm() < 1e-12);
        assert_eq!(snapshot.vortices[0].1, 0.5);
        state.vortices.push(Blob::new(C64::new(0.0, -2.0), 1.0));
        assert_eq!(snapshot.vortices.len(), 1);
    }

    #[test]
    fn copy_from_reproduces_the_state() {
        let source = state();
        let mut target = SystemState::new(source.body.clone(), Freestream::default());
        target.copy_from(&source);
        assert_eq!(target.vortices, source.vortices);
        assert_eq!(target.tracers, source.tracers);
        assert_eq!(target.body.pose(), source.body.pose());
        assert_eq!(target.freestream, source.freestream);
    }

    #[test]
    fn trajectory_only_grows() {
        let state = state();
        let mut trajectory = Trajectory::default();
        trajectory.record_impulse(0.0, C64::new(0.0, -1.0));
        trajectory.record_snapshot(state.snapshot());
        trajectory.record_impulse(0.1, C64::new(0.2, -1.1));
        assert_eq!(trajectory.times(), &[0.0, 0.1]);
        assert_eq!(trajectory.impulse()[1], C64::new(0.2, -1.1));
        assert_eq!(trajectory.snapshots().len(), 1);
        assert_eq!(trajectory.last_snapshot(), Some(&state.snapshot()));
    }

    #[test]
    fn non_finite_positions_are_detected() {
        let mut state = state();
        assert!(state.is_finite());
        state.vortices.push(Blob::new(C64::new(f64::NAN, 0.0), 0.1));
        assert!(!state.is_finite());
    }
}
