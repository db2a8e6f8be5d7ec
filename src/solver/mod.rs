//! Unsteady solver: bound vorticity, induced velocities and edge shedding.

mod no_flow_through;
mod shedding;
mod velocity;

pub use no_flow_through::{enforce_no_flow_through, reflect, surface_conj_velocity};
pub use shedding::{
    suction_parameter, vorticity_flux, Candidate, SheddingModel, DEFAULT_SHED_FRACTION,
};
pub use velocity::{
    conj_velocity_at, induce_velocity, physical_velocity, self_induce_velocity,
    transform_velocity, VelocityBuffers,
};
