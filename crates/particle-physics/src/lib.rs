//! # Particle Physics
//!
//! Point particles falling under constant gravity onto a ground plane.
//! The per-particle step here is the reference that the GPU compute shader mirrors.

pub mod constants;
pub mod particle;
pub mod step;

pub use constants::*;
pub use particle::*;
pub use step::*;
