//! # Particle Renderer
//!
//! Draws the simulation's particle buffer as screen-space points.

pub mod renderer;
pub mod style;

pub use renderer::*;
pub use style::*;
