//! # Particle Simulation
//!
//! Shared particle storage, the parallel update kernels (GPU compute shader and a rayon CPU
//! fallback), and the frame scheduler that sequences update, barrier, render and present.

pub mod buffer;
pub mod config;
pub mod error;
pub mod host;
pub mod params;
pub mod scheduler;
pub mod simulation;
pub mod spawn;

pub use buffer::*;
pub use config::*;
pub use error::*;
pub use host::*;
pub use params::*;
pub use scheduler::*;
pub use simulation::*;
pub use spawn::*;
