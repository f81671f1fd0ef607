//! Physics parameters uploaded to the update shader

use bytemuck::{Pod, Zeroable};
use particle_physics::StepParams;

/// Uniform block for `shaders/update.wgsl` (32 bytes, 16-byte aligned size)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PhysicsParams {
    pub gravity: [f32; 2],
    pub dt: f32,
    pub boundary_y: f32,
    pub restitution: f32,
    /// Invocations at or beyond this index return without touching the buffer
    pub particle_count: u32,
    pub _padding: [u32; 2],
}

impl PhysicsParams {
    pub fn new(step: &StepParams, particle_count: u32) -> Self {
        Self {
            gravity: step.gravity.to_array(),
            dt: step.dt,
            boundary_y: step.boundary_y,
            restitution: step.restitution,
            particle_count,
            _padding: [0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_size_is_multiple_of_16() {
        assert_eq!(std::mem::size_of::<PhysicsParams>(), 32);
    }

    #[test]
    fn packs_step_params() {
        let params = PhysicsParams::new(&StepParams::default(), 300);
        assert_eq!(params.gravity, [0.0, -9.8]);
        assert_eq!(params.dt, 0.01);
        assert_eq!(params.particle_count, 300);
    }
}
