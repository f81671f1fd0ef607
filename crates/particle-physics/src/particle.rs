//! Particle state shared between the CPU and the GPU

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// GPU-compatible particle structure
///
/// Layout matches the WGSL `struct Particle { position: vec2<f32>, velocity: vec2<f32> }`
/// (16 bytes, array stride 16).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position in normalized device coordinates
    pub position: [f32; 2],
    /// Velocity in units per second
    pub velocity: [f32; 2],
}

impl Particle {
    /// Create a particle at rest
    pub fn at_rest(position: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: [0.0; 2],
        }
    }

    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl_stride() {
        assert_eq!(std::mem::size_of::<Particle>(), 16);
        assert_eq!(std::mem::align_of::<Particle>(), 4);
    }

    #[test]
    fn casts_to_bytes_in_field_order() {
        let particle = Particle::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&particle));
        assert_eq!(floats, &[1.0, 2.0, 3.0, 4.0]);
    }
}
