//! Explicit Euler step with a ground-plane bounce
//!
//! NOTE: `shaders/update.wgsl` in `particle-simulation` performs the same arithmetic on the GPU.
//! Keep the two in sync.

use crate::constants::{BOUNDARY_Y, DT, GRAVITY, RESTITUTION};
use crate::particle::Particle;
use glam::Vec2;

/// Parameters of a single integration step
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub gravity: Vec2,
    pub boundary_y: f32,
    pub restitution: f32,
}

impl Default for StepParams {
    fn default() -> Self {
        Self {
            dt: DT,
            gravity: Vec2::from_array(GRAVITY),
            boundary_y: BOUNDARY_Y,
            restitution: RESTITUTION,
        }
    }
}

/// Advance one particle by `params.dt`.
///
/// Velocity is integrated first, then position with the new velocity. A particle that ends
/// below the ground plane is clamped onto it and its vertical velocity is reflected and
/// scaled by the restitution.
#[inline]
pub fn step(particle: &mut Particle, params: &StepParams) {
    let velocity = particle.velocity() + params.gravity * params.dt;
    let mut position = particle.position() + velocity * params.dt;
    let mut velocity = velocity;

    if position.y < params.boundary_y {
        position.y = params.boundary_y;
        velocity.y *= -params.restitution;
    }

    particle.position = position.to_array();
    particle.velocity = velocity.to_array();
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn free_fall_from_rest() {
        let mut p = Particle::at_rest(Vec2::new(0.0, 1.0));
        step(&mut p, &StepParams::default());

        assert_close(p.velocity[0], 0.0);
        assert_close(p.velocity[1], -0.098);
        assert_close(p.position[0], 0.0);
        assert_close(p.position[1], 0.99902);
    }

    #[test]
    fn bounce_clamps_and_reflects() {
        let mut p = Particle::new(Vec2::new(0.0, -0.995), Vec2::new(0.0, -1.0));
        step(&mut p, &StepParams::default());

        assert_eq!(p.position[1], -1.0);
        assert_close(p.velocity[1], 0.8784);
    }

    #[test]
    fn horizontal_motion_is_untouched_by_bounce() {
        let mut p = Particle::new(Vec2::new(0.25, -0.999), Vec2::new(0.5, -2.0));
        step(&mut p, &StepParams::default());

        assert_close(p.velocity[0], 0.5);
        assert_close(p.position[0], 0.255);
        assert_eq!(p.position[1], BOUNDARY_Y);
    }

    #[test]
    fn resting_on_floor_keeps_bouncing_above_it() {
        let params = StepParams::default();
        let mut p = Particle::at_rest(Vec2::new(0.0, params.boundary_y));
        for _ in 0..1_000 {
            step(&mut p, &params);
            assert!(p.position[1] >= params.boundary_y);
        }
    }

    #[test]
    fn custom_gravity_and_restitution() {
        let params = StepParams {
            dt: 0.1,
            gravity: Vec2::new(1.0, -10.0),
            boundary_y: 0.0,
            restitution: 0.5,
        };
        let mut p = Particle::at_rest(Vec2::new(0.0, 0.05));
        step(&mut p, &params);

        // v = (0.1, -1.0), raw y = 0.05 - 0.1 = -0.05 -> clamped
        assert_close(p.velocity[0], 0.1);
        assert_close(p.velocity[1], 0.5);
        assert_close(p.position[0], 0.01);
        assert_eq!(p.position[1], 0.0);
    }
}
