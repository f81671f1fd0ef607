//! Default physical constants for the falling-particle simulation
//!
//! Units are normalized device coordinates per second; the visible region is [-1, 1]².

/// Integration step in seconds
pub const DT: f32 = 0.01;

/// Gravitational acceleration
pub const GRAVITY: [f32; 2] = [0.0, -9.8];

/// Height of the ground plane
pub const BOUNDARY_Y: f32 = -1.0;

/// Fraction of vertical speed kept after a bounce
pub const RESTITUTION: f32 = 0.8;

/// Default particle population
pub const PARTICLE_COUNT: u32 = 10_000;

/// Invocations per compute workgroup (must match `@workgroup_size` in the update shader)
pub const WORKGROUP_SIZE: u32 = 256;

/// Spawn rectangle, x range (half-open)
pub const SPAWN_X: (f32, f32) = (-1.0, 1.0);

/// Spawn rectangle, y range (half-open)
pub const SPAWN_Y: (f32, f32) = (0.0, 2.0);

/// Number of task groups needed to cover `count` particles.
pub const fn workgroup_count(count: u32) -> u32 {
    count.div_ceil(WORKGROUP_SIZE)
}
