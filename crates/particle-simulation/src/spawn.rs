//! Initial particle placement

use glam::Vec2;
use particle_physics::{Particle, SPAWN_X, SPAWN_Y};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A particle at rest, uniformly placed in the spawn rectangle.
pub fn random_particle<R: Rng + ?Sized>(rng: &mut R) -> Particle {
    let x = rng.random_range(SPAWN_X.0..SPAWN_X.1);
    let y = rng.random_range(SPAWN_Y.0..SPAWN_Y.1);
    Particle::at_rest(Vec2::new(x, y))
}

/// Scatter `count` particles at rest over the spawn rectangle.
pub fn scatter<R: Rng + ?Sized>(rng: &mut R, count: u32) -> Vec<Particle> {
    (0..count).map(|_| random_particle(rng)).collect()
}

/// Deterministic generator when seeded, OS entropy otherwise.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
