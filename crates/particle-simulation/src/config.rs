//! Simulation options, read once at startup

use crate::SimulationError;
use glam::Vec2;
use particle_physics::{StepParams, BOUNDARY_Y, DT, GRAVITY, PARTICLE_COUNT, RESTITUTION};

/// Where the per-particle update runs.
#[derive(serde::Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// WGSL compute shader over the shared storage buffer
    #[default]
    Gpu,
    /// Rayon thread pool over host memory
    Cpu,
}

#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Buffer capacity and number of parallel tasks
    pub particle_count: u32,
    /// Integration step in seconds
    pub timestep: f32,
    pub gravity: [f32; 2],
    /// Height of the collision plane
    pub boundary_y: f32,
    /// Vertical velocity scale on bounce
    pub restitution: f32,
    /// Seed for the initial scatter. Random when absent.
    pub seed: Option<u64>,
    pub backend: Backend,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            timestep: DT,
            gravity: GRAVITY,
            boundary_y: BOUNDARY_Y,
            restitution: RESTITUTION,
            seed: None,
            backend: Backend::default(),
        }
    }
}

impl SimulationConfig {
    /// Reject configurations the update cannot be dispatched with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.particle_count == 0 {
            return Err(SimulationError::Dispatch(
                "particle_count must be at least 1".into(),
            ));
        }
        if !(self.timestep.is_finite() && self.timestep > 0.0) {
            return Err(SimulationError::Dispatch(format!(
                "timestep must be positive and finite, got {}",
                self.timestep
            )));
        }
        if !self.gravity.iter().all(|g| g.is_finite()) || !self.boundary_y.is_finite() {
            return Err(SimulationError::Dispatch(
                "gravity and boundary_y must be finite".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(SimulationError::Dispatch(format!(
                "restitution must lie in [0, 1], got {}",
                self.restitution
            )));
        }
        Ok(())
    }

    pub fn step_params(&self) -> StepParams {
        StepParams {
            dt: self.timestep,
            gravity: Vec2::from_array(self.gravity),
            boundary_y: self.boundary_y,
            restitution: self.restitution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.step_params(), StepParams::default());
    }

    #[test]
    fn zero_particles_cannot_dispatch() {
        let config = SimulationConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::Dispatch(_))
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        for config in [
            SimulationConfig {
                timestep: 0.0,
                ..Default::default()
            },
            SimulationConfig {
                timestep: f32::NAN,
                ..Default::default()
            },
            SimulationConfig {
                restitution: 1.5,
                ..Default::default()
            },
            SimulationConfig {
                gravity: [0.0, f32::INFINITY],
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            particle_count = 42
            backend = "cpu"
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.particle_count, 42);
        assert_eq!(config.backend, Backend::Cpu);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.timestep, DT);
        assert_eq!(config.restitution, RESTITUTION);
    }
}
