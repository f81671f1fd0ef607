//! User config, read once at startup.
//!
//! Looked up at `$PARTICLE_RAIN_CONFIG`, falling back to `particle-rain.toml` in the working
//! directory. Every key is optional.

use anyhow::{ensure, Context as _, Result};
use particle_renderer::PointStyle;
use particle_simulation::SimulationConfig;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
const CONFIG_ENV: &str = "PARTICLE_RAIN_CONFIG";

/// Config file looked for in the working directory
const CONFIG_FILE: &str = "particle-rain.toml";

#[derive(serde::Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub display: DisplayConfig,
}

/// Presentation-only options; none of these affect the simulation.
///
/// Colors default to the Catppuccin Mocha `base` background with `text` points rather than
/// plain white on black. Set both colors to get the classic look.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    /// Logical window size
    pub window_size: [u32; 2],
    /// Edge length of a drawn particle in pixels
    pub point_size: f32,
    /// sRGB, 0-1
    pub background_color: [f32; 3],
    /// sRGB, 0-1
    pub point_color: [f32; 3],
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let mocha = &catppuccin::PALETTE.mocha.colors;
        Self {
            window_size: [800, 800],
            point_size: 2.0,
            background_color: rgb(&mocha.base),
            point_color: rgb(&mocha.text),
        }
    }
}

fn rgb(color: &catppuccin::Color) -> [f32; 3] {
    [color.rgb.r, color.rgb.g, color.rgb.b].map(|c| c as f32 / 255.0)
}

impl DisplayConfig {
    pub fn point_style(&self) -> PointStyle {
        PointStyle {
            point_size: self.point_size,
            point_color: self.point_color,
            background_color: self.background_color,
        }
    }
}

impl Config {
    /// Load from the first config file found, or use defaults when there is none.
    pub fn load() -> Result<Self> {
        let (path, explicit) = match std::env::var_os(CONFIG_ENV) {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(CONFIG_FILE), false),
        };

        let config = if explicit || path.exists() {
            log::info!("Loading config from {}", path.display());
            Self::from_path(&path)?
        } else {
            log::info!("No {CONFIG_FILE} found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        Ok(toml::from_str::<Self>(data)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;

        let [width, height] = self.display.window_size;
        ensure!(
            width > 0 && height > 0,
            "window_size must be non-zero, got {width}x{height}"
        );
        ensure!(
            self.display.point_size.is_finite() && self.display.point_size > 0.0,
            "point_size must be positive, got {}",
            self.display.point_size
        );
        for (name, color) in [
            ("background_color", self.display.background_color),
            ("point_color", self.display.point_color),
        ] {
            ensure!(
                color.iter().all(|c| (0.0..=1.0).contains(c)),
                "{name} components must lie in [0, 1], got {color:?}"
            );
        }
        Ok(())
    }
}
