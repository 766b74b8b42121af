//! World configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CollisionError, Result};

/// Movement shorter than this is treated as stationary by the swept test.
pub const MIN_MOVEMENT_THRESHOLD: f32 = 0.001;
/// Sweep step length as a fraction of the moving box's smaller extent.
pub const SWEPT_STEP_FACTOR: f32 = 0.25;
pub const MIN_SWEPT_STEPS: u32 = 3;
pub const MAX_SWEPT_STEPS: u32 = 50;
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Tunables for the grid and the swept narrowphase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid cell size in world units. Fixed for the world's lifetime.
    pub cell_size: f32,
    pub min_movement_threshold: f32,
    pub swept_step_factor: f32,
    pub min_swept_steps: u32,
    pub max_swept_steps: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            min_movement_threshold: MIN_MOVEMENT_THRESHOLD,
            swept_step_factor: SWEPT_STEP_FACTOR,
            min_swept_steps: MIN_SWEPT_STEPS,
            max_swept_steps: MAX_SWEPT_STEPS,
        }
    }
}

impl WorldConfig {
    pub fn with_cell_size(cell_size: f32) -> Self {
        Self { cell_size, ..Default::default() }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(CollisionError::InvalidCellSize(self.cell_size));
        }
        if !(self.swept_step_factor > 0.0) {
            return Err(CollisionError::InvalidConfig(format!(
                "swept_step_factor must be positive, got {}",
                self.swept_step_factor
            )));
        }
        if !(self.min_movement_threshold >= 0.0) {
            return Err(CollisionError::InvalidConfig(format!(
                "min_movement_threshold must be non-negative, got {}",
                self.min_movement_threshold
            )));
        }
        if self.min_swept_steps == 0 || self.min_swept_steps > self.max_swept_steps {
            return Err(CollisionError::InvalidConfig(format!(
                "swept step range [{}, {}] is empty or starts at zero",
                self.min_swept_steps, self.max_swept_steps
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document; missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: WorldConfig = toml::from_str(s).map_err(|e| CollisionError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CollisionError::Config(e.to_string()))
    }
}
