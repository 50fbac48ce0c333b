//! Session tuning
//!
//! Every rate and threshold the loop uses lives here. Bad values are a
//! programmer error and are rejected when the config is built, never at tick
//! time.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Rejected configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("viewport must be finite and positive, got {width}x{height}")]
    InvalidViewport { width: f32, height: f32 },
    #[error("viewport width {width} leaves no room inside spawn margin {margin}")]
    ViewportTooNarrow { width: f32, margin: f32 },
    #[error("session length must be at least one second")]
    EmptySession,
    #[error("spawn interval must be positive (base {base_ms} ms, floor {min_ms} ms)")]
    InvalidSpawnInterval { base_ms: f64, min_ms: f64 },
    #[error("invalid {what} range [{min}, {max}]")]
    InvalidRange {
        what: &'static str,
        min: f32,
        max: f32,
    },
    #[error("level step must be at least one collection")]
    ZeroLevelStep,
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tunables for one [`GameLoop`](super::GameLoop)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    pub session_seconds: u32,
    pub base_spawn_interval_ms: f64,
    pub spawn_acceleration_ms: f64,
    pub min_spawn_interval_ms: f64,
    pub collect_reward: u64,
    pub level_step: u32,
    pub spawn_margin_x: f32,
    pub spawn_offset_y: f32,
    pub despawn_margin: f32,
    pub min_speed: f32,
    pub max_speed: f32,
    pub level_speed_bonus: f32,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            session_seconds: SESSION_SECONDS,
            base_spawn_interval_ms: BASE_SPAWN_INTERVAL_MS,
            spawn_acceleration_ms: SPAWN_ACCELERATION_MS,
            min_spawn_interval_ms: MIN_SPAWN_INTERVAL_MS,
            collect_reward: COLLECT_REWARD,
            level_step: LEVEL_STEP,
            spawn_margin_x: SPAWN_MARGIN_X,
            spawn_offset_y: SPAWN_OFFSET_Y,
            despawn_margin: DESPAWN_MARGIN,
            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            level_speed_bonus: LEVEL_SPEED_BONUS,
            min_size: MIN_SIZE,
            max_size: MAX_SIZE,
        }
    }
}

impl GameConfig {
    /// Default tuning with a custom play area
    pub fn with_viewport(width: f32, height: f32) -> Result<Self, ConfigError> {
        let config = Self {
            width,
            height,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a (possibly partial) JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let viewport_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !viewport_ok {
            return Err(ConfigError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.spawn_margin_x >= 0.0 && self.width > 2.0 * self.spawn_margin_x) {
            return Err(ConfigError::ViewportTooNarrow {
                width: self.width,
                margin: self.spawn_margin_x,
            });
        }
        if self.session_seconds == 0 {
            return Err(ConfigError::EmptySession);
        }
        if !(self.base_spawn_interval_ms > 0.0 && self.min_spawn_interval_ms > 0.0) {
            return Err(ConfigError::InvalidSpawnInterval {
                base_ms: self.base_spawn_interval_ms,
                min_ms: self.min_spawn_interval_ms,
            });
        }
        if !(self.min_speed > 0.0 && self.max_speed >= self.min_speed) {
            return Err(ConfigError::InvalidRange {
                what: "speed",
                min: self.min_speed,
                max: self.max_speed,
            });
        }
        if !(self.min_size > 0.0 && self.max_size >= self.min_size) {
            return Err(ConfigError::InvalidRange {
                what: "size",
                min: self.min_size,
                max: self.max_size,
            });
        }
        if self.level_step == 0 {
            return Err(ConfigError::ZeroLevelStep);
        }
        Ok(())
    }

    /// Milliseconds that must pass between spawns at `level`
    pub fn spawn_interval_ms(&self, level: u32) -> f64 {
        (self.base_spawn_interval_ms - level as f64 * self.spawn_acceleration_ms)
            .max(self.min_spawn_interval_ms)
    }

    /// Fall speed range at `level`
    pub fn speed_range(&self, level: u32) -> (f32, f32) {
        let bonus = level as f32 * self.level_speed_bonus;
        (self.min_speed + bonus, self.max_speed + bonus)
    }

    /// `y` at which a pumpkin leaves play
    pub fn despawn_y(&self) -> f32 {
        self.height + self.despawn_margin
    }
}
