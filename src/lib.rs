//! Pumpkin Collector - A falling-pumpkin clicker mini-game
//!
//! Core modules:
//! - `sim`: Session state machine (spawning, falling, collecting, timer)
//! - `rewards`: Final summary and the mint hand-off payload
//! - `platform`: Browser/native clock and seed sources
//! - `highscores` / `settings`: LocalStorage-backed player data
//! - `audio`: Web Audio sound effects (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod platform;
pub mod rewards;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use rewards::{Achievement, MintRequest, RewardError, SessionSummary};
pub use settings::Settings;

/// Game configuration constants
///
/// These are the defaults for [`sim::GameConfig`]; the loop reads the config,
/// never these directly.
pub mod consts {
    /// Session length in seconds
    pub const SESSION_SECONDS: u32 = 30;
    /// Driver cadence for `GameLoop::tick`
    pub const TICK_INTERVAL_MS: u32 = 50;
    /// Driver cadence for `GameLoop::advance_clock`
    pub const CLOCK_INTERVAL_MS: u32 = 1000;

    /// Spawn interval at level 0 (before acceleration)
    pub const BASE_SPAWN_INTERVAL_MS: f64 = 1000.0;
    /// Interval reduction per level
    pub const SPAWN_ACCELERATION_MS: f64 = 100.0;
    /// Floor for the spawn interval (one tick)
    pub const MIN_SPAWN_INTERVAL_MS: f64 = 50.0;

    /// Points per collected pumpkin
    pub const COLLECT_REWARD: u64 = 10;
    /// Collections per level
    pub const LEVEL_STEP: u32 = 10;

    /// Play area dimensions (pixels)
    pub const VIEWPORT_WIDTH: f32 = 600.0;
    pub const VIEWPORT_HEIGHT: f32 = 400.0;
    /// Horizontal inset for spawn positions
    pub const SPAWN_MARGIN_X: f32 = 30.0;
    /// Pumpkins spawn this far above the top edge
    pub const SPAWN_OFFSET_Y: f32 = 50.0;
    /// Pumpkins are dropped once this far below the bottom edge
    pub const DESPAWN_MARGIN: f32 = 100.0;

    /// Fall speed range (pixels per tick) before the level bonus
    pub const MIN_SPEED: f32 = 2.0;
    pub const MAX_SPEED: f32 = 4.0;
    /// Extra fall speed per level
    pub const LEVEL_SPEED_BONUS: f32 = 0.5;

    /// Cosmetic size range (pixels)
    pub const MIN_SIZE: f32 = 40.0;
    pub const MAX_SIZE: f32 = 60.0;

    /// Minimum final score before the reward collaborator is consulted
    pub const MIN_REWARD_SCORE: u64 = 100;
}

/// Level for a collected count: `floor(collected / step) + 1`
#[inline]
pub fn level_for(collected: u32, level_step: u32) -> u32 {
    collected / level_step.max(1) + 1
}
