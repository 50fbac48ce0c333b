//! Session simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - No I/O, no timers; the driver passes timestamps in
//! - Injected RNG only
//! - No rendering or platform dependencies

pub mod config;
pub mod game_loop;
pub mod random;
pub mod state;

pub use config::{ConfigError, GameConfig};
pub use game_loop::GameLoop;
pub use random::{RandomSource, ScriptedRandom, SeededRandom};
pub use state::{
    EndReason, GameEvent, GamePhase, Pumpkin, PumpkinId, PumpkinVariant, SessionState,
};
