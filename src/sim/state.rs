//! Session state and falling pumpkin types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::rewards::SessionSummary;

/// Lifecycle of a [`GameLoop`](super::GameLoop)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Constructed, never started
    Idle,
    /// Session in progress
    Running,
    /// Timer ran out or stop was called
    Terminated,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    TimeUp,
    Stopped,
}

/// Counters the HUD shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    pub collected: u32,
    pub remaining_seconds: u32,
    /// Always `level_for(collected, level_step)`
    pub level: u32,
    pub running: bool,
}

impl SessionState {
    /// Not-yet-started state for a session of `session_seconds`
    pub fn idle(session_seconds: u32) -> Self {
        Self {
            score: 0,
            collected: 0,
            remaining_seconds: session_seconds,
            level: 1,
            running: false,
        }
    }

    /// Fresh state at `start()`
    pub fn fresh(session_seconds: u32) -> Self {
        Self {
            running: true,
            ..Self::idle(session_seconds)
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            score: self.score,
            pumpkins_collected: self.collected,
            level: self.level,
        }
    }
}

/// Pumpkin identifier, unique across sessions of one loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PumpkinId {
    pub session: u32,
    pub seq: u32,
}

impl std::fmt::Display for PumpkinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.session, self.seq)
    }
}

impl std::str::FromStr for PumpkinId {
    type Err = std::num::ParseIntError;

    /// Parses the `session-seq` form written by `Display`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (session, seq) = s.split_once('-').unwrap_or((s, ""));
        Ok(Self {
            session: session.parse()?,
            seq: seq.parse()?,
        })
    }
}

/// Cosmetic flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PumpkinVariant {
    JackOLantern,
    Orange,
    Heart,
    Brown,
}

impl PumpkinVariant {
    pub const ALL: [PumpkinVariant; 4] = [
        PumpkinVariant::JackOLantern,
        PumpkinVariant::Orange,
        PumpkinVariant::Heart,
        PumpkinVariant::Brown,
    ];

    /// Pick a variant from a uniform draw in `[0, 1)`
    pub fn from_unit(r: f32) -> Self {
        let idx = (r * Self::ALL.len() as f32) as usize;
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }

    /// Glyph the DOM renderer shows
    pub fn glyph(&self) -> &'static str {
        match self {
            PumpkinVariant::JackOLantern => "\u{1F383}",
            PumpkinVariant::Orange => "\u{1F7E0}",
            PumpkinVariant::Heart => "\u{1F9E1}",
            PumpkinVariant::Brown => "\u{1F7E4}",
        }
    }
}

/// A falling pumpkin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pumpkin {
    pub id: PumpkinId,
    /// Top-left in play area pixels; `x` never changes after spawn
    pub pos: Vec2,
    /// Pixels per tick
    pub speed: f32,
    /// Font size in pixels (cosmetic)
    pub size: f32,
    pub variant: PumpkinVariant,
}

impl Pumpkin {
    /// Move down by one tick
    #[inline]
    pub fn fall(&mut self) {
        self.pos.y += self.speed;
    }
}

/// Notifications for the driver, drained after each call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started {
        session: u32,
    },
    Spawned {
        id: PumpkinId,
    },
    Collected {
        id: PumpkinId,
        score: u64,
        collected: u32,
        level: u32,
    },
    LevelUp {
        level: u32,
    },
    /// Fell out of the play area uncollected
    Despawned {
        id: PumpkinId,
    },
    Ended {
        summary: SessionSummary,
        reason: EndReason,
    },
}
