//! End-of-session hand-off
//!
//! The loop only produces a [`SessionSummary`]. Tier lookup, mint price and
//! transaction encoding belong to the external mint service; this module just
//! gates on the minimum score and builds the request body it expects.

use serde::{Deserialize, Serialize};

use crate::consts::MIN_REWARD_SCORE;

/// Final numbers of a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub pumpkins_collected: u32,
    pub level: u32,
}

impl SessionSummary {
    /// Whether the mint service is worth asking at all
    pub fn is_reward_eligible(&self) -> bool {
        self.score >= MIN_REWARD_SCORE
    }

    pub fn achievement(&self) -> Achievement {
        Achievement::for_score(self.score)
    }
}

/// Game over title. Cosmetic only, unrelated to the on-chain tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    Beginner,
    Collector,
    Hunter,
    Master,
}

impl Achievement {
    pub fn for_score(score: u64) -> Self {
        match score {
            500.. => Achievement::Master,
            200.. => Achievement::Hunter,
            100.. => Achievement::Collector,
            _ => Achievement::Beginner,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::Beginner => "Pumpkin Beginner!",
            Achievement::Collector => "Pumpkin Collector!",
            Achievement::Hunter => "Pumpkin Hunter!",
            Achievement::Master => "Pumpkin Master!",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewardError {
    #[error("score too low for minting: {current} < {minimum}")]
    ScoreTooLow { minimum: u64, current: u64 },
    #[error("player address is required")]
    MissingPlayerAddress,
    #[error("game session id is required")]
    MissingSessionId,
}

/// Body for the mint service's prepare-mint call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintRequest {
    pub player_address: String,
    pub game_session_id: String,
    pub score: u64,
    pub level: u32,
    pub pumpkins_collected: u32,
}

impl MintRequest {
    pub fn new(
        summary: &SessionSummary,
        player_address: impl Into<String>,
        game_session_id: impl Into<String>,
    ) -> Result<Self, RewardError> {
        let player_address = player_address.into();
        let game_session_id = game_session_id.into();
        if player_address.trim().is_empty() {
            return Err(RewardError::MissingPlayerAddress);
        }
        if game_session_id.trim().is_empty() {
            return Err(RewardError::MissingSessionId);
        }
        if !summary.is_reward_eligible() {
            return Err(RewardError::ScoreTooLow {
                minimum: MIN_REWARD_SCORE,
                current: summary.score,
            });
        }
        Ok(Self {
            player_address,
            game_session_id,
            score: summary.score,
            level: summary.level,
            pumpkins_collected: summary.pumpkins_collected,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
