use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::rating::{calculate_rating, RatingLabel};
use crate::score::{calculate_score, Difficulty};

/// How much song time one round tick consumes
pub const TICK_DURATION_MS: i64 = 1000;

/// Observable state of one round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRound {
    pub remaining_duration_ms: i64,
    pub score: u32,
    pub current_sign: String,
    pub current_lyric_fragment: String,
    pub current_prompt: String,
    pub current_rating: Option<RatingLabel>,
    /// Id of the latest judgment; bumps even when the label repeats
    pub rating_event: u64,
}

/// Everything that can happen to a round.
///
/// Actions read back from a log may carry tags this build does not know;
/// those land in `Unrecognized` and leave the state untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameAction {
    StartRound {
        total_duration_ms: i64,
    },
    Tick,
    BeginEntry {
        sign: String,
        lyric_fragment: String,
        prompt: String,
    },
    Judge {
        new_position: f64,
        target_position: f64,
        device: DeviceClass,
        event_id: u64,
    },
    AwardScore {
        rating: RatingLabel,
        #[serde(default)]
        difficulty: Difficulty,
    },
    #[serde(other)]
    Unrecognized,
}

pub fn reduce(state: &GameRound, action: &GameAction) -> GameRound {
    match action {
        GameAction::StartRound { total_duration_ms } => GameRound {
            remaining_duration_ms: *total_duration_ms,
            score: 0,
            ..state.clone()
        },
        GameAction::Tick => GameRound {
            remaining_duration_ms: state.remaining_duration_ms - TICK_DURATION_MS,
            ..state.clone()
        },
        GameAction::BeginEntry {
            sign,
            lyric_fragment,
            prompt,
        } => GameRound {
            current_sign: sign.clone(),
            current_lyric_fragment: lyric_fragment.clone(),
            current_prompt: prompt.clone(),
            ..state.clone()
        },
        GameAction::Judge {
            new_position,
            target_position,
            device,
            event_id,
        } => GameRound {
            current_rating: Some(calculate_rating(*new_position, *target_position, *device)),
            rating_event: *event_id,
            ..state.clone()
        },
        GameAction::AwardScore { rating, difficulty } => GameRound {
            score: state.score + calculate_score(*rating, *difficulty),
            ..state.clone()
        },
        GameAction::Unrecognized => state.clone(),
    }
}
