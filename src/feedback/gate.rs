use serde::Serialize;

use crate::game::models::GameModel;

/// Minutes a user must have accumulated on a game before rating or commenting
pub const FEEDBACK_MIN_MINUTES: u32 = 60;

/// Why the feedback gate refused a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GateDenial {
    FeedbackDisabled,
    InsufficientPlaytime { minutes: u32, required: u32 },
}

impl std::fmt::Display for GateDenial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDenial::FeedbackDisabled => write!(f, "Feedback is disabled for this game"),
            GateDenial::InsufficientPlaytime { minutes, required } => write!(
                f,
                "At least {} minutes of playtime required, {} recorded",
                required, minutes
            ),
        }
    }
}

/// Eligibility policy for comments and ratings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackPolicy {
    min_minutes: u32,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self::new(FEEDBACK_MIN_MINUTES)
    }
}

impl FeedbackPolicy {
    pub fn new(min_minutes: u32) -> Self {
        Self { min_minutes }
    }

    pub fn min_minutes(&self) -> u32 {
        self.min_minutes
    }

    /// Checks the game's feedback flag and the user's game-side minutes
    pub fn check(&self, game: &GameModel, user_id: &str) -> Result<(), GateDenial> {
        if !game.is_feedback_enabled {
            return Err(GateDenial::FeedbackDisabled);
        }

        let minutes = game.play_minutes(user_id);
        if minutes < self.min_minutes {
            return Err(GateDenial::InsufficientPlaytime {
                minutes,
                required: self.min_minutes,
            });
        }

        Ok(())
    }

    pub fn can_give_feedback(&self, game: &GameModel, user_id: &str) -> bool {
        self.check(game, user_id).is_ok()
    }
}
