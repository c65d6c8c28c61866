use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{GameComment, GameModel, GamePlay, GameRating};

fn default_feedback_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub name: String,
    pub genre: String,
    #[serde(default = "default_feedback_enabled")]
    pub is_feedback_enabled: bool,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackFlagRequest {
    pub enabled: bool,
}

/// Full view of a game with its fact lists and cached aggregates
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GameResponse {
    pub id: String,
    pub name: String,
    pub genre: String,
    pub is_feedback_enabled: bool,
    pub average_rating: f64,
    pub total_play_time: u64,
    pub total_play_time_hours: u64,
    pub ratings: Vec<GameRating>,
    pub comments: Vec<GameComment>,
    pub played_users: Vec<GamePlay>,
    pub created_at: DateTime<Utc>,
}

impl From<GameModel> for GameResponse {
    fn from(game: GameModel) -> Self {
        Self {
            id: game.id,
            name: game.name,
            genre: game.genre,
            is_feedback_enabled: game.is_feedback_enabled,
            average_rating: game.average_rating,
            total_play_time: game.total_play_time,
            total_play_time_hours: game.total_play_time / 60,
            ratings: game.ratings,
            comments: game.comments,
            played_users: game.played_users,
            created_at: game.created_at,
        }
    }
}
