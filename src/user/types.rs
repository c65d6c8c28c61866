use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{UserModel, UserPlay, UserRating};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

/// Optional filter for `GET /api/users`
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentsFlagRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PlayedGameResponse {
    pub game_id: String,
    pub minutes: u32,
    pub play_time_hours: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RatedGameResponse {
    pub game_id: String,
    pub rating: u8,
}

/// Public view of a user. Idempotency bookkeeping stays internal.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub played_game_ids: Vec<String>,
    pub played_games: Vec<PlayedGameResponse>,
    pub rated_games: Vec<RatedGameResponse>,
    pub comments_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            played_game_ids: user.played_game_ids,
            played_games: user.played_games.into_iter().map(Into::into).collect(),
            rated_games: user.rated_games.into_iter().map(Into::into).collect(),
            comments_enabled: user.comments_enabled,
            created_at: user.created_at,
        }
    }
}

impl From<UserPlay> for PlayedGameResponse {
    fn from(play: UserPlay) -> Self {
        Self {
            game_id: play.game_id,
            minutes: play.minutes,
            play_time_hours: play.play_time_hours,
        }
    }
}

impl From<UserRating> for RatedGameResponse {
    fn from(rating: UserRating) -> Self {
        Self {
            game_id: rating.game_id,
            rating: rating.rating,
        }
    }
}
