use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::models::GameComment;

/// Query string for `POST /api/users/:user_id/rate/:game_id`
#[derive(Debug, Deserialize)]
pub struct RateQuery {
    pub rating: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RatingResponse {
    pub user_id: String,
    pub game_id: String,
    pub rating: u8,
    pub replaced: bool,
    pub average_rating: f64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RemoveRatingResponse {
    pub game_id: String,
    pub average_rating: f64,
}

/// Request payload for posting a comment
#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CommentResponse {
    pub id: String,
    pub game_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(game_id: String, comment: GameComment) -> Self {
        Self {
            id: comment.id,
            game_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}
