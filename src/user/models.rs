use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repository::PlayWrite;

/// Idempotency keys remembered per play fact. Retries arrive close to the
/// original request, so only the most recent keys are kept.
pub const MAX_TRACKED_REQUESTS: usize = 64;

/// Stored user document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserModel {
    pub id: String, // UUID v4 as string
    pub username: String,
    pub email: String,
    pub played_game_ids: Vec<String>,
    pub played_games: Vec<UserPlay>, // Authoritative copy of the user's play facts
    pub rated_games: Vec<UserRating>,
    pub comments_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// User-side copy of a play fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPlay {
    pub game_id: String,
    pub minutes: u32,
    pub play_time_hours: u32,
    #[serde(default)]
    pub applied_requests: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRating {
    pub game_id: String,
    pub rating: u8,
}

impl UserModel {
    /// Creates a new user model with generated ID
    pub fn new(username: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            played_game_ids: Vec::new(),
            played_games: Vec::new(),
            rated_games: Vec::new(),
            comments_enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Cumulative minutes on a game, 0 when never played
    pub fn play_minutes(&self, game_id: &str) -> u32 {
        self.played_games
            .iter()
            .find(|p| p.game_id == game_id)
            .map(|p| p.minutes)
            .unwrap_or_default()
    }

    pub fn rating_for(&self, game_id: &str) -> Option<u8> {
        self.rated_games
            .iter()
            .find(|r| r.game_id == game_id)
            .map(|r| r.rating)
    }

    /// Adds minutes to the play fact unless `request_id` was already applied.
    pub fn record_play(&mut self, game_id: &str, request_id: &str, minutes: u32) -> PlayWrite {
        let existing = self.played_games.iter().position(|p| p.game_id == game_id);
        let play = match existing {
            Some(index) => &mut self.played_games[index],
            None => {
                self.played_games.push(UserPlay {
                    game_id: game_id.to_string(),
                    minutes: 0,
                    play_time_hours: 0,
                    applied_requests: Vec::new(),
                });
                if !self.played_game_ids.iter().any(|id| id == game_id) {
                    self.played_game_ids.push(game_id.to_string());
                }
                let last = self.played_games.len() - 1;
                &mut self.played_games[last]
            }
        };

        if play.applied_requests.iter().any(|r| r == request_id) {
            return PlayWrite::Duplicate {
                total_minutes: play.minutes,
            };
        }

        let Some(total) = play.minutes.checked_add(minutes) else {
            return PlayWrite::Overflow {
                total_minutes: play.minutes,
            };
        };
        play.minutes = total;
        play.play_time_hours = play.minutes / 60;
        play.applied_requests.push(request_id.to_string());
        if play.applied_requests.len() > MAX_TRACKED_REQUESTS {
            let overflow = play.applied_requests.len() - MAX_TRACKED_REQUESTS;
            play.applied_requests.drain(..overflow);
        }

        PlayWrite::Applied {
            total_minutes: play.minutes,
        }
    }

    /// Inserts or overwrites the rating for a game. Returns true when an
    /// existing rating was replaced.
    pub fn upsert_rating(&mut self, game_id: &str, rating: u8) -> bool {
        match self.rated_games.iter_mut().find(|r| r.game_id == game_id) {
            Some(existing) => {
                existing.rating = rating;
                true
            }
            None => {
                self.rated_games.push(UserRating {
                    game_id: game_id.to_string(),
                    rating,
                });
                false
            }
        }
    }

    pub fn remove_rating(&mut self, game_id: &str) -> bool {
        let before = self.rated_games.len();
        self.rated_games.retain(|r| r.game_id != game_id);
        self.rated_games.len() != before
    }
}
