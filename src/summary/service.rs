use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::feedback::round2;
use crate::game::models::GameModel;
use crate::game::repository::GameRepository;
use crate::shared::AppError;
use crate::user::models::UserModel;
use crate::user::repository::UserRepository;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MostPlayedGame {
    pub game_id: String,
    pub name: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSummary {
    pub game_id: String,
    pub game_name: String,
    pub content: String,
}

/// Read-only projection of a user's activity across games
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    pub username: String,
    pub average_rating: f64,
    pub total_play_time: u64,
    pub total_play_time_hours: u64,
    pub most_played_game: Option<MostPlayedGame>,
    pub comments: Vec<CommentSummary>,
}

/// Folds the user's play facts against the matching game documents.
///
/// Minutes take the larger of the two copies so a lagging game copy does not
/// under-report. Ratings and comments come from the game side. Games missing
/// from `games` are skipped.
pub fn project(user: &UserModel, games: &[GameModel]) -> UserSummary {
    let mut total_play_time: u64 = 0;
    let mut most_played: Option<MostPlayedGame> = None;
    let mut scores = Vec::new();
    let mut comments = Vec::new();

    for play in &user.played_games {
        let Some(game) = games.iter().find(|g| g.id == play.game_id) else {
            continue;
        };

        let minutes = play.minutes.max(game.play_minutes(&user.id));
        total_play_time += u64::from(minutes);

        if most_played.as_ref().map_or(true, |m| minutes > m.minutes) {
            most_played = Some(MostPlayedGame {
                game_id: game.id.clone(),
                name: game.name.clone(),
                minutes,
            });
        }

        if let Some(score) = game.rating_for(&user.id) {
            scores.push(f64::from(score));
        }

        comments.extend(game.comments_by(&user.id).map(|c| CommentSummary {
            game_id: game.id.clone(),
            game_name: game.name.clone(),
            content: c.content.clone(),
        }));
    }

    let average_rating = if scores.is_empty() {
        0.0
    } else {
        round2(scores.iter().sum::<f64>() / scores.len() as f64)
    };

    UserSummary {
        user_id: user.id.clone(),
        username: user.username.clone(),
        average_rating,
        total_play_time,
        total_play_time_hours: total_play_time / 60,
        most_played_game: most_played,
        comments,
    }
}

pub struct SummaryService {
    users: Arc<dyn UserRepository>,
    games: Arc<dyn GameRepository>,
}

impl SummaryService {
    pub fn new(users: Arc<dyn UserRepository>, games: Arc<dyn GameRepository>) -> Self {
        Self { users, games }
    }

    /// Returns `None` when the user does not exist. Never writes.
    #[instrument(skip(self))]
    pub async fn summarize(&self, user_id: &str) -> Result<Option<UserSummary>, AppError> {
        let Some(user) = self.users.get_user(user_id).await? else {
            return Ok(None);
        };

        let fetches = user
            .played_games
            .iter()
            .map(|play| self.games.get_game(&play.game_id));
        let games: Vec<GameModel> = try_join_all(fetches).await?.into_iter().flatten().collect();

        debug!(
            played = user.played_games.len(),
            found = games.len(),
            "Projecting user summary"
        );

        Ok(Some(project(&user, &games)))
    }
}
