use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::feedback::RatingAggregator;
use crate::game::repository::{GameRepository, PurgeOutcome};
use crate::shared::AppError;
use crate::user::repository::UserRepository;

/// Games purged in parallel while deleting a user
pub const PURGE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteUserOutcome {
    /// User record removed after every game was purged
    Removed { games_purged: usize },
    /// Some games could not be purged. The user record is kept so the
    /// deletion can be rerun.
    Incomplete { failed_games: Vec<String> },
    NotFound,
}

/// Removes a user's comments, ratings and play facts from every game, then
/// the user record itself.
///
/// Each game is corrected independently and its aggregates recomputed, so a
/// failure on one game leaves every game in a valid state. Purging is
/// idempotent and the whole operation can be rerun with the same user id.
pub struct DeletionReconciler {
    users: Arc<dyn UserRepository>,
    games: Arc<dyn GameRepository>,
    aggregator: RatingAggregator,
}

impl DeletionReconciler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        games: Arc<dyn GameRepository>,
        aggregator: RatingAggregator,
    ) -> Self {
        Self {
            users,
            games,
            aggregator,
        }
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> Result<DeleteUserOutcome, AppError> {
        if self.users.get_user(user_id).await?.is_none() {
            return Ok(DeleteUserOutcome::NotFound);
        }

        let game_ids = self.games.list_game_ids().await?;
        debug!(games = game_ids.len(), "Purging user from games");

        let results: Vec<(String, Result<bool, AppError>)> = stream::iter(game_ids)
            .map(|game_id| async move {
                let result = self.purge_game(&game_id, user_id).await;
                (game_id, result)
            })
            .buffer_unordered(PURGE_CONCURRENCY)
            .collect()
            .await;

        let mut games_purged = 0;
        let mut failed_games = Vec::new();
        for (game_id, result) in results {
            match result {
                Ok(true) => games_purged += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(game_id = %game_id, error = %e, "Failed to purge user from game");
                    failed_games.push(game_id);
                }
            }
        }

        if !failed_games.is_empty() {
            failed_games.sort();
            warn!(
                failed = failed_games.len(),
                "User deletion incomplete, keeping user record"
            );
            return Ok(DeleteUserOutcome::Incomplete { failed_games });
        }

        if !self.users.delete_user(user_id).await? {
            // Removed by a concurrent deletion
            return Ok(DeleteUserOutcome::NotFound);
        }

        info!(games_purged, "User deleted");
        Ok(DeleteUserOutcome::Removed { games_purged })
    }

    /// Returns true when the game held anything from the user.
    ///
    /// Aggregates are refreshed even when nothing was removed: an earlier run
    /// may have purged the facts and then failed before storing them.
    async fn purge_game(&self, game_id: &str, user_id: &str) -> Result<bool, AppError> {
        let outcome = self.games.purge_user(game_id, user_id).await?;
        if outcome == PurgeOutcome::GameNotFound {
            return Ok(false);
        }

        debug!(game_id, ?outcome, "Purged user facts");
        self.aggregator.refresh(game_id).await?;
        Ok(outcome.touched())
    }
}
