use std::sync::Arc;
use tracing::{info, instrument};

use super::{models::GameModel, repository::GameRepository};
use crate::shared::AppError;

/// Catalogue operations on game documents. Feedback and play facts go
/// through their own services.
pub struct GameService {
    games: Arc<dyn GameRepository>,
}

impl GameService {
    pub fn new(games: Arc<dyn GameRepository>) -> Self {
        Self { games }
    }

    #[instrument(skip(self))]
    pub async fn create_game(
        &self,
        name: &str,
        genre: &str,
        is_feedback_enabled: bool,
    ) -> Result<GameModel, AppError> {
        let name = name.trim();
        let genre = genre.trim();

        if name.is_empty() {
            return Err(AppError::InvalidInput("Game name cannot be empty".to_string()));
        }
        if genre.is_empty() {
            return Err(AppError::InvalidInput("Genre cannot be empty".to_string()));
        }

        let game = GameModel::new(name.to_string(), genre.to_string(), is_feedback_enabled);
        self.games.create_game(&game).await?;

        info!(game_id = %game.id, "Game created");
        Ok(game)
    }

    pub async fn get_game(&self, game_id: &str) -> Result<GameModel, AppError> {
        self.games
            .get_game(game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found.".to_string()))
    }

    pub async fn list_games(&self) -> Result<Vec<GameModel>, AppError> {
        self.games.list_games().await
    }

    /// Removes the game document. User-side copies of its play facts and
    /// ratings are left in place; projections skip games that no longer exist.
    #[instrument(skip(self))]
    pub async fn delete_game(&self, game_id: &str) -> Result<(), AppError> {
        if !self.games.delete_game(game_id).await? {
            return Err(AppError::NotFound("Game not found.".to_string()));
        }
        info!("Game deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_feedback_enabled(
        &self,
        game_id: &str,
        enabled: bool,
    ) -> Result<GameModel, AppError> {
        let game = self
            .games
            .set_feedback_enabled(game_id, enabled)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found.".to_string()))?;

        info!(enabled, "Feedback flag updated");
        Ok(game)
    }
}
