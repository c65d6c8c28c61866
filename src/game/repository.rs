use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::models::{GameAggregates, GameComment, GameModel};
use crate::shared::AppError;
use crate::store::PgDocuments;

/// Result of removing a single fact from a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    NotPresent,
    GameNotFound,
}

/// Result of purging a user's traces from one game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurgeOutcome {
    /// Facts were removed, counts per list
    Purged {
        comments: usize,
        ratings: usize,
        plays: usize,
    },
    /// The game held nothing from this user
    Untouched,
    GameNotFound,
}

impl PurgeOutcome {
    pub fn touched(&self) -> bool {
        matches!(self, PurgeOutcome::Purged { comments, ratings, plays } if comments + ratings + plays > 0)
    }
}

/// Result of appending a comment keyed by the id of the request that created it
#[derive(Debug, Clone, PartialEq)]
pub enum CommentWrite {
    Added,
    /// Same id, author and text already stored. Holds the stored comment.
    Replayed(GameComment),
    /// The id already belongs to a different comment
    IdTaken,
    GameNotFound,
}

/// Result of a compare-and-set write of cached aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAggregates {
    Stored,
    /// Fact lists changed after the aggregates were computed
    Stale { current_revision: u64 },
    GameNotFound,
}

/// Trait for game repository operations
///
/// Each method is atomic with respect to a single game document.
#[async_trait]
pub trait GameRepository: Send + Sync {
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError>;
    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError>;
    async fn list_games(&self) -> Result<Vec<GameModel>, AppError>;
    async fn list_game_ids(&self) -> Result<Vec<String>, AppError>;
    async fn delete_game(&self, game_id: &str) -> Result<bool, AppError>;

    /// Raises the game-side play fact to `total_minutes` if greater.
    /// Returns the resulting minutes, `None` if the game does not exist.
    async fn merge_play(
        &self,
        game_id: &str,
        user_id: &str,
        total_minutes: u32,
    ) -> Result<Option<u32>, AppError>;

    /// Returns `None` if the game does not exist, otherwise whether an
    /// existing rating was replaced
    async fn upsert_rating(
        &self,
        game_id: &str,
        user_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError>;

    async fn remove_rating(&self, game_id: &str, user_id: &str) -> Result<RemoveOutcome, AppError>;

    async fn push_comment(
        &self,
        game_id: &str,
        comment: GameComment,
    ) -> Result<CommentWrite, AppError>;

    async fn remove_comment(
        &self,
        game_id: &str,
        comment_id: &str,
    ) -> Result<RemoveOutcome, AppError>;

    async fn purge_user(&self, game_id: &str, user_id: &str) -> Result<PurgeOutcome, AppError>;

    async fn set_feedback_enabled(
        &self,
        game_id: &str,
        enabled: bool,
    ) -> Result<Option<GameModel>, AppError>;

    /// Writes cached aggregates only if the game's revision still equals
    /// `expected_revision`
    async fn store_aggregates(
        &self,
        game_id: &str,
        aggregates: GameAggregates,
        expected_revision: u64,
    ) -> Result<StoreAggregates, AppError>;
}

/// In-memory implementation of GameRepository for development and testing
pub struct InMemoryGameRepository {
    games: RwLock<HashMap<String, GameModel>>,
}

impl Default for InMemoryGameRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGameRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an in-memory repository with pre-populated games
    pub fn with_games(games: Vec<GameModel>) -> Self {
        let game_map = games.into_iter().map(|g| (g.id.clone(), g)).collect();
        Self {
            games: RwLock::new(game_map),
        }
    }

    async fn with_game<R>(&self, game_id: &str, mutate: impl FnOnce(&mut GameModel) -> R) -> Option<R> {
        let mut games = self.games.write().await;
        games.get_mut(game_id).map(mutate)
    }
}

#[async_trait]
impl GameRepository for InMemoryGameRepository {
    #[instrument(skip(self, game))]
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError> {
        debug!(game_id = %game.id, name = %game.name, "Creating game in memory");

        let mut games = self.games.write().await;
        if games.contains_key(&game.id) {
            warn!(game_id = %game.id, "Game already exists in memory");
            return Err(AppError::Conflict("Game already exists".to_string()));
        }
        games.insert(game.id.clone(), game.clone());

        debug!(game_id = %game.id, "Game created successfully in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
        debug!(game_id = %game_id, "Fetching game from memory");

        let games = self.games.read().await;
        let game = games.get(game_id).cloned();

        match &game {
            Some(g) => debug!(game_id = %game_id, name = %g.name, "Game found in memory"),
            None => debug!(game_id = %game_id, "Game not found in memory"),
        }

        Ok(game)
    }

    #[instrument(skip(self))]
    async fn list_games(&self) -> Result<Vec<GameModel>, AppError> {
        debug!("Listing all games in memory");

        let games = self.games.read().await;
        let mut game_list: Vec<GameModel> = games.values().cloned().collect();
        game_list.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(game_list)
    }

    #[instrument(skip(self))]
    async fn list_game_ids(&self) -> Result<Vec<String>, AppError> {
        let games = self.games.read().await;
        let mut ids: Vec<String> = games.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn delete_game(&self, game_id: &str) -> Result<bool, AppError> {
        debug!(game_id = %game_id, "Deleting game from memory");

        let mut games = self.games.write().await;
        Ok(games.remove(game_id).is_some())
    }

    #[instrument(skip(self))]
    async fn merge_play(
        &self,
        game_id: &str,
        user_id: &str,
        total_minutes: u32,
    ) -> Result<Option<u32>, AppError> {
        let merged = self
            .with_game(game_id, |game| game.merge_play(user_id, total_minutes))
            .await;

        match merged {
            Some(minutes) => info!(
                game_id = %game_id,
                user_id = %user_id,
                minutes,
                "Merged game-side play fact (atomic)"
            ),
            None => debug!(game_id = %game_id, "Game not found for play merge"),
        }

        Ok(merged)
    }

    #[instrument(skip(self))]
    async fn upsert_rating(
        &self,
        game_id: &str,
        user_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError> {
        Ok(self
            .with_game(game_id, |game| game.upsert_rating(user_id, rating))
            .await)
    }

    #[instrument(skip(self))]
    async fn remove_rating(&self, game_id: &str, user_id: &str) -> Result<RemoveOutcome, AppError> {
        let removed = self
            .with_game(game_id, |game| game.remove_rating(user_id))
            .await;

        Ok(match removed {
            Some(true) => RemoveOutcome::Removed,
            Some(false) => RemoveOutcome::NotPresent,
            None => RemoveOutcome::GameNotFound,
        })
    }

    #[instrument(skip(self, comment))]
    async fn push_comment(
        &self,
        game_id: &str,
        comment: GameComment,
    ) -> Result<CommentWrite, AppError> {
        Ok(self
            .with_game(game_id, |game| game.push_comment(comment))
            .await
            .unwrap_or(CommentWrite::GameNotFound))
    }

    #[instrument(skip(self))]
    async fn remove_comment(
        &self,
        game_id: &str,
        comment_id: &str,
    ) -> Result<RemoveOutcome, AppError> {
        let removed = self
            .with_game(game_id, |game| game.remove_comment(comment_id))
            .await;

        Ok(match removed {
            Some(true) => RemoveOutcome::Removed,
            Some(false) => RemoveOutcome::NotPresent,
            None => RemoveOutcome::GameNotFound,
        })
    }

    #[instrument(skip(self))]
    async fn purge_user(&self, game_id: &str, user_id: &str) -> Result<PurgeOutcome, AppError> {
        let outcome = self
            .with_game(game_id, |game| game.purge_user(user_id))
            .await;

        Ok(outcome.unwrap_or(PurgeOutcome::GameNotFound))
    }

    #[instrument(skip(self))]
    async fn set_feedback_enabled(
        &self,
        game_id: &str,
        enabled: bool,
    ) -> Result<Option<GameModel>, AppError> {
        Ok(self
            .with_game(game_id, |game| {
                game.is_feedback_enabled = enabled;
                game.clone()
            })
            .await)
    }

    #[instrument(skip(self))]
    async fn store_aggregates(
        &self,
        game_id: &str,
        aggregates: GameAggregates,
        expected_revision: u64,
    ) -> Result<StoreAggregates, AppError> {
        let outcome = self
            .with_game(game_id, |game| {
                game.apply_aggregates(aggregates, expected_revision)
            })
            .await;

        Ok(outcome.unwrap_or(StoreAggregates::GameNotFound))
    }
}

/// PostgreSQL implementation storing each game as a JSONB document
pub struct PostgresGameRepository {
    documents: PgDocuments,
}

impl PostgresGameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            documents: PgDocuments::new(pool, "games"),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        self.documents.ensure_schema().await
    }
}

#[async_trait]
impl GameRepository for PostgresGameRepository {
    #[instrument(skip(self, game))]
    async fn create_game(&self, game: &GameModel) -> Result<(), AppError> {
        debug!(game_id = %game.id, name = %game.name, "Creating game in database");

        if !self.documents.insert(&game.id, game).await? {
            warn!(game_id = %game.id, "Game already exists in database");
            return Err(AppError::Conflict("Game already exists".to_string()));
        }
        Ok(())
    }

    async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
        self.documents.fetch(game_id).await
    }

    async fn list_games(&self) -> Result<Vec<GameModel>, AppError> {
        self.documents.fetch_all().await
    }

    async fn list_game_ids(&self) -> Result<Vec<String>, AppError> {
        self.documents.fetch_ids().await
    }

    async fn delete_game(&self, game_id: &str) -> Result<bool, AppError> {
        self.documents.delete(game_id).await
    }

    async fn merge_play(
        &self,
        game_id: &str,
        user_id: &str,
        total_minutes: u32,
    ) -> Result<Option<u32>, AppError> {
        self.documents
            .update(game_id, |game: &mut GameModel| {
                game.merge_play(user_id, total_minutes)
            })
            .await
    }

    async fn upsert_rating(
        &self,
        game_id: &str,
        user_id: &str,
        rating: u8,
    ) -> Result<Option<bool>, AppError> {
        self.documents
            .update(game_id, |game: &mut GameModel| {
                game.upsert_rating(user_id, rating)
            })
            .await
    }

    async fn remove_rating(&self, game_id: &str, user_id: &str) -> Result<RemoveOutcome, AppError> {
        let removed = self
            .documents
            .update(game_id, |game: &mut GameModel| game.remove_rating(user_id))
            .await?;

        Ok(match removed {
            Some(true) => RemoveOutcome::Removed,
            Some(false) => RemoveOutcome::NotPresent,
            None => RemoveOutcome::GameNotFound,
        })
    }

    async fn push_comment(
        &self,
        game_id: &str,
        comment: GameComment,
    ) -> Result<CommentWrite, AppError> {
        let write = self
            .documents
            .update(game_id, |game: &mut GameModel| game.push_comment(comment))
            .await?;
        Ok(write.unwrap_or(CommentWrite::GameNotFound))
    }

    async fn remove_comment(
        &self,
        game_id: &str,
        comment_id: &str,
    ) -> Result<RemoveOutcome, AppError> {
        let removed = self
            .documents
            .update(game_id, |game: &mut GameModel| game.remove_comment(comment_id))
            .await?;

        Ok(match removed {
            Some(true) => RemoveOutcome::Removed,
            Some(false) => RemoveOutcome::NotPresent,
            None => RemoveOutcome::GameNotFound,
        })
    }

    async fn purge_user(&self, game_id: &str, user_id: &str) -> Result<PurgeOutcome, AppError> {
        let outcome = self
            .documents
            .update(game_id, |game: &mut GameModel| game.purge_user(user_id))
            .await?;

        Ok(outcome.unwrap_or(PurgeOutcome::GameNotFound))
    }

    async fn set_feedback_enabled(
        &self,
        game_id: &str,
        enabled: bool,
    ) -> Result<Option<GameModel>, AppError> {
        self.documents
            .update(game_id, |game: &mut GameModel| {
                game.is_feedback_enabled = enabled;
                game.clone()
            })
            .await
    }

    async fn store_aggregates(
        &self,
        game_id: &str,
        aggregates: GameAggregates,
        expected_revision: u64,
    ) -> Result<StoreAggregates, AppError> {
        let outcome = self
            .documents
            .update(game_id, |game: &mut GameModel| {
                game.apply_aggregates(aggregates, expected_revision)
            })
            .await?;

        Ok(outcome.unwrap_or(StoreAggregates::GameNotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_game(name: &str) -> GameModel {
        GameModel::new(name.to_string(), "Roguelike".to_string(), true)
    }

    #[tokio::test]
    async fn test_create_and_get_game() {
        let repo = InMemoryGameRepository::new();
        let game = create_test_game("Hades");

        repo.create_game(&game).await.unwrap();

        let retrieved = repo.get_game(&game.id).await.unwrap().unwrap();
        assert_eq!(retrieved.name, "Hades");
        assert!(retrieved.is_feedback_enabled);
    }

    #[tokio::test]
    async fn test_create_duplicate_game() {
        let repo = InMemoryGameRepository::new();
        let game = create_test_game("Hades");

        repo.create_game(&game).await.unwrap();
        let result = repo.create_game(&game).await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_game_ids_sorted() {
        let games = vec![create_test_game("A"), create_test_game("B")];
        let mut expected: Vec<String> = games.iter().map(|g| g.id.clone()).collect();
        expected.sort();
        let repo = InMemoryGameRepository::with_games(games);

        assert_eq!(repo.list_game_ids().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_game() {
        let repo = InMemoryGameRepository::new();

        assert_eq!(repo.merge_play("missing", "u", 10).await.unwrap(), None);
        assert_eq!(repo.upsert_rating("missing", "u", 3).await.unwrap(), None);
        assert_eq!(
            repo.remove_rating("missing", "u").await.unwrap(),
            RemoveOutcome::GameNotFound
        );
        assert_eq!(
            repo.purge_user("missing", "u").await.unwrap(),
            PurgeOutcome::GameNotFound
        );
        assert_eq!(
            repo.store_aggregates("missing", GameAggregates::default(), 0)
                .await
                .unwrap(),
            StoreAggregates::GameNotFound
        );
    }

    #[tokio::test]
    async fn test_concurrent_ratings_from_different_users_are_all_kept() {
        let game = create_test_game("Hades");
        let game_id = game.id.clone();
        let repo = std::sync::Arc::new(InMemoryGameRepository::with_games(vec![game]));

        let mut handles = Vec::new();
        for i in 0..10 {
            let repo = repo.clone();
            let game_id = game_id.clone();
            handles.push(tokio::spawn(async move {
                repo.upsert_rating(&game_id, &format!("user-{}", i), 4)
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let game = repo.get_game(&game_id).await.unwrap().unwrap();
        assert_eq!(game.ratings.len(), 10);
        assert_eq!(game.revision, 10);
    }

    #[tokio::test]
    async fn test_remove_comment() {
        let game = create_test_game("Hades");
        let repo = InMemoryGameRepository::with_games(vec![game.clone()]);
        let comment = GameComment::new("c-1".into(), "u".into(), "nice".into());

        assert_eq!(
            repo.push_comment(&game.id, comment).await.unwrap(),
            CommentWrite::Added
        );
        assert_eq!(
            repo.remove_comment(&game.id, "c-1").await.unwrap(),
            RemoveOutcome::Removed
        );
        assert_eq!(
            repo.remove_comment(&game.id, "c-1").await.unwrap(),
            RemoveOutcome::NotPresent
        );
    }
}
