use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::feedback::{FeedbackPolicy, FeedbackService, RatingAggregator, RatingPolicy};
use crate::game::repository::GameRepository;
use crate::game::service::GameService;
use crate::playtime::PlaytimeService;
use crate::reconcile::DeletionReconciler;
use crate::summary::SummaryService;
use crate::user::repository::UserRepository;
use crate::user::service::UserService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub user_repository: Arc<dyn UserRepository>,
    pub game_repository: Arc<dyn GameRepository>,
    pub feedback_policy: FeedbackPolicy,
    pub rating_policy: RatingPolicy,
}

impl AppState {
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        game_repository: Arc<dyn GameRepository>,
        rating_policy: RatingPolicy,
    ) -> Self {
        Self {
            user_repository,
            game_repository,
            feedback_policy: FeedbackPolicy::default(),
            rating_policy,
        }
    }

    pub fn aggregator(&self) -> RatingAggregator {
        RatingAggregator::new(Arc::clone(&self.game_repository), self.rating_policy)
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(Arc::clone(&self.user_repository))
    }

    pub fn game_service(&self) -> GameService {
        GameService::new(Arc::clone(&self.game_repository))
    }

    pub fn playtime_service(&self) -> PlaytimeService {
        PlaytimeService::new(
            Arc::clone(&self.user_repository),
            Arc::clone(&self.game_repository),
            self.aggregator(),
        )
    }

    pub fn feedback_service(&self) -> FeedbackService {
        FeedbackService::new(
            Arc::clone(&self.user_repository),
            Arc::clone(&self.game_repository),
            self.aggregator(),
            self.feedback_policy,
        )
    }

    pub fn reconciler(&self) -> DeletionReconciler {
        DeletionReconciler::new(
            Arc::clone(&self.user_repository),
            Arc::clone(&self.game_repository),
            self.aggregator(),
        )
    }

    pub fn summary_service(&self) -> SummaryService {
        SummaryService::new(
            Arc::clone(&self.user_repository),
            Arc::clone(&self.game_repository),
        )
    }
}

/// Header carrying the client's idempotency key for write requests
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Reads the idempotency key from the request, generating a fresh one when the
/// client did not send it (such a request cannot be deduplicated on retry).
pub fn idempotency_key(headers: &HeaderMap) -> String {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
pub mod test_utils {
    use super::*;
    use crate::game::models::{GameAggregates, GameComment, GameModel};
    use crate::game::repository::{
        CommentWrite, InMemoryGameRepository, PurgeOutcome, RemoveOutcome, StoreAggregates,
    };
    use crate::user::models::UserModel;
    use crate::user::repository::InMemoryUserRepository;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Builder for creating AppState with overrides for testing
    pub struct AppStateBuilder {
        user_repository: Option<Arc<dyn UserRepository>>,
        game_repository: Option<Arc<dyn GameRepository>>,
        rating_policy: RatingPolicy,
    }

    impl AppStateBuilder {
        pub fn new() -> Self {
            Self {
                user_repository: None,
                game_repository: None,
                rating_policy: RatingPolicy::SimpleMean,
            }
        }

        pub fn with_user_repository(mut self, repo: Arc<dyn UserRepository>) -> Self {
            self.user_repository = Some(repo);
            self
        }

        pub fn with_game_repository(mut self, repo: Arc<dyn GameRepository>) -> Self {
            self.game_repository = Some(repo);
            self
        }

        pub fn with_rating_policy(mut self, policy: RatingPolicy) -> Self {
            self.rating_policy = policy;
            self
        }

        pub fn build(self) -> AppState {
            AppState::new(
                self.user_repository
                    .unwrap_or_else(|| Arc::new(InMemoryUserRepository::new())),
                self.game_repository
                    .unwrap_or_else(|| Arc::new(InMemoryGameRepository::new())),
                self.rating_policy,
            )
        }
    }

    impl Default for AppStateBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Creates a user and a game in fresh in-memory repositories
    pub async fn seeded_state(
        username: &str,
        game_name: &str,
    ) -> (AppState, UserModel, GameModel) {
        let state = AppStateBuilder::new().build();
        let user = UserModel::new(username.to_string(), format!("{}@example.com", username));
        let game = GameModel::new(game_name.to_string(), "Puzzle".to_string(), true);
        state.user_repository.create_user(&user).await.unwrap();
        state.game_repository.create_game(&game).await.unwrap();
        (state, user, game)
    }

    /// Game store whose purge or aggregate write fails for one game while
    /// the matching flag is set
    pub struct FlakyGameRepository {
        inner: InMemoryGameRepository,
        failing_game: String,
        pub fail_purge: AtomicBool,
        pub fail_store: AtomicBool,
    }

    impl FlakyGameRepository {
        pub fn new(games: Vec<GameModel>, failing_game: &str) -> Self {
            Self {
                inner: InMemoryGameRepository::with_games(games),
                failing_game: failing_game.to_string(),
                fail_purge: AtomicBool::new(false),
                fail_store: AtomicBool::new(false),
            }
        }

        fn fails(&self, flag: &AtomicBool, game_id: &str) -> bool {
            flag.load(Ordering::SeqCst) && game_id == self.failing_game
        }
    }

    #[async_trait]
    impl GameRepository for FlakyGameRepository {
        async fn create_game(&self, game: &GameModel) -> Result<(), AppError> {
            self.inner.create_game(game).await
        }
        async fn get_game(&self, game_id: &str) -> Result<Option<GameModel>, AppError> {
            self.inner.get_game(game_id).await
        }
        async fn list_games(&self) -> Result<Vec<GameModel>, AppError> {
            self.inner.list_games().await
        }
        async fn list_game_ids(&self) -> Result<Vec<String>, AppError> {
            self.inner.list_game_ids().await
        }
        async fn delete_game(&self, game_id: &str) -> Result<bool, AppError> {
            self.inner.delete_game(game_id).await
        }
        async fn merge_play(
            &self,
            game_id: &str,
            user_id: &str,
            total_minutes: u32,
        ) -> Result<Option<u32>, AppError> {
            self.inner.merge_play(game_id, user_id, total_minutes).await
        }
        async fn upsert_rating(
            &self,
            game_id: &str,
            user_id: &str,
            rating: u8,
        ) -> Result<Option<bool>, AppError> {
            self.inner.upsert_rating(game_id, user_id, rating).await
        }
        async fn remove_rating(
            &self,
            game_id: &str,
            user_id: &str,
        ) -> Result<RemoveOutcome, AppError> {
            self.inner.remove_rating(game_id, user_id).await
        }
        async fn push_comment(
            &self,
            game_id: &str,
            comment: GameComment,
        ) -> Result<CommentWrite, AppError> {
            self.inner.push_comment(game_id, comment).await
        }
        async fn remove_comment(
            &self,
            game_id: &str,
            comment_id: &str,
        ) -> Result<RemoveOutcome, AppError> {
            self.inner.remove_comment(game_id, comment_id).await
        }
        async fn purge_user(&self, game_id: &str, user_id: &str) -> Result<PurgeOutcome, AppError> {
            if self.fails(&self.fail_purge, game_id) {
                return Err(AppError::DatabaseError("connection reset".to_string()));
            }
            self.inner.purge_user(game_id, user_id).await
        }
        async fn set_feedback_enabled(
            &self,
            game_id: &str,
            enabled: bool,
        ) -> Result<Option<GameModel>, AppError> {
            self.inner.set_feedback_enabled(game_id, enabled).await
        }
        async fn store_aggregates(
            &self,
            game_id: &str,
            aggregates: GameAggregates,
            expected_revision: u64,
        ) -> Result<StoreAggregates, AppError> {
            if self.fails(&self.fail_store, game_id) {
                return Err(AppError::DatabaseError("connection reset".to_string()));
            }
            self.inner
                .store_aggregates(game_id, aggregates, expected_revision)
                .await
        }
    }
}
