// Library crate for the game delivery service
// This file exposes the public API for integration tests

pub mod config;
pub mod feedback;
pub mod game;
pub mod playtime;
pub mod reconcile;
pub mod routes;
pub mod shared;
pub mod store;
pub mod summary;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::Config;
pub use feedback::{FeedbackPolicy, FeedbackService, RatingAggregator, RatingPolicy};
pub use game::{GameModel, GameRepository, InMemoryGameRepository};
pub use playtime::PlaytimeService;
pub use reconcile::{DeleteUserOutcome, DeletionReconciler};
pub use routes::build_router;
pub use shared::{AppError, AppState};
pub use summary::{SummaryService, UserSummary};
pub use user::{InMemoryUserRepository, UserModel, UserRepository};
