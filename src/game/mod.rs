// Public API - what other modules can use
pub use handlers::{create_game, delete_game, get_game, list_games, set_feedback_enabled};
pub use models::{GameAggregates, GameComment, GameModel, GamePlay, GameRating};
pub use repository::{
    CommentWrite, GameRepository, InMemoryGameRepository, PostgresGameRepository, PurgeOutcome,
    RemoveOutcome, StoreAggregates,
};
pub use service::GameService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
