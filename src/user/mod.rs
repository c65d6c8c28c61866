// Public API - what other modules can use
pub use handlers::{create_user, delete_user, get_user, list_users, set_comments_enabled};
pub use models::{UserModel, UserPlay, UserRating};
pub use repository::{
    InMemoryUserRepository, PlayWrite, PostgresUserRepository, UserRepository,
};
pub use service::UserService;

// Internal modules
mod handlers;
pub mod models;
pub mod repository;
pub mod service;
mod types;
