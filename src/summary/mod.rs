// Public API - what other modules can use
pub use handlers::get_summary;
pub use service::{project, CommentSummary, MostPlayedGame, SummaryService, UserSummary};

// Internal modules
mod handlers;
pub mod service;
