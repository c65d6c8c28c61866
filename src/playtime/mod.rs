// Public API - what other modules can use
pub use handlers::{reconcile_play, record_playtime};
pub use service::{
    converge_play, PlaytimeOutcome, PlaytimeService, ReconcileOutcome, RecordPlaytime,
};

// Internal modules
mod handlers;
pub mod service;
mod types;
