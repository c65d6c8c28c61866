// Public API - what other modules can use
pub use service::{DeleteUserOutcome, DeletionReconciler, PURGE_CONCURRENCY};

// Internal modules
pub mod service;
