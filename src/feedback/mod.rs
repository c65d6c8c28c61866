// Public API - what other modules can use
pub use gate::{FeedbackPolicy, GateDenial, FEEDBACK_MIN_MINUTES};
pub use handlers::{remove_comment, remove_rating, submit_comment, submit_rating};
pub use rating::{round2, RatingAggregator, RatingPolicy};
pub use service::{
    CommentOutcome, FeedbackRejection, FeedbackService, RatingOutcome, RemoveCommentOutcome,
    RemoveRatingOutcome, SubmitComment,
};

// Internal modules
pub mod gate;
mod handlers;
pub mod rating;
pub mod service;
mod types;
