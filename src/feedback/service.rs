use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::gate::{FeedbackPolicy, GateDenial};
use super::rating::RatingAggregator;
use crate::game::models::{GameComment, GameModel};
use crate::game::repository::{CommentWrite, GameRepository, RemoveOutcome};
use crate::playtime::converge_play;
use crate::shared::AppError;
use crate::user::models::UserModel;
use crate::user::repository::UserRepository;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Why a rating or comment was not accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackRejection {
    InvalidScore(i64),
    EmptyComment,
    GateClosed(GateDenial),
    CommentsDisabled,
    UserNotFound,
    GameNotFound,
    RequestIdReused,
}

impl From<FeedbackRejection> for AppError {
    fn from(rejection: FeedbackRejection) -> Self {
        match rejection {
            FeedbackRejection::InvalidScore(score) => AppError::InvalidInput(format!(
                "Rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, score
            )),
            FeedbackRejection::EmptyComment => {
                AppError::InvalidInput("Comment must not be empty".to_string())
            }
            FeedbackRejection::GateClosed(denial) => AppError::PermissionDenied(denial.to_string()),
            FeedbackRejection::CommentsDisabled => {
                AppError::PermissionDenied("Comments are disabled for this user".to_string())
            }
            FeedbackRejection::UserNotFound => AppError::NotFound("User not found.".to_string()),
            FeedbackRejection::GameNotFound => AppError::NotFound("Game not found.".to_string()),
            FeedbackRejection::RequestIdReused => AppError::Conflict(
                "Request id already used for a different comment".to_string(),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RatingOutcome {
    Accepted {
        score: u8,
        replaced: bool,
        average_rating: f64,
    },
    Rejected(FeedbackRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommentOutcome {
    Accepted(GameComment),
    Rejected(FeedbackRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveRatingOutcome {
    Removed { average_rating: f64 },
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveCommentOutcome {
    Removed,
    NotFound,
}

/// Request to add a comment. `request_id` becomes the comment id, so a
/// redelivered request does not add a second comment.
#[derive(Debug, Clone)]
pub struct SubmitComment {
    pub user_id: String,
    pub game_id: String,
    pub content: String,
    pub request_id: String,
}

/// Service for rating and comment submission
pub struct FeedbackService {
    users: Arc<dyn UserRepository>,
    games: Arc<dyn GameRepository>,
    aggregator: RatingAggregator,
    policy: FeedbackPolicy,
}

impl FeedbackService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        games: Arc<dyn GameRepository>,
        aggregator: RatingAggregator,
        policy: FeedbackPolicy,
    ) -> Self {
        Self {
            users,
            games,
            aggregator,
            policy,
        }
    }

    /// Loads both documents, heals the game-side play fact from the user side
    /// and runs the gate. Nothing is written unless the game copy lagged.
    async fn admit(
        &self,
        user_id: &str,
        game_id: &str,
    ) -> Result<Result<(UserModel, GameModel), FeedbackRejection>, AppError> {
        let Some(user) = self.users.get_user(user_id).await? else {
            return Ok(Err(FeedbackRejection::UserNotFound));
        };
        let Some(game) = self.games.get_game(game_id).await? else {
            return Ok(Err(FeedbackRejection::GameNotFound));
        };

        let Some(game) = converge_play(self.games.as_ref(), &self.aggregator, &user, game).await?
        else {
            return Ok(Err(FeedbackRejection::GameNotFound));
        };

        if let Err(denial) = self.policy.check(&game, user_id) {
            warn!(user_id = %user_id, game_id = %game_id, ?denial, "Feedback gate closed");
            return Ok(Err(FeedbackRejection::GateClosed(denial)));
        }

        Ok(Ok((user, game)))
    }

    /// Adds or overwrites the user's rating and recomputes the average
    #[instrument(skip(self))]
    pub async fn submit_rating(
        &self,
        user_id: &str,
        game_id: &str,
        score: i64,
    ) -> Result<RatingOutcome, AppError> {
        if !(MIN_RATING..=MAX_RATING).contains(&score) {
            debug!(score, "Rating out of range");
            return Ok(RatingOutcome::Rejected(FeedbackRejection::InvalidScore(
                score,
            )));
        }
        let score = score as u8;

        if let Err(rejection) = self.admit(user_id, game_id).await? {
            return Ok(RatingOutcome::Rejected(rejection));
        }

        let Some(replaced) = self.games.upsert_rating(game_id, user_id, score).await? else {
            return Ok(RatingOutcome::Rejected(FeedbackRejection::GameNotFound));
        };

        if self
            .users
            .upsert_rating(user_id, game_id, score)
            .await?
            .is_none()
        {
            // User was deleted concurrently, take the game-side copy back out
            warn!(user_id = %user_id, game_id = %game_id, "User vanished while rating");
            self.games.remove_rating(game_id, user_id).await?;
            self.aggregator.refresh(game_id).await?;
            return Ok(RatingOutcome::Rejected(FeedbackRejection::UserNotFound));
        }

        let average_rating = self
            .aggregator
            .refresh(game_id)
            .await?
            .map(|a| a.average_rating)
            .unwrap_or_default();

        info!(
            user_id = %user_id,
            game_id = %game_id,
            score,
            replaced,
            average_rating,
            "Rating accepted"
        );

        Ok(RatingOutcome::Accepted {
            score,
            replaced,
            average_rating,
        })
    }

    #[instrument(skip(self, request), fields(user_id = %request.user_id, game_id = %request.game_id))]
    pub async fn submit_comment(&self, request: SubmitComment) -> Result<CommentOutcome, AppError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Ok(CommentOutcome::Rejected(FeedbackRejection::EmptyComment));
        }

        let user = match self.admit(&request.user_id, &request.game_id).await? {
            Ok((user, _)) => user,
            Err(rejection) => return Ok(CommentOutcome::Rejected(rejection)),
        };

        if !user.comments_enabled {
            warn!(user_id = %request.user_id, "Comments disabled for user");
            return Ok(CommentOutcome::Rejected(FeedbackRejection::CommentsDisabled));
        }

        let comment = GameComment::new(
            request.request_id.clone(),
            request.user_id.clone(),
            content.to_string(),
        );

        match self
            .games
            .push_comment(&request.game_id, comment.clone())
            .await?
        {
            CommentWrite::Added => {
                info!(comment_id = %comment.id, "Comment accepted");
                Ok(CommentOutcome::Accepted(comment))
            }
            CommentWrite::Replayed(stored) => {
                debug!(comment_id = %stored.id, "Comment already stored, replay ignored");
                Ok(CommentOutcome::Accepted(stored))
            }
            CommentWrite::IdTaken => {
                warn!(comment_id = %comment.id, "Request id belongs to another comment");
                Ok(CommentOutcome::Rejected(FeedbackRejection::RequestIdReused))
            }
            CommentWrite::GameNotFound => {
                Ok(CommentOutcome::Rejected(FeedbackRejection::GameNotFound))
            }
        }
    }

    /// Removes the user's rating from both copies and recomputes the average
    #[instrument(skip(self))]
    pub async fn remove_rating(
        &self,
        game_id: &str,
        user_id: &str,
    ) -> Result<RemoveRatingOutcome, AppError> {
        let outcome = self.games.remove_rating(game_id, user_id).await?;
        self.users.remove_rating(user_id, game_id).await?;

        match outcome {
            RemoveOutcome::Removed => {
                let average_rating = self
                    .aggregator
                    .refresh(game_id)
                    .await?
                    .map(|a| a.average_rating)
                    .unwrap_or_default();
                info!(game_id = %game_id, user_id = %user_id, average_rating, "Rating removed");
                Ok(RemoveRatingOutcome::Removed { average_rating })
            }
            RemoveOutcome::NotPresent => {
                // A retry after the rating was removed but its refresh failed
                self.aggregator.refresh(game_id).await?;
                debug!(game_id = %game_id, user_id = %user_id, "No rating to remove");
                Ok(RemoveRatingOutcome::NotFound)
            }
            RemoveOutcome::GameNotFound => {
                debug!(game_id = %game_id, user_id = %user_id, "Game not found for rating removal");
                Ok(RemoveRatingOutcome::NotFound)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn remove_comment(
        &self,
        game_id: &str,
        comment_id: &str,
    ) -> Result<RemoveCommentOutcome, AppError> {
        match self.games.remove_comment(game_id, comment_id).await? {
            RemoveOutcome::Removed => {
                info!(game_id = %game_id, comment_id = %comment_id, "Comment removed");
                Ok(RemoveCommentOutcome::Removed)
            }
            _ => Ok(RemoveCommentOutcome::NotFound),
        }
    }
}
