use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::{info, instrument};

use super::{
    service::{
        CommentOutcome, RatingOutcome, RemoveCommentOutcome, RemoveRatingOutcome, SubmitComment,
    },
    types::{CommentRequest, CommentResponse, RateQuery, RatingResponse, RemoveRatingResponse},
};
use crate::shared::{idempotency_key, AppError, AppState};

/// HTTP handler for rating a game
///
/// POST /api/users/:user_id/rate/:game_id?rating=N
#[instrument(name = "submit_rating", skip(state))]
pub async fn submit_rating(
    State(state): State<AppState>,
    Path((user_id, game_id)): Path<(String, String)>,
    Query(query): Query<RateQuery>,
) -> Result<Json<RatingResponse>, AppError> {
    match state
        .feedback_service()
        .submit_rating(&user_id, &game_id, query.rating)
        .await?
    {
        RatingOutcome::Accepted {
            score,
            replaced,
            average_rating,
        } => {
            info!(user_id = %user_id, game_id = %game_id, average_rating, "Rating submitted and average updated");
            Ok(Json(RatingResponse {
                user_id,
                game_id,
                rating: score,
                replaced,
                average_rating,
            }))
        }
        RatingOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// HTTP handler for withdrawing a rating
///
/// DELETE /api/games/:game_id/ratings/:user_id
#[instrument(name = "remove_rating", skip(state))]
pub async fn remove_rating(
    State(state): State<AppState>,
    Path((game_id, user_id)): Path<(String, String)>,
) -> Result<Json<RemoveRatingResponse>, AppError> {
    match state
        .feedback_service()
        .remove_rating(&game_id, &user_id)
        .await?
    {
        RemoveRatingOutcome::Removed { average_rating } => Ok(Json(RemoveRatingResponse {
            game_id,
            average_rating,
        })),
        RemoveRatingOutcome::NotFound => Err(AppError::NotFound("Rating not found.".to_string())),
    }
}

/// HTTP handler for commenting on a game
///
/// POST /api/games/:game_id/comments
/// Honors the Idempotency-Key header; the key becomes the comment id
#[instrument(name = "submit_comment", skip(state, headers, request))]
pub async fn submit_comment(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let command = SubmitComment {
        user_id: request.user_id,
        game_id: game_id.clone(),
        content: request.content,
        request_id: idempotency_key(&headers),
    };

    match state.feedback_service().submit_comment(command).await? {
        CommentOutcome::Accepted(comment) => Ok((
            StatusCode::CREATED,
            Json(CommentResponse::new(game_id, comment)),
        )),
        CommentOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

/// HTTP handler for deleting a comment
///
/// DELETE /api/games/:game_id/comments/:comment_id
#[instrument(name = "remove_comment", skip(state))]
pub async fn remove_comment(
    State(state): State<AppState>,
    Path((game_id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    match state
        .feedback_service()
        .remove_comment(&game_id, &comment_id)
        .await?
    {
        RemoveCommentOutcome::Removed => Ok(StatusCode::NO_CONTENT),
        RemoveCommentOutcome::NotFound => {
            Err(AppError::NotFound("Comment not found.".to_string()))
        }
    }
}
