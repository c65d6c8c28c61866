use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};

use super::types::{CommentsFlagRequest, CreateUserRequest, UserQuery, UserResponse};
use crate::reconcile::DeleteUserOutcome;
use crate::shared::{AppError, AppState};

/// HTTP handler for registering a user
///
/// POST /api/users
#[instrument(name = "create_user", skip(state, request))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state
        .user_service()
        .create_user(&request.username, &request.email)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// HTTP handler for listing users
///
/// GET /api/users, or GET /api/users?username=NAME for a single lookup
#[instrument(name = "list_users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let service = state.user_service();
    let users = match query.username {
        Some(username) => vec![service.get_user_by_username(&username).await?],
        None => service.list_users().await?,
    };

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// GET /api/users/:user_id
#[instrument(name = "get_user", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.user_service().get_user(&user_id).await?;
    Ok(Json(user.into()))
}

/// HTTP handler for deleting a user and every trace of them on games
///
/// DELETE /api/users/:user_id
#[instrument(name = "delete_user", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    match state.reconciler().delete_user(&user_id).await? {
        DeleteUserOutcome::Removed { games_purged } => {
            info!(games_purged, "User removed");
            Ok(StatusCode::NO_CONTENT)
        }
        DeleteUserOutcome::Incomplete { failed_games } => {
            warn!(?failed_games, "User deletion must be retried");
            Err(AppError::DatabaseError(format!(
                "Failed to purge user from {} game(s), retry the deletion",
                failed_games.len()
            )))
        }
        DeleteUserOutcome::NotFound => Err(AppError::NotFound("User not found.".to_string())),
    }
}

/// PUT /api/users/:user_id/comments
#[instrument(name = "set_comments_enabled", skip(state))]
pub async fn set_comments_enabled(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(request): Json<CommentsFlagRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .user_service()
        .set_comments_enabled(&user_id, request.enabled)
        .await?;
    Ok(Json(user.into()))
}
