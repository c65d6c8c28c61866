use axum::{
    extract::{Path, State},
    Json,
};
use tracing::instrument;

use super::service::UserSummary;
use crate::shared::{AppError, AppState};

/// HTTP handler for a user's activity summary
///
/// GET /api/users/:user_id/summary
#[instrument(name = "get_summary", skip(state))]
pub async fn get_summary(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserSummary>, AppError> {
    state
        .summary_service()
        .summarize(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}
