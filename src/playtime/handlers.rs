use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use tracing::{info, instrument};

use super::{
    service::{PlaytimeOutcome, ReconcileOutcome, RecordPlaytime},
    types::{PlayQuery, PlaytimeResponse, ReconcileResponse},
};
use crate::shared::{idempotency_key, AppError, AppState};

/// HTTP handler for reporting playtime
///
/// POST /api/users/:user_id/play/:game_id?minutes=N
/// Honors the Idempotency-Key header so a retried report is not counted twice
#[instrument(name = "record_playtime", skip(state, headers))]
pub async fn record_playtime(
    State(state): State<AppState>,
    Path((user_id, game_id)): Path<(String, String)>,
    Query(query): Query<PlayQuery>,
    headers: HeaderMap,
) -> Result<Json<PlaytimeResponse>, AppError> {
    let request = RecordPlaytime {
        user_id: user_id.clone(),
        game_id: game_id.clone(),
        minutes: query.minutes,
        request_id: idempotency_key(&headers),
    };

    match state.playtime_service().record_playtime(request).await? {
        PlaytimeOutcome::Recorded {
            total_minutes,
            duplicate,
        } => {
            info!(user_id = %user_id, game_id = %game_id, total_minutes, "Play time added");
            Ok(Json(PlaytimeResponse {
                user_id,
                game_id,
                total_minutes,
                total_hours: total_minutes / 60,
                duplicate,
            }))
        }
        PlaytimeOutcome::InvalidMinutes(minutes) => Err(AppError::InvalidInput(format!(
            "Minutes must be a positive number, got {}",
            minutes
        ))),
        PlaytimeOutcome::TotalOverflow { total_minutes } => Err(AppError::InvalidInput(format!(
            "Minutes would overflow the recorded total of {}",
            total_minutes
        ))),
        PlaytimeOutcome::UserNotFound => Err(AppError::NotFound("User not found.".to_string())),
        PlaytimeOutcome::GameNotFound => Err(AppError::NotFound("Game not found.".to_string())),
    }
}

/// HTTP handler for re-syncing the game-side play fact
///
/// POST /api/users/:user_id/play/:game_id/reconcile
#[instrument(name = "reconcile_play", skip(state))]
pub async fn reconcile_play(
    State(state): State<AppState>,
    Path((user_id, game_id)): Path<(String, String)>,
) -> Result<Json<ReconcileResponse>, AppError> {
    match state
        .playtime_service()
        .reconcile_play(&user_id, &game_id)
        .await?
    {
        ReconcileOutcome::Converged { minutes } => Ok(Json(ReconcileResponse {
            user_id,
            game_id,
            minutes,
        })),
        ReconcileOutcome::UserNotFound => Err(AppError::NotFound("User not found.".to_string())),
        ReconcileOutcome::GameNotFound => Err(AppError::NotFound("Game not found.".to_string())),
    }
}
