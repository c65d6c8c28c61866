use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::instrument;

use super::types::{CreateGameRequest, FeedbackFlagRequest, GameResponse};
use crate::shared::{AppError, AppState};

/// HTTP handler for adding a game to the catalogue
///
/// POST /api/games
#[instrument(name = "create_game", skip(state, request))]
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<GameResponse>), AppError> {
    let game = state
        .game_service()
        .create_game(&request.name, &request.genre, request.is_feedback_enabled)
        .await?;

    Ok((StatusCode::CREATED, Json(game.into())))
}

/// GET /api/games
#[instrument(name = "list_games", skip(state))]
pub async fn list_games(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameResponse>>, AppError> {
    let games = state.game_service().list_games().await?;
    Ok(Json(games.into_iter().map(Into::into).collect()))
}

/// GET /api/games/:game_id
#[instrument(name = "get_game", skip(state))]
pub async fn get_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    let game = state.game_service().get_game(&game_id).await?;
    Ok(Json(game.into()))
}

/// DELETE /api/games/:game_id
#[instrument(name = "delete_game", skip(state))]
pub async fn delete_game(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.game_service().delete_game(&game_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// HTTP handler for opening or closing feedback on a game
///
/// PUT /api/games/:game_id/feedback
#[instrument(name = "set_feedback_enabled", skip(state))]
pub async fn set_feedback_enabled(
    State(state): State<AppState>,
    Path(game_id): Path<String>,
    Json(request): Json<FeedbackFlagRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let game = state
        .game_service()
        .set_feedback_enabled(&game_id, request.enabled)
        .await?;
    Ok(Json(game.into()))
}
