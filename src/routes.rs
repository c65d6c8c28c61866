use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::shared::AppState;
use crate::{feedback, game, playtime, summary, user};

/// Assembles the HTTP surface over the given state
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Game delivery service" }))
        .route("/api/users", get(user::list_users).post(user::create_user))
        .route(
            "/api/users/:user_id",
            get(user::get_user).delete(user::delete_user),
        )
        .route("/api/users/:user_id/summary", get(summary::get_summary))
        .route("/api/users/:user_id/comments", put(user::set_comments_enabled))
        .route(
            "/api/users/:user_id/play/:game_id",
            post(playtime::record_playtime),
        )
        .route(
            "/api/users/:user_id/play/:game_id/reconcile",
            post(playtime::reconcile_play),
        )
        .route(
            "/api/users/:user_id/rate/:game_id",
            post(feedback::submit_rating),
        )
        .route("/api/games", get(game::list_games).post(game::create_game))
        .route(
            "/api/games/:game_id",
            get(game::get_game).delete(game::delete_game),
        )
        .route("/api/games/:game_id/feedback", put(game::set_feedback_enabled))
        .route(
            "/api/games/:game_id/comments",
            post(feedback::submit_comment),
        )
        .route(
            "/api/games/:game_id/comments/:comment_id",
            delete(feedback::remove_comment),
        )
        .route(
            "/api/games/:game_id/ratings/:user_id",
            delete(feedback::remove_rating),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
