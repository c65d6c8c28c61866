use game_delivery::{
    build_router,
    game::{GameRepository, InMemoryGameRepository, PostgresGameRepository},
    user::{InMemoryUserRepository, PostgresUserRepository, UserRepository},
    AppState, Config,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "game_delivery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting game delivery service");

    let config = Config::load().expect("Environment misconfigured!");
    info!(rating_policy = %config.rating_policy, "Configuration loaded");

    let (user_repository, game_repository) = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url)
                .await
                .expect("Failed to connect to database");

            let users = PostgresUserRepository::new(pool.clone());
            let games = PostgresGameRepository::new(pool);
            if let Err(e) = users.ensure_schema().await {
                error!(error = %e, "Failed to prepare users table");
                return;
            }
            if let Err(e) = games.ensure_schema().await {
                error!(error = %e, "Failed to prepare games table");
                return;
            }

            info!("Using PostgreSQL repositories");
            (
                Arc::new(users) as Arc<dyn UserRepository>,
                Arc::new(games) as Arc<dyn GameRepository>,
            )
        }
        None => {
            info!("DATABASE_URL not set, using in-memory repositories");
            (
                Arc::new(InMemoryUserRepository::new()) as Arc<dyn UserRepository>,
                Arc::new(InMemoryGameRepository::new()) as Arc<dyn GameRepository>,
            )
        }
    };

    let app_state = AppState::new(user_repository, game_repository, config.rating_policy);
    let app = build_router(app_state);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap();
    info!("Server running on http://{}", address);
    axum::serve(listener, app).await.unwrap();
}
