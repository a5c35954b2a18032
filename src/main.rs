use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quill::auth::token::TokenConfig;
use quill::comment::repository::PostgresCommentRepository;
use quill::config::AppConfig;
use quill::post::repository::PostgresPostRepository;
use quill::routes::api_router;
use quill::shared::AppState;
use quill::user::repository::PostgresUserRepository;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting blog API server");

    // Fail fast before touching the network if configuration is incomplete
    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = sqlx::PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Explicitly constructed state: every handler reaches the database
    // through these repositories and signs tokens with this one secret
    let app_state = AppState::new(
        Arc::new(PostgresUserRepository::new(pool.clone())),
        Arc::new(PostgresPostRepository::new(pool.clone())),
        Arc::new(PostgresCommentRepository::new(pool.clone())),
        TokenConfig::new(config.jwt_secret.clone()),
    );

    let app = api_router(app_state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("Failed to bind listener");
    info!("Server running on http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Release database connections before exiting
    pool.close().await;
    info!("Server stopped");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install ctrl-c handler");
    info!("Shutdown signal received");
}
