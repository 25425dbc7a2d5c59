use std::net::SocketAddr;
use std::time::Duration;

use parfum_api_rust::middleware::SlidingWindowLimiter;
use parfum_api_rust::state::AppState;
use parfum_api_rust::{app, config, database};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, PORT.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parfum_api_rust=info,tower_http=info".into()),
        )
        .init();

    let config = config::config();

    if config.security.jwt_secret.is_empty() {
        panic!("JWT_SECRET environment variable must be set");
    }

    let pool = database::manager::create_pool(&config.database)
        .await
        .unwrap_or_else(|e| panic!("failed to create database pool: {}", e));

    database::manager::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| panic!("failed to run migrations: {}", e));

    tokio::fs::create_dir_all(&config.uploads.directory)
        .await
        .unwrap_or_else(|e| panic!("failed to create upload directory: {}", e));

    let limiter = SlidingWindowLimiter::new(
        config.security.login_max_attempts,
        Duration::from_secs(config.security.login_window_secs),
    );
    let state = AppState::new(pool, limiter);

    let app = app(state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Parfum API server listening on http://{}", bind_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("server");
}
