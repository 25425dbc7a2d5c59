use axum::{
    http::{header, HeaderValue},
    routing::{get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod slug;
pub mod state;
pub mod upload;
pub mod validation;

use middleware::login_rate_limit;
use state::AppState;

pub fn app(state: AppState) -> Router {
    // Login is the only rate-limited route.
    let login = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), login_rate_limit));

    Router::new()
        .route("/api", get(root))
        .route("/health", get(health))
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .merge(login)
        // Brands
        .route(
            "/api/brands",
            get(handlers::brands::list).post(handlers::brands::create),
        )
        .route(
            "/api/brands/:id",
            get(handlers::brands::get_by_slug)
                .put(handlers::brands::update)
                .delete(handlers::brands::remove),
        )
        // Categories
        .route(
            "/api/categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/api/categories/:id",
            get(handlers::categories::get_by_slug)
                .put(handlers::categories::update)
                .delete(handlers::categories::remove),
        )
        // Notes
        .route(
            "/api/notes",
            get(handlers::notes::list).post(handlers::notes::create),
        )
        .route(
            "/api/notes/:id",
            get(handlers::notes::get_by_slug)
                .put(handlers::notes::update)
                .delete(handlers::notes::remove),
        )
        // Perfumes and their scent pyramids
        .route(
            "/api/parfum",
            get(handlers::parfum::list).post(handlers::parfum::create),
        )
        .route(
            "/api/parfum/:id",
            get(handlers::parfum::get_by_slug)
                .put(handlers::parfum::update)
                .delete(handlers::parfum::remove),
        )
        .route("/api/parfum/:id/upload", put(handlers::parfum::upload_image))
        .route("/api/parfum/:id/notes", put(handlers::parfum_notes::replace_pyramid))
        // Dashboard
        .route("/api/dashboard/stats", get(handlers::dashboard::stats))
        // Uploaded images are served as static files
        .nest_service("/public", ServeDir::new("public"))
        // Global middleware
        // Leave headroom above the 5 MiB file cap for multipart framing.
        .layer(axum::extract::DefaultBodyLimit::max(6 * 1024 * 1024))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "Parfum API (Rust)",
        "version": version,
        "msg": "Villa Parfum backend API is running",
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
