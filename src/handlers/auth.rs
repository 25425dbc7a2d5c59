use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{self, password, Claims};
use crate::config;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{required_text, FieldErrors};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/register - Create a new admin account
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let mut errors = FieldErrors::new();
    let email = required_text(payload.email.as_ref(), "email", &mut errors);
    let password = required_text(payload.password.as_ref(), "password", &mut errors);
    let name = required_text(payload.name.as_ref(), "name", &mut errors);
    errors.into_result()?;

    let (email, password, name) = (email.unwrap(), password.unwrap(), name.unwrap());

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.pool)
        .await?;

    if existing.is_some() {
        return Err(ApiError::conflict("email is already registered"));
    }

    let hashed = password::hash_password(&password).map_err(|e| {
        tracing::error!("Password hash error: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    let new_id = Uuid::new_v4();
    sqlx::query("INSERT INTO users (id, email, password, name) VALUES ($1, $2, $3, $4)")
        .bind(new_id)
        .bind(&email)
        .bind(&hashed)
        .bind(&name)
        .execute(&state.pool)
        .await
        .map_err(|e| super::conflict_on_duplicate(e, "email is already registered"))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": new_id, "msg": "admin registered" })),
    ))
}

/// POST /api/auth/login - Authenticate and receive a session token
///
/// Unknown email and wrong password produce the same generic error so the
/// response never reveals which one failed.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = FieldErrors::new();
    let email = required_text(payload.email.as_ref(), "email", &mut errors);
    let password = required_text(payload.password.as_ref(), "password", &mut errors);
    errors.into_result()?;

    let invalid_credentials = || ApiError::bad_request("invalid email or password");

    let user = sqlx::query_as::<_, crate::database::models::User>(
        "SELECT id, email, password, name FROM users WHERE email = $1",
    )
    .bind(email.unwrap())
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(invalid_credentials)?;

    let is_match = password::verify_password(&password.unwrap(), &user.password).map_err(|e| {
        tracing::error!("Password verify error: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    if !is_match {
        return Err(invalid_credentials());
    }

    let security = &config::config().security;
    let claims = Claims::new(user.id, user.email, security.jwt_expiry_hours);
    let token = auth::sign_token(&claims, &security.jwt_secret).map_err(|e| {
        tracing::error!("JWT sign error: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    Ok(Json(json!({ "token": token })))
}
