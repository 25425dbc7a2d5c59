use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::config;
use crate::error::ApiError;

/// Authenticated admin context extracted from the bearer token.
///
/// Protected handlers take this as an argument; extraction failure is the
/// 401 response, so no handler body runs without a verified token.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).map_err(ApiError::unauthorized)?;

        let secret = &config::config().security.jwt_secret;
        let claims = auth::verify_token(&token, secret)
            .map_err(|_| ApiError::unauthorized("invalid token"))?;

        Ok(AuthUser::from(claims))
    }
}

/// Extract the bearer token from the Authorization header.
/// Distinguishes a missing header from a malformed one.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "access denied, no token".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "bad token format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        _ => Err("bad token format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn missing_header_is_distinguished_from_bad_format() {
        let headers = HeaderMap::new();
        assert_eq!(
            extract_bearer_token(&headers).unwrap_err(),
            "access denied, no token"
        );

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers).unwrap_err(), "bad token format");

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers).unwrap_err(), "bad token format");
    }

    #[test]
    fn accepts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
