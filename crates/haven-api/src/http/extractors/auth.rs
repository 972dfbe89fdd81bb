//! API token authentication extractor.
//!
//! Extracts the caller's token from:
//! - `Authorization: Bearer <token>` header
//! - `X-API-Key: <token>` header
//!
//! The token is resolved to a [`Principal`] through the identity service,
//! which compares its SHA-256 hash against the `api_tokens` table.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use haven_types::error::IdentityError;
use haven_types::identity::Principal;

use crate::http::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Extracting this validates the token.
pub struct Authenticated(pub Principal);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;

        match state.identity_service.authenticate(&token).await {
            Ok(principal) => Ok(Authenticated(principal)),
            Err(IdentityError::InvalidToken) => Err(AppError::Unauthorized(
                "Invalid API token. Provide a valid token via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Extract the token from request headers.
fn extract_token(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            return Ok(token.trim().to_string());
        }
    }

    if let Some(token) = parts.headers.get("x-api-key") {
        let token_str = token.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(token_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API token. Provide via 'Authorization: Bearer <token>' or 'X-API-Key: <token>' header.".to_string(),
    ))
}
