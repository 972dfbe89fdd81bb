//! Profile handlers.

use axum::extract::State;

use haven_types::identity::Profile;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// GET /api/v1/me - The profile behind the caller's token.
pub async fn get_me(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse<Profile>, AppError> {
    let clock = RequestClock::start();
    let profile = state.identity_service.get(&principal.user_id).await?;
    Ok(clock.respond(profile).with_link("self", "/api/v1/me"))
}
