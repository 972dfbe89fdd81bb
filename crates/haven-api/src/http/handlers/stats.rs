//! Dashboard statistics handler.

use axum::extract::State;

use haven_types::stats::DashboardStats;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// GET /api/v1/stats - Counts for the admin dashboard (admins only).
pub async fn get_stats(
    State(state): State<AppState>,
    Authenticated(principal): Authenticated,
) -> Result<ApiResponse<DashboardStats>, AppError> {
    let clock = RequestClock::start();
    if !principal.is_admin() {
        return Err(AppError::Forbidden(
            "dashboard statistics are available to admins only".to_string(),
        ));
    }
    let stats = state.dashboard_stats().await?;
    Ok(clock.respond(stats).with_link("self", "/api/v1/stats"))
}
