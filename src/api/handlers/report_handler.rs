//! Report handlers.

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::api::extractors::ValidatedQuery;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{DispatchSchedule, PendingSummary, UserPending, WeeklySummary};
use crate::types::ApiResponse;

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct PendingSummaryQuery {
    /// Local date, `YYYY-MM-DD`
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct WindowQuery {
    /// Window length in days (default 7, at most 31)
    pub days: Option<u32>,
}

/// Create report routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/pending-summary", get(pending_summary))
        .route("/user-pending", get(user_pending))
        .route("/weekly-summary", get(weekly_summary))
        .route("/dispatch-upcoming", get(dispatch_upcoming))
}

/// Pending orders per stage among orders updated on a day
#[utoipa::path(
    get,
    path = "/reports/pending-summary",
    tag = "Reports",
    params(PendingSummaryQuery),
    responses(
        (status = 200, description = "Pending counts", body = PendingSummary),
        (status = 400, description = "Missing or malformed date")
    )
)]
pub async fn pending_summary(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PendingSummaryQuery>,
) -> AppResult<Json<ApiResponse<PendingSummary>>> {
    let summary = state
        .report_service
        .pending_summary(query.date.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Open work per staff member
#[utoipa::path(
    get,
    path = "/reports/user-pending",
    tag = "Reports",
    responses((status = 200, description = "Pending count per user", body = [UserPending]))
)]
pub async fn user_pending(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<UserPending>>>> {
    let rows = state.report_service.user_pending().await?;
    Ok(Json(ApiResponse::success(rows)))
}

/// Orders received and completed per day, ending today
#[utoipa::path(
    get,
    path = "/reports/weekly-summary",
    tag = "Reports",
    params(WindowQuery),
    responses(
        (status = 200, description = "One row per day", body = WeeklySummary),
        (status = 400, description = "Window out of range")
    )
)]
pub async fn weekly_summary(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<WindowQuery>,
) -> AppResult<Json<ApiResponse<WeeklySummary>>> {
    let summary = state.report_service.weekly_summary(query.days).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Unshipped orders by dispatch date, starting today
#[utoipa::path(
    get,
    path = "/reports/dispatch-upcoming",
    tag = "Reports",
    params(WindowQuery),
    responses(
        (status = 200, description = "One row per day", body = DispatchSchedule),
        (status = 400, description = "Window out of range")
    )
)]
pub async fn dispatch_upcoming(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<WindowQuery>,
) -> AppResult<Json<ApiResponse<DispatchSchedule>>> {
    let schedule = state.report_service.dispatch_upcoming(query.days).await?;
    Ok(Json(ApiResponse::success(schedule)))
}
