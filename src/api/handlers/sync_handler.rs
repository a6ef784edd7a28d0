//! Reconciliation handler.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::api::extractors::ValidatedQuery;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{SyncMode, SyncReport};
use crate::types::ApiResponse;

#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct SyncQuery {
    /// `full` (default) or `fast`
    pub mode: Option<String>,
}

/// Create sync routes
pub fn sync_routes() -> Router<AppState> {
    Router::new().route("/", post(sync_orders))
}

/// Pull the latest feed page and reconcile it into the store
#[utoipa::path(
    post,
    path = "/sync",
    tag = "Sync",
    params(SyncQuery),
    responses(
        (status = 200, description = "Reconciliation finished", body = SyncReport),
        (status = 400, description = "Unknown mode"),
        (status = 500, description = "Order feed unavailable")
    )
)]
pub async fn sync_orders(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<SyncQuery>,
) -> AppResult<Json<ApiResponse<SyncReport>>> {
    let mode = match query.mode.as_deref().map(str::trim) {
        None | Some("") => SyncMode::default(),
        Some(raw) => raw.parse()?,
    };

    let report = state.sync_service.reconcile(mode).await?;
    let message = format!("Imported {} new orders", report.imported);
    Ok(Json(ApiResponse::with_message(report, message)))
}
