//! Order handlers - worklists, lookup and staff mutations.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::extractors::{ValidatedJson, ValidatedQuery};
use crate::api::AppState;
use crate::config::{DESIGN_UPLOAD_FIELD, MAX_DESIGN_UPLOAD_BYTES};
use crate::domain::Order;
use crate::errors::{AppError, AppResult};
use crate::types::ApiResponse;

/// Worklist query
#[derive(Debug, Deserialize, Validate, IntoParams)]
pub struct WorklistQuery {
    /// One of admin, customer, design, printing, fusing, stitching, shipping
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
    /// Username; required for the design role
    pub user: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdvanceStageRequest {
    #[validate(length(min = 1, message = "stage is required"))]
    #[schema(example = "printing")]
    pub stage: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignDesignerRequest {
    #[validate(length(min = 1, message = "designer is required"))]
    #[schema(example = "meera")]
    pub designer: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DispatchDateRequest {
    #[validate(length(min = 1, message = "date is required"))]
    #[schema(example = "2024-07-01")]
    pub date: String,
}

/// Multipart body of a design upload
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct DesignUpload {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DesignUploaded {
    /// Stored file reference, served under /uploads
    #[schema(example = "design_1718000000000_3f2b9c4e8a1d4f6b9e7c2a5d1b0e8f47.png")]
    pub file: String,
}

/// Create order routes
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(worklist))
        .route("/:id", get(get_order))
        .route("/:id/advance-stage", post(advance_stage))
        .route("/:id/assign-designer", post(assign_designer))
        .route("/:id/dispatch-date", post(set_dispatch_date))
        .route(
            "/:id/design",
            post(upload_design).layer(DefaultBodyLimit::max(MAX_DESIGN_UPLOAD_BYTES)),
        )
}

/// Orders waiting on the caller's stage
#[utoipa::path(
    get,
    path = "/orders",
    tag = "Orders",
    params(WorklistQuery),
    responses(
        (status = 200, description = "Worklist, most recently updated first", body = OrderList),
        (status = 400, description = "Unknown role or missing user")
    )
)]
pub async fn worklist(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<WorklistQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let orders = state
        .order_service
        .worklist(&query.role, query.user.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(OrderList { orders })))
}

/// Look up an order by id or display name
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "Orders",
    params(("id" = String, Path, description = "External id or display name, with or without '#'")),
    responses(
        (status = 200, description = "Order found", body = Order),
        (status = 404, description = "Order not found")
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service.lookup(&id).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Mark a stage done
#[utoipa::path(
    post,
    path = "/orders/{id}/advance-stage",
    tag = "Orders",
    params(("id" = String, Path, description = "External id or display name")),
    request_body = AdvanceStageRequest,
    responses(
        (status = 200, description = "Stage marked done", body = Order),
        (status = 400, description = "Unknown stage or stage out of sequence"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn advance_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<AdvanceStageRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.order_service.advance(&id, &payload.stage).await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Assign a designer
#[utoipa::path(
    post,
    path = "/orders/{id}/assign-designer",
    tag = "Orders",
    params(("id" = String, Path, description = "External id or display name")),
    request_body = AssignDesignerRequest,
    responses(
        (status = 200, description = "Designer assigned", body = Order),
        (status = 400, description = "Not a design-role user"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn assign_designer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<AssignDesignerRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .order_service
        .assign_designer(&id, &payload.designer)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Set the dispatch date
#[utoipa::path(
    post,
    path = "/orders/{id}/dispatch-date",
    tag = "Orders",
    params(("id" = String, Path, description = "External id or display name")),
    request_body = DispatchDateRequest,
    responses(
        (status = 200, description = "Dispatch date stored", body = Order),
        (status = 400, description = "Date is not YYYY-MM-DD"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn set_dispatch_date(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<DispatchDateRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state
        .order_service
        .set_dispatch_date(&id, &payload.date)
        .await?;
    Ok(Json(ApiResponse::success(order)))
}

/// Upload a design image and mark design done
#[utoipa::path(
    post,
    path = "/orders/{id}/design",
    tag = "Orders",
    params(("id" = String, Path, description = "External id or display name")),
    request_body(content = DesignUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Design stored", body = DesignUploaded),
        (status = 400, description = "Missing or empty image"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn upload_design(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<DesignUploaded>>> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some(DESIGN_UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        upload = Some((file_name, bytes.to_vec()));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| {
        AppError::validation(format!("Multipart field '{}' is required", DESIGN_UPLOAD_FIELD))
    })?;

    let file = state
        .order_service
        .attach_design(&id, file_name, bytes)
        .await?;
    Ok(Json(ApiResponse::success(DesignUploaded { file })))
}
