use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::conversion::ConversionResponse;
use crate::services::quotations::{
    AvailabilityReport, ChangeStatusRequest, CheckStockRequest, CreateQuotationRequest,
    NewLineItem, PreviewTotalsRequest, PreviewTotalsResponse, QuotationFilter,
    QuotationListResponse, QuotationResponse, QuotationWithItems, SendQuotationRequest,
    StockCheckResult,
};
use crate::{ApiResponse, ApiResult, AppState, ListQuery};

pub fn quotation_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quotation).get(list_quotations))
        .route("/preview-totals", post(preview_totals))
        .route("/check-stock", post(check_stock))
        .route("/expire-overdue", post(expire_overdue))
        .route("/:id", get(get_quotation))
        .route("/:id/items", post(add_line_item))
        .route(
            "/:id/items/:item_id",
            put(update_line_quantity).delete(remove_line_item),
        )
        .route("/:id/status", post(change_status))
        .route("/:id/send", post(send_quotation))
        .route("/:id/convert", post(convert_quotation))
        .route("/:id/validate-availability", post(validate_availability))
        .route("/:id/archive", post(archive_quotation))
        .route("/:id/restore", post(restore_quotation))
        .route("/:id/commission-paid", post(mark_commission_paid))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityBody {
    #[validate(range(min = 1))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct ActingUserBody {
    pub changed_by: Uuid,
}

async fn create_quotation(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuotationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let created = state.services.quotations.create_quotation(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_quotations(
    State(state): State<AppState>,
    Query(page): Query<ListQuery>,
    Query(filter): Query<QuotationFilter>,
) -> ApiResult<QuotationListResponse> {
    let list = state
        .services
        .quotations
        .list_quotations(filter, page.page, page.limit)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}

async fn get_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuotationWithItems> {
    let quotation = state.services.quotations.get_quotation(id).await?;
    Ok(Json(ApiResponse::success(quotation)))
}

async fn add_line_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewLineItem>,
) -> ApiResult<QuotationWithItems> {
    let updated = state.services.quotations.add_line_item(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn update_line_quantity(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateQuantityBody>,
) -> ApiResult<QuotationWithItems> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
    let updated = state
        .services
        .quotations
        .update_line_quantity(id, item_id, payload.quantity)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn remove_line_item(
    State(state): State<AppState>,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<QuotationWithItems> {
    let updated = state
        .services
        .quotations
        .remove_line_item(id, item_id)
        .await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<QuotationResponse> {
    let updated = state.services.quotations.change_status(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn send_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SendQuotationRequest>,
) -> ApiResult<QuotationResponse> {
    let updated = state.services.quotations.send_quotation(id, payload).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn convert_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActingUserBody>,
) -> ApiResult<ConversionResponse> {
    let conversion = state
        .services
        .conversion
        .convert(id, payload.changed_by)
        .await?;
    Ok(Json(ApiResponse::success(conversion)))
}

async fn validate_availability(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<AvailabilityReport> {
    let report = state.services.quotations.validate_availability(id).await?;
    Ok(Json(ApiResponse::success(report)))
}

async fn archive_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActingUserBody>,
) -> ApiResult<QuotationResponse> {
    let archived = state
        .services
        .quotations
        .archive(id, payload.changed_by)
        .await?;
    Ok(Json(ApiResponse::success(archived)))
}

async fn restore_quotation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ActingUserBody>,
) -> ApiResult<QuotationResponse> {
    let restored = state
        .services
        .quotations
        .restore(id, payload.changed_by)
        .await?;
    Ok(Json(ApiResponse::success(restored)))
}

async fn mark_commission_paid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<QuotationResponse> {
    let updated = state.services.quotations.mark_commission_paid(id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

async fn preview_totals(
    State(state): State<AppState>,
    Json(payload): Json<PreviewTotalsRequest>,
) -> ApiResult<PreviewTotalsResponse> {
    let preview = state
        .services
        .quotations
        .calculate_totals_preview(payload)
        .await?;
    Ok(Json(ApiResponse::success(preview)))
}

async fn check_stock(
    State(state): State<AppState>,
    Json(payload): Json<CheckStockRequest>,
) -> ApiResult<Vec<StockCheckResult>> {
    let results = state.services.quotations.check_stock(payload).await?;
    Ok(Json(ApiResponse::success(results)))
}

async fn expire_overdue(
    State(state): State<AppState>,
    Json(payload): Json<ActingUserBody>,
) -> ApiResult<serde_json::Value> {
    let expired = state
        .services
        .quotations
        .expire_overdue(payload.changed_by)
        .await?;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "expired": expired }),
    )))
}
