use actix_web::{web, HttpResponse, ResponseError};

use crate::api::require_admin;
use crate::middleware::auth::Claims;
use crate::models::{
    AttachReceiptRequest, DeleteReceiptRequest, LoadResponse, ReceiptDescriptor,
    SaveReceiptRequest,
};
use crate::services::receipt_service;
use crate::services::storage_service::UploadUrlResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/loads/{load_id}/receipt",
    tag = "Receipts",
    params(("load_id" = String, Path, description = "Load id")),
    request_body = AttachReceiptRequest,
    responses(
        (status = 200, description = "Receipt attached", body = LoadResponse),
        (status = 404, description = "Load not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_receipt(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<AttachReceiptRequest>,
) -> HttpResponse {
    let load_id = path.into_inner();
    log::info!("🧾 POST /loads/{}/receipt - id: {}", load_id, request.public_id);

    match receipt_service::upload_receipt(state.loads.as_ref(), &load_id, &request).await {
        Ok(load) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "load": LoadResponse::from(load)
        })),
        Err(e) => {
            log::warn!("❌ Receipt upload failed for {}: {}", load_id, e);
            e.error_response()
        }
    }
}

/// DELETE /api/v1/loads/{load_id}/receipt
pub async fn remove_load_receipt(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let load_id = path.into_inner();
    log::info!("🧾 DELETE /loads/{}/receipt", load_id);

    match receipt_service::remove_load_receipt(
        state.loads.as_ref(),
        state.storage.as_ref(),
        &load_id,
    )
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "load": LoadResponse::from(outcome.value),
            "cleanup": outcome.cleanup
        })),
        Err(e) => {
            log::warn!("❌ Receipt removal failed for {}: {}", load_id, e);
            e.error_response()
        }
    }
}

/// POST /api/v1/receipts
pub async fn save_standalone_receipt(
    state: web::Data<AppState>,
    request: web::Json<SaveReceiptRequest>,
) -> HttpResponse {
    log::info!("🧾 POST /receipts - id: {}", request.public_id);

    match receipt_service::save_standalone_receipt(state.receipts.as_ref(), &request).await {
        Ok(receipt) => HttpResponse::Created().json(serde_json::json!({
            "success": true,
            "id": receipt.id.map(|id| id.to_hex()).unwrap_or_default(),
            "storage_id": receipt.storage_id,
            "created_at": receipt.created_at
        })),
        Err(e) => {
            log::warn!("❌ Standalone receipt failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/receipts/delete",
    tag = "Receipts",
    request_body = DeleteReceiptRequest,
    responses(
        (status = 200, description = "Receipt removed; `cleanup` reports the remote file"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_standalone_receipt(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<DeleteReceiptRequest>,
) -> HttpResponse {
    log::info!("🗑️ POST /receipts/delete - id: {}", request.storage_id);

    if let Err(e) = require_admin(&claims) {
        return e.error_response();
    }

    match receipt_service::delete_standalone_receipt(
        state.loads.as_ref(),
        state.receipts.as_ref(),
        state.storage.as_ref(),
        &request.storage_id,
    )
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "result": outcome.value,
            "cleanup": outcome.cleanup
        })),
        Err(e) => {
            log::warn!("❌ Receipt deletion failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/receipts",
    tag = "Receipts",
    responses((status = 200, description = "Every known receipt", body = [ReceiptDescriptor])),
    security(("bearer_auth" = []))
)]
pub async fn get_receipt_storage_ids(state: web::Data<AppState>) -> HttpResponse {
    log::info!("🧾 GET /receipts");

    match receipt_service::get_receipt_storage_ids(state.loads.as_ref(), state.receipts.as_ref())
        .await
    {
        Ok(receipts) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": receipts.len(),
            "receipts": receipts
        })),
        Err(e) => {
            log::error!("❌ Failed to list receipts: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/receipts/upload-url",
    tag = "Receipts",
    responses(
        (status = 200, description = "Short-lived upload URL", body = UploadUrlResponse),
        (status = 502, description = "Storage unavailable")
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_upload_url(state: web::Data<AppState>) -> HttpResponse {
    log::info!("⬆️ POST /receipts/upload-url");

    match receipt_service::generate_upload_url(state.storage.as_ref()).await {
        Ok(upload_url) => HttpResponse::Ok().json(UploadUrlResponse {
            success: true,
            upload_url,
        }),
        Err(e) => {
            log::error!("❌ Upload URL generation failed: {}", e);
            e.error_response()
        }
    }
}
