use actix_web::{web, HttpResponse, ResponseError};

use crate::api::require_admin;
use crate::middleware::auth::Claims;
use crate::models::{PushTokenRequest, UpdateProfileRequest, UserListQuery, UserProfile};
use crate::services::user_service;
use crate::state::AppState;

/// GET /api/v1/me
pub async fn get_me(state: web::Data<AppState>, claims: web::ReqData<Claims>) -> HttpResponse {
    log::info!("👤 GET /me - user: {}", claims.sub);

    match user_service::get_profile(state.users.as_ref(), &claims.sub).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::error!("❌ Failed to get user {}: {}", claims.sub, e);
            e.error_response()
        }
    }
}

/// PUT /api/v1/me
pub async fn update_me(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<UpdateProfileRequest>,
) -> HttpResponse {
    log::info!("✏️ PUT /me - user: {}", claims.sub);

    match user_service::update_profile(state.users.as_ref(), &claims.sub, &request).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::warn!("❌ Profile update failed for {}: {}", claims.sub, e);
            e.error_response()
        }
    }
}

/// PUT /api/v1/me/push-token
pub async fn set_push_token(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<PushTokenRequest>,
) -> HttpResponse {
    log::info!("🔔 PUT /me/push-token - user: {}", claims.sub);

    match user_service::set_push_token(state.users.as_ref(), &claims.sub, &request.token).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            log::warn!("❌ Push token update failed for {}: {}", claims.sub, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(("pending" = Option<bool>, Query, description = "Only accounts awaiting approval")),
    responses(
        (status = 200, description = "Users", body = [UserProfile]),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    query: web::Query<UserListQuery>,
) -> HttpResponse {
    log::info!("👥 GET /users - pending: {:?}", query.pending);

    if let Err(e) = require_admin(&claims) {
        return e.error_response();
    }

    match user_service::list_users(state.users.as_ref(), query.pending.unwrap_or(false)).await {
        Ok(users) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "total": users.len(),
            "users": users
        })),
        Err(e) => {
            log::error!("❌ Failed to list users: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/approve",
    tag = "Users",
    params(("user_id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User approved", body = UserProfile),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_user(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    log::info!("✅ POST /users/{}/approve - by: {}", user_id, claims.sub);

    if let Err(e) = require_admin(&claims) {
        return e.error_response();
    }

    match user_service::approve_user(state.users.as_ref(), &user_id).await {
        Ok(user) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "user": user
        })),
        Err(e) => {
            log::warn!("❌ Approval failed for {}: {}", user_id, e);
            e.error_response()
        }
    }
}
