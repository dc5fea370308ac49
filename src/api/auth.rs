use actix_web::{web, HttpResponse, ResponseError};

use crate::models::{LoginRequest, RegisterRequest, ResetPasswordRequest, UserProfile};
use crate::services::auth_service::{self, AuthResponse};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, awaiting approval", body = UserProfile),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Phone number already registered")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> HttpResponse {
    log::info!("📝 POST /auth/register - phone: {}", request.phone);

    match auth_service::register(state.users.as_ref(), &state.auth, &request).await {
        Ok(user) => {
            log::info!("✅ Registration successful: {}", request.phone);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "user": user
            }))
        }
        Err(e) => {
            log::warn!("❌ Registration failed: {} - {}", request.phone, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials, invalid password or account not approved")
    )
)]
pub async fn login(state: web::Data<AppState>, request: web::Json<LoginRequest>) -> HttpResponse {
    log::info!("🔐 POST /auth/login - phone: {}", request.phone);

    match auth_service::login(state.users.as_ref(), &state.auth, &request).await {
        Ok(response) => {
            log::info!("✅ Login successful: {}", request.phone);
            HttpResponse::Ok().json(response)
        }
        Err(e) => {
            log::warn!("❌ Login failed: {} - {}", request.phone, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = UserProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn reset_password(
    state: web::Data<AppState>,
    request: web::Json<ResetPasswordRequest>,
) -> HttpResponse {
    log::info!("🔑 POST /auth/reset-password - phone: {}", request.phone);

    match auth_service::reset_password(state.users.as_ref(), &state.auth, &request).await {
        Ok(user) => {
            log::info!("✅ Password reset: {}", request.phone);
            HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "user": user
            }))
        }
        Err(e) => {
            log::warn!("❌ Password reset failed: {} - {}", request.phone, e);
            e.error_response()
        }
    }
}
