use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Load Board Service API",
        version = "1.0.0",
        description = "Freight load listings, driver approval and delivery receipts.\n\n**Authentication:** everything except `/health` and `/api/v1/auth/*` requires a JWT Bearer token obtained from login. Accounts must be approved by an admin before they can log in."
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::reset_password,

        // Health
        crate::api::health::health_check,

        // Users
        crate::api::users::list_users,
        crate::api::users::approve_user,

        // Loads
        crate::api::loads::add_load,
        crate::api::loads::get_today_loads,
        crate::api::loads::get_loads,
        crate::api::loads::update_load,
        crate::api::loads::delete_load,

        // Receipts
        crate::api::receipts::upload_receipt,
        crate::api::receipts::delete_standalone_receipt,
        crate::api::receipts::get_receipt_storage_ids,
        crate::api::receipts::generate_upload_url,
    ),
    components(
        schemas(
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::ResetPasswordRequest,
            crate::models::UserProfile,
            crate::models::UserType,
            crate::services::auth_service::AuthResponse,
            crate::api::health::HealthResponse,
            crate::models::LoadInput,
            crate::models::LoadResponse,
            crate::models::WeightUnit,
            crate::models::LengthUnit,
            crate::models::BodyType,
            crate::models::AttachReceiptRequest,
            crate::models::SaveReceiptRequest,
            crate::models::DeleteReceiptRequest,
            crate::models::ReceiptDescriptor,
            crate::models::ReceiptKind,
            crate::services::receipt_service::ReceiptDeletion,
            crate::services::storage_service::UploadUrlResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Phone + password registration, login and password reset."),
        (name = "Health", description = "Service health."),
        (name = "Users", description = "Admin-only account listing and approval."),
        (name = "Loads", description = "Freight load listings."),
        (name = "Receipts", description = "Proof-of-delivery files, attached to loads or standalone."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token returned by /api/v1/auth/login"))
                        .build(),
                ),
            );
        }
    }
}
