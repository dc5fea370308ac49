pub mod auth;
pub mod health;
pub mod loads;
pub mod receipts;
pub mod swagger;
pub mod users;

use actix_web::{web, HttpRequest};

use crate::middleware::{auth::Claims, AuthMiddleware};
use crate::utils::AppError;

pub(crate) fn require_admin(claims: &Claims) -> Result<(), AppError> {
    if !claims.is_admin {
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }
    Ok(())
}

/// Extractor failures (bad JSON, unknown enum literal, bad query) answer
/// with the same envelope as every other error.
fn invalid_payload(err: impl std::fmt::Display, req: &HttpRequest) -> actix_web::Error {
    log::warn!("❌ Rejected request payload for {}: {}", req.path(), err);
    AppError::InvalidRequest(err.to_string()).into()
}

/// Registers every `/api/v1` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .app_data(web::JsonConfig::default().error_handler(|err, req| invalid_payload(err, req)))
        .app_data(web::QueryConfig::default().error_handler(|err, req| invalid_payload(err, req)))
        .app_data(web::PathConfig::default().error_handler(|err, req| invalid_payload(err, req)))
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Auth endpoints (public)
        .service(
            web::scope("/api/v1/auth")
                .route("/register", web::post().to(auth::register))
                .route("/login", web::post().to(auth::login))
                .route("/reset-password", web::post().to(auth::reset_password)),
        )
        // Current user - Requires JWT
        .service(
            web::scope("/api/v1/me")
                .wrap(AuthMiddleware)
                .route("", web::get().to(users::get_me))
                .route("", web::put().to(users::update_me))
                .route("/push-token", web::put().to(users::set_push_token)),
        )
        // User administration - Requires admin JWT
        .service(
            web::scope("/api/v1/users")
                .wrap(AuthMiddleware)
                .route("", web::get().to(users::list_users))
                .route("/{user_id}/approve", web::post().to(users::approve_user)),
        )
        // Loads: CRUD + receipt attachment - Requires JWT
        .service(
            web::scope("/api/v1/loads")
                .wrap(AuthMiddleware)
                .route("", web::post().to(loads::add_load))
                .route("", web::get().to(loads::get_loads))
                .route("/today", web::get().to(loads::get_today_loads))
                .route("/{load_id}", web::get().to(loads::get_load))
                .route("/{load_id}", web::put().to(loads::update_load))
                .route("/{load_id}", web::delete().to(loads::delete_load))
                .route("/{load_id}/receipt", web::post().to(receipts::upload_receipt))
                .route("/{load_id}/receipt", web::delete().to(receipts::remove_load_receipt)),
        )
        // Standalone receipts - Requires JWT
        .service(
            web::scope("/api/v1/receipts")
                .wrap(AuthMiddleware)
                .route("", web::get().to(receipts::get_receipt_storage_ids))
                .route("", web::post().to(receipts::save_standalone_receipt))
                .route("/delete", web::post().to(receipts::delete_standalone_receipt))
                .route("/upload-url", web::post().to(receipts::generate_upload_url)),
        );
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use actix_web::{test, App};
    use std::sync::Arc;

    use crate::database::MemoryStore;
    use crate::models::{User, UserType};
    use crate::services::auth_service::{generate_jwt, tests::test_settings};
    use crate::services::notification_service::tests::RecordingTransport;
    use crate::services::storage_service::tests::RecordingStorage;
    use crate::state::AppState;

    pub(crate) enum TestUser {
        Member,
        Admin,
    }

    pub(crate) fn test_state() -> (AppState, Arc<MemoryStore>, Arc<RecordingStorage>) {
        let store = Arc::new(MemoryStore::new());
        let storage = Arc::new(RecordingStorage::default());
        let state = AppState::new(
            store.clone(),
            storage.clone(),
            Arc::new(RecordingTransport::default()),
            test_settings(),
        );
        (state, store, storage)
    }

    /// Inserts an approved account of the given kind and returns its
    /// `Authorization` header value.
    pub(crate) async fn bearer(state: &AppState, who: TestUser) -> String {
        let (phone, is_admin, user_type) = match who {
            TestUser::Member => ("9990009999", false, UserType::Driver),
            TestUser::Admin => ("9000000000", true, UserType::Admin),
        };

        let mut user = User {
            id: None,
            name: "Test".into(),
            phone: phone.into(),
            transport_name: "Test Transport".into(),
            password: bcrypt::hash("secret1", 4).unwrap(),
            address: "Test Nagar".into(),
            user_type,
            is_admin,
            is_approved: true,
            document_url: None,
            document_storage_id: None,
            created_at: 0,
            push_token: None,
        };
        user.id = Some(state.users.insert_user(user.clone()).await.unwrap());

        format!("Bearer {}", generate_jwt(&state.auth, &user).unwrap())
    }

    #[actix_web::test]
    async fn registration_approval_login_flow() {
        let (state, _, _) = test_state();
        let admin = bearer(&state, TestUser::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(serde_json::json!({
                "name": "Ravi",
                "phone": "9990001111",
                "transport_name": "Ravi Roadlines",
                "address": "Nagpur",
                "user_type": "driver",
                "password": "secret1",
                "confirm_password": "secret1",
                "is_admin": true,
                "is_approved": true
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["is_admin"], false);
        assert_eq!(body["user"]["is_approved"], false);
        let user_id = body["user"]["id"].as_str().unwrap().to_string();

        let login = || {
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(serde_json::json!({ "phone": "9990001111", "password": "secret1" }))
                .to_request()
        };

        let resp = test::call_service(&app, login()).await;
        assert_eq!(resp.status(), 401);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Account not approved");

        let req = test::TestRequest::post()
            .uri(&format!("/api/v1/users/{}/approve", user_id))
            .insert_header(("Authorization", admin))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let resp = test::call_service(&app, login()).await;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["user"]["is_approved"], true);
        assert!(body["user"].get("password").is_none());
        assert!(body["token"].as_str().is_some());
    }

    #[actix_web::test]
    async fn members_cannot_list_users() {
        let (state, _, _) = test_state();
        let member = bearer(&state, TestUser::Member).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/users?pending=true")
            .insert_header(("Authorization", member))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);
    }

    #[actix_web::test]
    async fn malformed_query_gets_error_envelope() {
        let (state, _, _) = test_state();
        let admin = bearer(&state, TestUser::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/users?pending=maybe")
            .insert_header(("Authorization", admin))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("Invalid request"));
    }

    #[actix_web::test]
    async fn unknown_user_type_gets_error_envelope() {
        let (state, _, _) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(serde_json::json!({
                "name": "Ravi",
                "phone": "9990001111",
                "transport_name": "Ravi Roadlines",
                "address": "Nagpur",
                "user_type": "owner",
                "password": "secret1",
                "confirm_password": "secret1"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("owner"));
    }
}
