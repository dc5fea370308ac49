use actix_web::{web, HttpResponse, ResponseError};

use crate::api::require_admin;
use crate::middleware::auth::Claims;
use crate::models::{LoadInput, LoadQuery, LoadResponse};
use crate::services::{load_service, notification_service};
use crate::state::AppState;

fn load_list(loads: Vec<crate::models::Load>) -> HttpResponse {
    let loads: Vec<LoadResponse> = loads.into_iter().map(LoadResponse::from).collect();
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": loads.len(),
        "loads": loads
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/loads",
    tag = "Loads",
    request_body = LoadInput,
    responses(
        (status = 201, description = "Load posted", body = LoadResponse),
        (status = 400, description = "Invalid load")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_load(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    request: web::Json<LoadInput>,
) -> HttpResponse {
    log::info!("📦 POST /loads - by: {}", claims.sub);

    match load_service::add_load(state.loads.as_ref(), request.into_inner()).await {
        Ok(load) => {
            // Fire and forget: the poster does not wait for push delivery
            let users = state.users.clone();
            let push = state.push.clone();
            let created = load.clone();
            actix_web::rt::spawn(async move {
                match notification_service::notify_new_load(users.as_ref(), push.as_ref(), &created).await {
                    Ok(report) if report.all_succeeded() => {
                        log::info!("📨 Load notification sent to {} devices", report.sent)
                    }
                    Ok(report) => log::warn!(
                        "⚠️  Load notification partially failed: {} sent, {} batch(es) failed",
                        report.sent,
                        report.failed_batches.len()
                    ),
                    Err(e) => log::warn!("⚠️  Load notification skipped: {}", e),
                }
            });

            let load = LoadResponse::from(load);
            HttpResponse::Created().json(serde_json::json!({
                "success": true,
                "load_id": load.id,
                "load": load
            }))
        }
        Err(e) => {
            log::warn!("❌ Load creation failed: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/loads/today",
    tag = "Loads",
    responses((status = 200, description = "Loads posted today", body = [LoadResponse])),
    security(("bearer_auth" = []))
)]
pub async fn get_today_loads(state: web::Data<AppState>) -> HttpResponse {
    log::info!("📅 GET /loads/today");

    match load_service::get_today_loads(state.loads.as_ref()).await {
        Ok(loads) => load_list(loads),
        Err(e) => {
            log::error!("❌ Failed to fetch today's loads: {}", e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/loads",
    tag = "Loads",
    params(
        ("date_from" = Option<String>, Query, description = "Inclusive lower bound, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Inclusive upper bound, YYYY-MM-DD"),
        ("location" = Option<String>, Query, description = "Case-insensitive origin/destination match")
    ),
    responses((status = 200, description = "Filtered loads", body = [LoadResponse])),
    security(("bearer_auth" = []))
)]
pub async fn get_loads(state: web::Data<AppState>, query: web::Query<LoadQuery>) -> HttpResponse {
    log::info!(
        "🔎 GET /loads - from: {:?}, to: {:?}, location: {:?}",
        query.date_from,
        query.date_to,
        query.location
    );

    match load_service::get_loads(state.loads.as_ref(), &query).await {
        Ok(loads) => load_list(loads),
        Err(e) => {
            log::error!("❌ Failed to fetch loads: {}", e);
            e.error_response()
        }
    }
}

/// GET /api/v1/loads/{load_id}
pub async fn get_load(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let load_id = path.into_inner();

    match load_service::get_load(state.loads.as_ref(), &load_id).await {
        Ok(load) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "load": LoadResponse::from(load)
        })),
        Err(e) => e.error_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/loads/{load_id}",
    tag = "Loads",
    params(("load_id" = String, Path, description = "Load id")),
    request_body = LoadInput,
    responses(
        (status = 200, description = "Load updated", body = LoadResponse),
        (status = 404, description = "Load not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_load(
    state: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<LoadInput>,
) -> HttpResponse {
    let load_id = path.into_inner();
    log::info!("✏️ PUT /loads/{}", load_id);

    match load_service::update_load(state.loads.as_ref(), &load_id, request.into_inner()).await {
        Ok(load) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "load": LoadResponse::from(load)
        })),
        Err(e) => {
            log::warn!("❌ Load update failed for {}: {}", load_id, e);
            e.error_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/api/v1/loads/{load_id}",
    tag = "Loads",
    params(("load_id" = String, Path, description = "Load id")),
    responses(
        (status = 200, description = "Load deleted; `cleanup` reports the receipt file"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Load not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_load(
    state: web::Data<AppState>,
    claims: web::ReqData<Claims>,
    path: web::Path<String>,
) -> HttpResponse {
    let load_id = path.into_inner();
    log::info!("🗑️ DELETE /loads/{} - by: {}", load_id, claims.sub);

    if let Err(e) = require_admin(&claims) {
        return e.error_response();
    }

    match load_service::delete_load(state.loads.as_ref(), state.storage.as_ref(), &load_id).await {
        Ok(outcome) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "load_id": outcome.value,
            "cleanup": outcome.cleanup
        })),
        Err(e) => {
            log::warn!("❌ Load deletion failed for {}: {}", load_id, e);
            e.error_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{bearer, test_state, TestUser};
    use actix_web::{test, App};

    fn load_body() -> serde_json::Value {
        serde_json::json!({
            "current_locations": ["Pune", "Nashik"],
            "destination_locations": ["Delhi"],
            "weight": 5,
            "weight_unit": "ton",
            "truck_length": 20,
            "length_unit": "ft",
            "contact_number": "9876543210",
            "staff_contact_number": "9123456780",
            "body_type": "open body",
            "products": "Steel coils"
        })
    }

    #[actix_web::test]
    async fn post_then_list_today() {
        let (state, _, _) = test_state();
        let token = bearer(&state, TestUser::Member).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/loads")
            .insert_header(("Authorization", token.clone()))
            .set_json(load_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 201);

        let req = test::TestRequest::get()
            .uri("/api/v1/loads/today")
            .insert_header(("Authorization", token))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["loads"][0]["current_locations"][1], "Nashik");
        assert_eq!(body["loads"][0]["length_unit"], "ft");
    }

    #[actix_web::test]
    async fn unknown_body_type_is_rejected() {
        let (state, _, _) = test_state();
        let token = bearer(&state, TestUser::Member).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::api::configure),
        )
        .await;

        let mut body = load_body();
        body["body_type"] = serde_json::json!("tanker");
        let req = test::TestRequest::post()
            .uri("/api/v1/loads")
            .insert_header(("Authorization", token))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("tanker"), "unexpected error: {}", error);
        assert!(error.contains("open body"), "unexpected error: {}", error);
    }

    #[actix_web::test]
    async fn listing_requires_token() {
        let (state, _, _) = test_state();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/loads/today").to_request();
        let resp = test::try_call_service(&app, req).await;
        let status = match resp {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        };
        assert_eq!(status, 401);
    }

    #[actix_web::test]
    async fn only_admins_delete_loads() {
        let (state, _, storage) = test_state();
        let member = bearer(&state, TestUser::Member).await;
        let admin = bearer(&state, TestUser::Admin).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(crate::api::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/loads")
            .insert_header(("Authorization", member.clone()))
            .set_json(load_body())
            .to_request();
        let created: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let load_id = created["load_id"].as_str().unwrap().to_string();

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/loads/{}", load_id))
            .insert_header(("Authorization", member))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/v1/loads/{}", load_id))
            .insert_header(("Authorization", admin))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["cleanup"]["status"], "not_needed");
        assert!(storage.deleted().is_empty());
    }
}
