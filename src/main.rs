use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::io;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use load_board::api;
use load_board::config::{AppConfig, StoreBackend};
use load_board::database::{MemoryStore, MongoDB};
use load_board::seeds::admin_seed;
use load_board::services::notification_service::HttpPushTransport;
use load_board::services::storage_service::HttpFileStorage;
use load_board::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("❌ Invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    log::info!("🚀 Starting Load Board Service...");

    let storage = Arc::new(HttpFileStorage::new(
        &config.storage_base_url,
        config.storage_api_key.clone(),
    ));
    let push = Arc::new(HttpPushTransport::new(&config.push_endpoint));

    let state = match config.store_backend {
        StoreBackend::MongoDB => {
            let database_url = config.database_url.clone().unwrap_or_default();
            log::info!("📊 Database: {}", database_url);
            let db = MongoDB::new(&database_url).await.map_err(|e| {
                log::error!("❌ Failed to connect to MongoDB: {}", e);
                io::Error::new(io::ErrorKind::ConnectionRefused, e.to_string())
            })?;
            log::info!("✅ MongoDB connected successfully");
            AppState::new(Arc::new(db), storage, push, config.auth.clone())
        }
        StoreBackend::Memory => {
            log::warn!("⚠️  Using in-memory store, data is lost on restart");
            AppState::new(Arc::new(MemoryStore::new()), storage, push, config.auth.clone())
        }
    };

    // 🌱 Seed admin account
    if let Some(seed) = &config.admin_seed {
        log::info!("🌱 Seeding admin account...");
        if let Err(e) = admin_seed::seed_admin(state.users.as_ref(), &state.auth, seed).await {
            log::error!("❌ Admin seed failed: {}", e);
        }
    }

    let host = config.host.clone();
    let port = config.port;

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    let state_data = web::Data::new(state);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(api::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
