use actix_cors::Cors;
use actix_web::{middleware::Compress, middleware::Logger, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gallery_service::api;
use gallery_service::config::AppConfig;
use gallery_service::database::{MongoDB, MongoStore};
use gallery_service::middleware::SecurityHeaders;
use gallery_service::services::UploadSettings;
use gallery_service::AppServices;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting Gallery Service...");
    log::info!("📊 Database: {}", config.db_name);

    // Initialize MongoDB connection
    let db = match MongoDB::new(&config.mongo_uri, &config.db_name).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        }
    };
    log::info!("✅ MongoDB connected successfully");

    if let Err(e) = db.ensure_indexes(&config.collections).await {
        log::warn!("⚠️  Index creation warning: {}", e);
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    log::info!("📁 Uploads stored in {}", config.upload_dir.display());

    let store = Arc::new(MongoStore::new(db, config.collections.clone()));
    let services = AppServices::from_store(
        store,
        &config.jwt_secret,
        UploadSettings::new(config.upload_dir.clone()),
    );

    let static_dir = config.static_dir.clone();
    let upload_dir = config.upload_dir.clone();

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", config.host, config.port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", config.host, config.port);

    // Start HTTP server
    HttpServer::new(move || {
        // Dev front end origins; production serves the SPA from this process
        let cors = Cors::default()
            .allowed_origin("http://localhost:5173")
            .allowed_origin("http://127.0.0.1:5173")
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);

        let openapi = api::swagger::ApiDoc::openapi();
        let static_dir = static_dir.clone();
        let upload_dir = upload_dir.clone();

        App::new()
            .wrap(cors)
            .wrap(SecurityHeaders)
            .wrap(Compress::default())
            .wrap(Logger::default())
            .configure(|cfg| services.configure(cfg))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", openapi))
            // Static assets last: the SPA fallback answers every unmatched path
            .configure(move |cfg| api::assets::configure(cfg, &static_dir, &upload_dir))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
