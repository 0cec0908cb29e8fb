pub mod assets;
pub mod auth;
pub mod health;
pub mod images;
pub mod swagger;

use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::middleware::AuthMiddleware;
use crate::utils::error::AppError;

/// Largest JSON body accepted by the API
pub const JSON_LIMIT: usize = 100 * 1024;

/// Registers health, auth and image routes.
///
/// Expects `CredentialsService`, `ImageService`, `AuthTokens` and
/// `UploadSettings` to be registered as `web::Data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_LIMIT)
            .error_handler(|err, _req| match err {
                // Oversized bodies stay distinguishable from malformed ones
                JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                    AppError::UnprocessableEntity(err.to_string()).into()
                }
                _ => AppError::bad_request(err.to_string()).into(),
            }),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::bad_request(err.to_string()).into()),
    )
    // Health check
    .route("/health", web::get().to(health::health_check))
    // Auth endpoints
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .default_service(web::to(route_not_found)),
    )
    // Images - require JWT
    .service(
        web::scope("/api")
            .service(
                web::scope("/images")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(images::list_images))
                    .route("", web::post().to(images::upload_image))
                    .route("/{id}", web::patch().to(images::update_image_name))
                    .default_service(web::to(route_not_found)),
            )
            .default_service(web::to(route_not_found)),
    );
}

/// JSON 404 for unmatched API paths
pub async fn route_not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::not_found(format!("No route for {} {}", req.method(), req.path())))
}
