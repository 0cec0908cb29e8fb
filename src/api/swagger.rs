use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Image Gallery API",
        version = "1.0.0",
        description = "Register, log in, upload images and browse the gallery.\n\n**Authentication:** every `/api` endpoint requires a JWT Bearer token obtained from `/auth/register` or `/auth/login`."
    ),
    paths(
        // Auth endpoints
        crate::api::auth::register,
        crate::api::auth::login,

        // Images
        crate::api::images::list_images,
        crate::api::images::update_image_name,
        crate::api::images::upload_image,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            crate::api::auth::CredentialsRequest,
            crate::api::auth::TokenResponse,
            crate::models::ApiImage,
            crate::models::ApiAuthor,
            crate::models::UpdateImageNameRequest,
            crate::models::ImageUploadForm,
            crate::utils::error::ErrorResponse,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Username/password registration and login. Both return a bearer token valid for 24 hours."),
        (name = "Images", description = "Gallery listing, search, upload and renaming."),
        (name = "Health", description = "Service health check."),
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
                        .description(Some("Enter your JWT token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_gallery_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/api/images"));
        assert!(doc.paths.paths.contains_key("/api/images/{id}"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
    }
}
