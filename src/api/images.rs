use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{
    name_exceeds_limit, name_too_long, parse_image_id, validate_image_name, ApiImage, ImageSearchQuery,
    ImageUploadForm, UpdateImageNameRequest, MAX_IMAGE_NAME_LENGTH,
};
use crate::services::{receive_image_upload, ImageService, ImageUpload, UploadSettings};
use crate::utils::error::{AppError, ErrorResponse};

fn image_not_found() -> AppError {
    AppError::not_found("Image does not exist")
}

fn require_identity(user: Option<web::ReqData<Claims>>) -> Result<String, AppError> {
    user.map(|claims| claims.username.clone())
        .ok_or_else(|| AppError::unauthorized("Authentication required"))
}

/// GET /api/images?name= - Lists images with their authors
#[utoipa::path(
    get,
    path = "/api/images",
    tag = "Images",
    params(ImageSearchQuery),
    responses(
        (status = 200, description = "Denormalized image list", body = [ApiImage]),
        (status = 400, description = "Query parameter 'name' must be a string", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_images(
    images: web::Data<ImageService>,
    query: Result<web::Query<ImageSearchQuery>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let query = query
        .map_err(|_| AppError::bad_request("Query parameter 'name' must be a string"))?
        .into_inner();

    let result = images.list_denormalized(query.name.as_deref()).await?;
    log::info!("🖼️  GET /api/images - name: {:?}, {} results", query.name, result.len());

    Ok(HttpResponse::Ok().json(result))
}

/// PATCH /api/images/{id} - Renames an image owned by the caller
#[utoipa::path(
    patch,
    path = "/api/images/{id}",
    tag = "Images",
    params(("id" = String, Path, description = "Image id (24 hex characters)")),
    request_body = UpdateImageNameRequest,
    responses(
        (status = 204, description = "Name updated"),
        (status = 400, description = "New image name must be a string", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Caller does not own the image", body = ErrorResponse),
        (status = 404, description = "Image does not exist", body = ErrorResponse),
        (status = 422, description = "Image name too long", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_image_name(
    user: Option<web::ReqData<Claims>>,
    path: web::Path<String>,
    body: Result<web::Json<UpdateImageNameRequest>, actix_web::Error>,
    images: web::Data<ImageService>,
) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();

    if parse_image_id(&image_id).is_none() {
        return Err(image_not_found());
    }

    // A body over the JSON limit can only be an overlong name
    let name = body
        .map_err(|e| match e.as_error::<AppError>() {
            Some(AppError::UnprocessableEntity(_)) => name_too_long(),
            _ => AppError::bad_request("New image name must be a string"),
        })?
        .into_inner()
        .name;
    validate_image_name(&name)?;

    let image = images.get_by_id(&image_id).await?.ok_or_else(image_not_found)?;

    let username = require_identity(user)?;
    let author = images.author_username(&image.author_id).await?;
    if author.as_deref() != Some(username.as_str()) {
        log::warn!("🚫 PATCH /api/images/{} - {} is not the author", image_id, username);
        return Err(AppError::Forbidden("You can only edit your own images".to_string()));
    }

    if images.update_name(&image_id, &name).await? == 0 {
        return Err(image_not_found());
    }

    log::info!("✏️  PATCH /api/images/{} - renamed by {}", image_id, username);
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/images - Uploads a new image (multipart: `image`, `name`)
#[utoipa::path(
    post,
    path = "/api/images",
    tag = "Images",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Image created", body = ApiImage),
        (status = 400, description = "Missing file or name, or unsupported file", body = ErrorResponse),
        (status = 401, description = "Authentication required", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_image(
    user: Option<web::ReqData<Claims>>,
    payload: Multipart,
    images: web::Data<ImageService>,
    uploads: web::Data<UploadSettings>,
) -> Result<HttpResponse, AppError> {
    let username = require_identity(user)?;

    let ImageUpload { file, name } = receive_image_upload(payload, &uploads).await.map_err(|e| {
        log::warn!("❌ POST /api/images - upload rejected: {}", e);
        e
    })?;

    let (file, name) = match (file, name.filter(|n| !n.is_empty())) {
        (Some(file), Some(name)) => (file, name),
        (file, _) => {
            if let Some(file) = file {
                file.discard().await;
            }
            return Err(AppError::bad_request("Missing image file or name"));
        }
    };

    if name_exceeds_limit(&name) {
        file.discard().await;
        return Err(AppError::bad_request(format!(
            "Image name exceeds {} characters",
            MAX_IMAGE_NAME_LENGTH
        )));
    }

    match images.create(&file.src(), &name, &username).await {
        Ok(image) => {
            log::info!("✅ POST /api/images - {} uploaded {} as {}", username, image.id, file.file_name);
            Ok(HttpResponse::Created().json(image))
        }
        Err(e) => {
            file.discard().await;
            Err(e)
        }
    }
}
