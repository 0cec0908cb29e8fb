use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::services::{AuthTokens, CredentialsService, Registration};
use crate::utils::error::{AppError, ErrorResponse};

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenResponse {
    pub token: String,
}

/// Rejects bodies that are not `{username, password}` with two non-empty strings.
fn read_credentials(
    body: Result<web::Json<CredentialsRequest>, actix_web::Error>,
) -> Result<CredentialsRequest, AppError> {
    let missing = || AppError::bad_request("Missing username or password");

    let request = body.map_err(|_| missing())?.into_inner();
    if request.username.is_empty() || request.password.is_empty() {
        return Err(missing());
    }
    Ok(request)
}

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Registration successful", body = TokenResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 409, description = "Username already taken", body = ErrorResponse)
    )
)]
pub async fn register(
    credentials: web::Data<CredentialsService>,
    tokens: web::Data<AuthTokens>,
    body: Result<web::Json<CredentialsRequest>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let request = read_credentials(body)?;
    log::info!("📝 POST /auth/register - username: {}", request.username);

    match credentials.register(&request.username, &request.password).await? {
        Registration::Created => {
            // Registration logs the user in right away
            let token = tokens.issue(&request.username)?;
            log::info!("✅ Registration successful: {}", request.username);
            Ok(HttpResponse::Created().json(TokenResponse { token }))
        }
        Registration::UsernameTaken => {
            log::warn!("❌ Registration failed: {} - username taken", request.username);
            Err(AppError::Conflict("Username already taken".to_string()))
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Missing username or password", body = ErrorResponse),
        (status = 401, description = "Incorrect username or password", body = ErrorResponse)
    )
)]
pub async fn login(
    credentials: web::Data<CredentialsService>,
    tokens: web::Data<AuthTokens>,
    body: Result<web::Json<CredentialsRequest>, actix_web::Error>,
) -> Result<HttpResponse, AppError> {
    let request = read_credentials(body)?;
    log::info!("🔐 POST /auth/login - username: {}", request.username);

    if !credentials.verify(&request.username, &request.password).await? {
        log::warn!("❌ Login failed: {}", request.username);
        return Err(AppError::unauthorized("Incorrect username or password"));
    }

    let token = tokens.issue(&request.username)?;
    log::info!("✅ Login successful: {}", request.username);
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}
