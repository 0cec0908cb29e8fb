use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};

use super::{ClientError, GalleryApi, ImageFile};
use crate::api::auth::{CredentialsRequest, TokenResponse};
use crate::models::{ApiImage, UpdateImageNameRequest};
use crate::utils::error::ErrorResponse;

/// [`GalleryApi`] over HTTP with reqwest.
#[derive(Clone)]
pub struct HttpGalleryApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpGalleryApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(request: RequestBuilder, fallback: &str) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        // Prefer the server's message, otherwise a per-operation fallback
        let message = response
            .json::<ErrorResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| fallback.to_string());

        Err(ClientError::Rejected { status, message })
    }

    fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn obtain_token(&self, path: &str, credentials: &CredentialsRequest) -> Result<String, ClientError> {
        let response = Self::send(
            self.http.post(self.url(path)).json(credentials),
            "Authentication failed",
        )
        .await?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(body.token)
    }
}

#[async_trait]
impl GalleryApi for HttpGalleryApi {
    async fn register(&self, credentials: &CredentialsRequest) -> Result<String, ClientError> {
        self.obtain_token("/auth/register", credentials).await
    }

    async fn login(&self, credentials: &CredentialsRequest) -> Result<String, ClientError> {
        self.obtain_token("/auth/login", credentials).await
    }

    async fn list_images(&self, token: Option<&str>, name: Option<&str>) -> Result<Vec<ApiImage>, ClientError> {
        let mut request = self.http.get(self.url("/api/images"));
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            request = request.query(&[("name", name)]);
        }

        let response = Self::send(Self::authorize(request, token), "Failed to load images.").await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }

    async fn rename_image(&self, token: Option<&str>, id: &str, name: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .patch(self.url(&format!("/api/images/{}", id)))
            .json(&UpdateImageNameRequest { name: name.to_string() });

        Self::send(Self::authorize(request, token), "Failed to update name.").await?;
        Ok(())
    }

    async fn upload_image(&self, token: Option<&str>, file: ImageFile, name: &str) -> Result<ApiImage, ClientError> {
        let part = Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.content_type)
            .map_err(|_| ClientError::Validation("Unsupported image type".to_string()))?;

        let form = Form::new().part("image", part).text("name", name.to_string());
        let request = self.http.post(self.url("/api/images")).multipart(form);

        let response = Self::send(Self::authorize(request, token), "Upload failed").await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpGalleryApi::new("http://localhost:3000/");
        assert_eq!(api.url("/api/images"), "http://localhost:3000/api/images");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) is not expected to accept HTTP
        let api = HttpGalleryApi::new("http://127.0.0.1:9");
        let err = api.list_images(None, None).await.unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(err.to_string(), "Network error. Please try again.");
    }
}
