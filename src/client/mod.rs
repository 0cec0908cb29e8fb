//! Typed client for the gallery API.
//!
//! `GalleryClient` keeps the same state the web front end does: the bearer
//! token (in memory only), the current image list and its load status. List
//! fetches are sequence-tagged so a slow, older search can never overwrite a
//! newer one, and renames are applied optimistically with rollback on failure.

pub mod http;
pub mod state;

use async_trait::async_trait;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::auth::CredentialsRequest;
use crate::models::{name_exceeds_limit, ApiImage, MAX_IMAGE_NAME_LENGTH};

pub use http::HttpGalleryApi;
pub use state::{DetailView, GalleryState};

#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Input rejected before any request was sent
    Validation(String),
    /// The server answered with a non-success status
    Rejected { status: u16, message: String },
    /// The request never completed
    Network(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Validation(msg) => write!(f, "{}", msg),
            ClientError::Rejected { message, .. } => write!(f, "{}", message),
            ClientError::Network(_) => write!(f, "Network error. Please try again."),
        }
    }
}

impl std::error::Error for ClientError {}

/// An image file picked for upload.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Transport used by [`GalleryClient`].
#[async_trait]
pub trait GalleryApi: Send + Sync {
    async fn register(&self, credentials: &CredentialsRequest) -> Result<String, ClientError>;

    async fn login(&self, credentials: &CredentialsRequest) -> Result<String, ClientError>;

    async fn list_images(&self, token: Option<&str>, name: Option<&str>) -> Result<Vec<ApiImage>, ClientError>;

    async fn rename_image(&self, token: Option<&str>, id: &str, name: &str) -> Result<(), ClientError>;

    async fn upload_image(&self, token: Option<&str>, file: ImageFile, name: &str) -> Result<ApiImage, ClientError>;
}

pub struct GalleryClient<A> {
    api: A,
    token: Mutex<Option<String>>,
    gallery: Mutex<GalleryState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: GalleryApi> GalleryClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            token: Mutex::new(None),
            gallery: Mutex::new(GalleryState::new()),
        }
    }

    pub fn token(&self) -> Option<String> {
        lock(&self.token).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.token).is_some()
    }

    pub fn logout(&self) {
        *lock(&self.token) = None;
    }

    /// Copy of the current gallery state
    pub fn gallery(&self) -> GalleryState {
        lock(&self.gallery).clone()
    }

    fn credentials(username: &str, password: &str) -> Result<CredentialsRequest, ClientError> {
        if username.is_empty() || password.is_empty() {
            return Err(ClientError::Validation("Please fill in all fields".to_string()));
        }
        Ok(CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Self::credentials(username, password)?;
        let token = self.api.login(&credentials).await?;
        *lock(&self.token) = Some(token);
        log::info!("🔐 Logged in as {}", username);
        Ok(())
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<(), ClientError> {
        let credentials = Self::credentials(username, password)?;
        let token = self.api.register(&credentials).await?;
        *lock(&self.token) = Some(token);
        log::info!("📝 Registered {}", username);
        Ok(())
    }

    /// Fetches the list, optionally filtered by name.
    ///
    /// Returns `false` when a newer fetch was issued meanwhile and this
    /// response was discarded.
    pub async fn search(&self, name: Option<&str>) -> bool {
        let request = lock(&self.gallery).begin_request();
        let token = self.token();

        let result = self.api.list_images(token.as_deref(), name).await;
        if let Err(e) = &result {
            log::warn!("⚠️  Image fetch #{} failed: {:?}", request, e);
        }

        let committed = lock(&self.gallery).commit(request, result);
        if !committed {
            log::debug!("Discarding stale image list response #{}", request);
        }
        committed
    }

    pub async fn refresh(&self) -> bool {
        self.search(None).await
    }

    /// Renames optimistically; the previous name comes back if the server refuses.
    pub async fn rename_image(&self, id: &str, new_name: &str) -> Result<(), ClientError> {
        if new_name.is_empty() {
            return Err(ClientError::Validation("Image name cannot be empty".to_string()));
        }
        if name_exceeds_limit(new_name) {
            return Err(ClientError::Validation(format!(
                "Image name exceeds {} characters",
                MAX_IMAGE_NAME_LENGTH
            )));
        }

        let previous = lock(&self.gallery).rename_local(id, new_name);
        let token = self.token();

        match self.api.rename_image(token.as_deref(), id, new_name).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Some(previous) = previous {
                    lock(&self.gallery).rollback_rename(id, new_name, previous);
                }
                log::warn!("⚠️  Rename of {} failed: {:?}", id, e);
                Err(e)
            }
        }
    }

    pub async fn upload(&self, file: Option<ImageFile>, name: &str) -> Result<ApiImage, ClientError> {
        let file = match file {
            Some(file) if !name.is_empty() => file,
            _ => {
                return Err(ClientError::Validation(
                    "Please fill in all fields and select an image".to_string(),
                ))
            }
        };

        let token = self.token();
        let image = self.api.upload_image(token.as_deref(), file, name).await?;
        log::info!("✅ Uploaded {} as {}", image.name, image.id);
        Ok(image)
    }
}
