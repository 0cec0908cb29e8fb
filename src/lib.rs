pub mod api;
pub mod client;
pub mod config;
pub mod database;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use actix_web::web;
use std::sync::Arc;

use crate::database::{CredentialStore, ImageStore, UserStore};
use crate::services::{AuthTokens, CredentialsService, ImageService, UploadSettings};

/// Shared services handed to every worker.
#[derive(Clone)]
pub struct AppServices {
    pub credentials: web::Data<CredentialsService>,
    pub images: web::Data<ImageService>,
    pub tokens: web::Data<AuthTokens>,
    pub uploads: web::Data<UploadSettings>,
}

impl AppServices {
    pub fn new(
        credentials: CredentialsService,
        images: ImageService,
        tokens: AuthTokens,
        uploads: UploadSettings,
    ) -> Self {
        Self {
            credentials: web::Data::new(credentials),
            images: web::Data::new(images),
            tokens: web::Data::new(tokens),
            uploads: web::Data::new(uploads),
        }
    }

    /// Builds the services on top of a single store implementing all three collections.
    pub fn from_store<S>(store: Arc<S>, jwt_secret: &str, uploads: UploadSettings) -> Self
    where
        S: CredentialStore + UserStore + ImageStore + 'static,
    {
        Self::new(
            CredentialsService::new(store.clone()),
            ImageService::new(store.clone(), store),
            AuthTokens::new(jwt_secret),
            uploads,
        )
    }

    /// Registers the shared data and the API routes (not the static assets).
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.credentials.clone())
            .app_data(self.images.clone())
            .app_data(self.tokens.clone())
            .app_data(self.uploads.clone())
            .configure(api::configure);
    }
}
