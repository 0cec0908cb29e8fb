//! Storage seams for credentials, users and images.
//!
//! The service talks to these traits only. `MongoStore` is the production
//! backend; `MemoryStore` backs the tests and database-less local runs.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::models::{CredentialRecord, ImageRecord, UserRecord};
use crate::utils::error::AppError;

pub use memory::MemoryStore;
pub use mongo::{MongoDB, MongoStore};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credentials(&self, username: &str) -> Result<Option<CredentialRecord>, AppError>;

    /// Returns `false` when a record with the same username already exists.
    async fn insert_credentials(&self, record: CredentialRecord) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Resolves many author ids in a single round trip.
    /// Ids that are malformed or unknown are simply absent from the result.
    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRecord>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError>;

    async fn insert_user(&self, username: &str) -> Result<UserRecord, AppError>;
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn find_images(&self, name_filter: Option<&str>) -> Result<Vec<ImageRecord>, AppError>;

    async fn find_image(&self, id: &ObjectId) -> Result<Option<ImageRecord>, AppError>;

    /// Returns the number of matched documents.
    async fn update_image_name(&self, id: &ObjectId, name: &str) -> Result<u64, AppError>;

    async fn insert_image(&self, record: &ImageRecord) -> Result<(), AppError>;
}
