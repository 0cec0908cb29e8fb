use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{CredentialStore, ImageStore, UserStore};
use crate::models::{CredentialRecord, ImageRecord, UserRecord};
use crate::utils::error::AppError;

/// In-process store with the same semantics as `MongoStore`.
///
/// Images keep insertion order. `user_lookups` counts batched author lookups
/// so callers can assert that a listing never degrades into per-row queries.
#[derive(Default)]
pub struct MemoryStore {
    credentials: Mutex<HashMap<String, CredentialRecord>>,
    users: Mutex<Vec<UserRecord>>,
    images: Mutex<Vec<ImageRecord>>,
    user_lookups: AtomicUsize,
}

fn poisoned<T>(_: T) -> AppError {
    AppError::Internal("memory store lock poisoned".to_string())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_users_by_ids` calls served so far
    pub fn user_lookups(&self) -> usize {
        self.user_lookups.load(Ordering::SeqCst)
    }

    /// Inserts an image with an arbitrary author id, bypassing the service.
    pub fn seed_image(&self, record: ImageRecord) {
        if let Ok(mut images) = self.images.lock() {
            images.push(record);
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credentials(&self, username: &str) -> Result<Option<CredentialRecord>, AppError> {
        let credentials = self.credentials.lock().map_err(poisoned)?;
        Ok(credentials.get(username).cloned())
    }

    async fn insert_credentials(&self, record: CredentialRecord) -> Result<bool, AppError> {
        let mut credentials = self.credentials.lock().map_err(poisoned)?;
        if credentials.contains_key(&record.id) {
            return Ok(false);
        }
        credentials.insert(record.id.clone(), record);
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRecord>, AppError> {
        self.user_lookups.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users
            .iter()
            .filter(|user| ids.iter().any(|id| *id == user.id.to_hex()))
            .cloned()
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        let users = self.users.lock().map_err(poisoned)?;
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn insert_user(&self, username: &str) -> Result<UserRecord, AppError> {
        let mut users = self.users.lock().map_err(poisoned)?;
        if let Some(existing) = users.iter().find(|user| user.username == username) {
            return Ok(existing.clone());
        }
        let user = UserRecord {
            id: ObjectId::new(),
            username: username.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl ImageStore for MemoryStore {
    async fn find_images(&self, name_filter: Option<&str>) -> Result<Vec<ImageRecord>, AppError> {
        let needle = name_filter.map(str::to_lowercase);
        let images = self.images.lock().map_err(poisoned)?;
        Ok(images
            .iter()
            .filter(|image| match &needle {
                Some(needle) => image.name.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn find_image(&self, id: &ObjectId) -> Result<Option<ImageRecord>, AppError> {
        let images = self.images.lock().map_err(poisoned)?;
        Ok(images.iter().find(|image| image.id == *id).cloned())
    }

    async fn update_image_name(&self, id: &ObjectId, name: &str) -> Result<u64, AppError> {
        let mut images = self.images.lock().map_err(poisoned)?;
        match images.iter_mut().find(|image| image.id == *id) {
            Some(image) => {
                image.name = name.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn insert_image(&self, record: &ImageRecord) -> Result<(), AppError> {
        let mut images = self.images.lock().map_err(poisoned)?;
        images.push(record.clone());
        Ok(())
    }
}
