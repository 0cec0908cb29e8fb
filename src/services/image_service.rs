use std::collections::HashMap;
use std::sync::Arc;

use crate::database::{ImageStore, UserStore};
use crate::models::{parse_image_id, ApiImage, ImageRecord};
use crate::utils::error::AppError;

/// Image read model: image documents joined with their authors in code.
#[derive(Clone)]
pub struct ImageService {
    images: Arc<dyn ImageStore>,
    users: Arc<dyn UserStore>,
}

impl ImageService {
    pub fn new(images: Arc<dyn ImageStore>, users: Arc<dyn UserStore>) -> Self {
        Self { images, users }
    }

    /// Lists images, optionally filtered by a case-insensitive name substring.
    ///
    /// Authors for the whole page are fetched with one lookup, never one per image.
    pub async fn list_denormalized(&self, name_filter: Option<&str>) -> Result<Vec<ApiImage>, AppError> {
        let images = self.images.find_images(name_filter).await?;
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let mut author_ids: Vec<String> = images.iter().map(|img| img.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();

        let users = self.users.find_users_by_ids(&author_ids).await?;
        let usernames: HashMap<String, String> = users
            .into_iter()
            .map(|user| (user.id.to_hex(), user.username))
            .collect();

        Ok(images
            .into_iter()
            .map(|img| {
                let username = usernames.get(&img.author_id).cloned();
                ApiImage::from_record(img, username)
            })
            .collect())
    }

    /// Malformed ids are reported as absent.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<ImageRecord>, AppError> {
        match parse_image_id(id) {
            Some(object_id) => self.images.find_image(&object_id).await,
            None => Ok(None),
        }
    }

    pub async fn author_username(&self, author_id: &str) -> Result<Option<String>, AppError> {
        let users = self.users.find_users_by_ids(&[author_id.to_string()]).await?;
        Ok(users.into_iter().next().map(|user| user.username))
    }

    /// Returns the matched count; 0 means no such image.
    pub async fn update_name(&self, id: &str, name: &str) -> Result<u64, AppError> {
        match parse_image_id(id) {
            Some(object_id) => self.images.update_image_name(&object_id, name).await,
            None => Ok(0),
        }
    }

    pub async fn create(&self, src: &str, name: &str, author_username: &str) -> Result<ApiImage, AppError> {
        let author = match self.users.find_user_by_username(author_username).await? {
            Some(user) => user,
            None => {
                log::info!("👤 Creating user record for {}", author_username);
                self.users.insert_user(author_username).await?
            }
        };

        let record = ImageRecord::new(src.to_string(), name.to_string(), author.id.to_hex());
        self.images.insert_image(&record).await?;

        Ok(ApiImage::from_record(record, Some(author.username)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::UNKNOWN_AUTHOR;
    use mongodb::bson::oid::ObjectId;

    fn service() -> (ImageService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ImageService::new(store.clone(), store.clone()), store)
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive_substring() {
        let (images, _) = service();
        for name in ["Black Cat", "CATERPILLAR", "dog", "Concatenate", "bird"] {
            images.create("/uploads/x.png", name, "alice").await.unwrap();
        }

        let mut names: Vec<String> = images
            .list_denormalized(Some("cat"))
            .await
            .unwrap()
            .into_iter()
            .map(|img| img.name)
            .collect();
        names.sort();

        assert_eq!(names, vec!["Black Cat", "CATERPILLAR", "Concatenate"]);
        assert_eq!(images.list_denormalized(None).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_author_is_unknown() {
        let (images, store) = service();
        store.seed_image(ImageRecord::new(
            "/uploads/orphan.png".into(),
            "Orphan".into(),
            ObjectId::new().to_hex(),
        ));
        store.seed_image(ImageRecord::new("/uploads/bad.png".into(), "Bad".into(), "not-an-id".into()));

        let listed = images.list_denormalized(None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|img| img.author.username == UNKNOWN_AUTHOR));
    }

    #[tokio::test]
    async fn test_listing_uses_one_author_lookup() {
        let (images, store) = service();
        for (name, author) in [("a", "alice"), ("b", "bob"), ("c", "alice"), ("d", "carol")] {
            images.create("/uploads/x.png", name, author).await.unwrap();
        }
        let before = store.user_lookups();

        let listed = images.list_denormalized(None).await.unwrap();

        assert_eq!(store.user_lookups() - before, 1);
        let authors: Vec<&str> = listed.iter().map(|img| img.author.username.as_str()).collect();
        assert_eq!(authors, vec!["alice", "bob", "alice", "carol"]);
    }

    #[tokio::test]
    async fn test_update_and_get_by_id() {
        let (images, _) = service();
        let created = images.create("/uploads/x.png", "Sunset", "alice").await.unwrap();

        assert_eq!(images.update_name(&created.id, "Sunset over bay").await.unwrap(), 1);
        let record = images.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(record.name, "Sunset over bay");

        assert_eq!(images.update_name("garbage", "x").await.unwrap(), 0);
        assert_eq!(images.update_name(&ObjectId::new().to_hex(), "x").await.unwrap(), 0);
        assert!(images.get_by_id("garbage").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_reuses_existing_author() {
        let (images, _) = service();
        let first = images.create("/uploads/1.png", "One", "alice").await.unwrap();
        let second = images.create("/uploads/2.png", "Two", "alice").await.unwrap();

        assert_eq!(first.author, second.author);
        assert_eq!(
            images.author_username(&first.author.id).await.unwrap().as_deref(),
            Some("alice")
        );
    }
}
