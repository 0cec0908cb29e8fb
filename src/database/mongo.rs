use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::collections::HashSet;
use std::error::Error;

use super::{CredentialStore, ImageStore, UserStore};
use crate::config::CollectionNames;
use crate::models::{CredentialRecord, ImageRecord, UserRecord};
use crate::utils::error::AppError;

const DUPLICATE_KEY: i32 = 11000;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(2);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);

        // Test connection
        let collections = db.list_collection_names().await?;
        log::info!("📂 Mongo connected. Collections: {:?}", collections);

        Ok(Self { db })
    }

    /// Creates the indexes the gallery queries rely on
    pub async fn ensure_indexes(&self, names: &CollectionNames) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        // users(username) - unique, author lookup on upload
        let users = self.collection::<Document>(&names.users);
        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        match users.create_index(username_index).await {
            Ok(_) => log::info!("   ✅ Index created: {}(username)", names.users),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        // images(authorId) - ownership queries
        let images = self.collection::<Document>(&names.images);
        let author_index = IndexModel::builder()
            .keys(doc! { "authorId": 1 })
            .build();

        match images.create_index(author_index).await {
            Ok(_) => log::info!("   ✅ Index created: {}(authorId)", names.images),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }
}

/// MongoDB-backed gallery storage
#[derive(Clone)]
pub struct MongoStore {
    db: MongoDB,
    names: CollectionNames,
}

impl MongoStore {
    pub fn new(db: MongoDB, names: CollectionNames) -> Self {
        Self { db, names }
    }

    fn credentials(&self) -> Collection<CredentialRecord> {
        self.db.collection(&self.names.credentials)
    }

    fn users(&self) -> Collection<UserRecord> {
        self.db.collection(&self.names.users)
    }

    fn images(&self) -> Collection<ImageRecord> {
        self.db.collection(&self.names.images)
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        *e.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref we)) if we.code == DUPLICATE_KEY
    )
}

/// Case-insensitive "contains" filter; the user input is matched literally.
fn name_filter_doc(name_filter: Option<&str>) -> Document {
    match name_filter {
        Some(filter) => doc! {
            "name": { "$regex": regex::escape(filter), "$options": "i" }
        },
        None => doc! {},
    }
}

#[async_trait]
impl CredentialStore for MongoStore {
    async fn find_credentials(&self, username: &str) -> Result<Option<CredentialRecord>, AppError> {
        Ok(self.credentials().find_one(doc! { "_id": username }).await?)
    }

    async fn insert_credentials(&self, record: CredentialRecord) -> Result<bool, AppError> {
        match self.credentials().insert_one(&record).await {
            Ok(_) => Ok(true),
            Err(e) if is_duplicate_key(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn find_users_by_ids(&self, ids: &[String]) -> Result<Vec<UserRecord>, AppError> {
        let object_ids: Vec<ObjectId> = ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| ObjectId::parse_str(id).ok())
            .collect();

        if object_ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .users()
            .find(doc! { "_id": { "$in": object_ids } })
            .await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users().find_one(doc! { "username": username }).await?)
    }

    async fn insert_user(&self, username: &str) -> Result<UserRecord, AppError> {
        let user = UserRecord {
            id: ObjectId::new(),
            username: username.to_string(),
        };

        match self.users().insert_one(&user).await {
            Ok(_) => Ok(user),
            // Another request created the same user first
            Err(e) if is_duplicate_key(&e) => self
                .find_user_by_username(username)
                .await?
                .ok_or_else(|| AppError::DatabaseError(format!("User {} vanished after insert", username))),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ImageStore for MongoStore {
    async fn find_images(&self, name_filter: Option<&str>) -> Result<Vec<ImageRecord>, AppError> {
        let cursor = self.images().find(name_filter_doc(name_filter)).await?;
        Ok(cursor.try_collect::<Vec<_>>().await?)
    }

    async fn find_image(&self, id: &ObjectId) -> Result<Option<ImageRecord>, AppError> {
        Ok(self.images().find_one(doc! { "_id": *id }).await?)
    }

    async fn update_image_name(&self, id: &ObjectId, name: &str) -> Result<u64, AppError> {
        let result = self
            .images()
            .update_one(doc! { "_id": *id }, doc! { "$set": { "name": name } })
            .await?;
        Ok(result.matched_count)
    }

    async fn insert_image(&self, record: &ImageRecord) -> Result<(), AppError> {
        self.images().insert_one(record).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_filter_escapes_regex() {
        let filter = name_filter_doc(Some("cat.*"));
        let inner = filter.get_document("name").unwrap();

        assert_eq!(inner.get_str("$regex").unwrap(), r"cat\.\*");
        assert_eq!(inner.get_str("$options").unwrap(), "i");
        assert!(name_filter_doc(None).is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_roundtrip() {
        dotenv::dotenv().ok();

        let uri = std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db = MongoDB::new(&uri, "gallery_test").await.unwrap();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let store = MongoStore::new(
            db,
            CollectionNames {
                credentials: format!("creds_{}", suffix),
                users: format!("users_{}", suffix),
                images: format!("images_{}", suffix),
            },
        );

        let creds = CredentialRecord::new("alice", "hash".to_string());
        assert!(store.insert_credentials(creds.clone()).await.unwrap());
        assert!(!store.insert_credentials(creds).await.unwrap());

        let alice = store.insert_user("alice").await.unwrap();
        let image = ImageRecord::new("/uploads/x.png".into(), "Black Cat".into(), alice.id.to_hex());
        store.insert_image(&image).await.unwrap();

        let found = store.find_images(Some("cAt")).await.unwrap();
        assert_eq!(found, vec![image.clone()]);

        let users = store.find_users_by_ids(&[alice.id.to_hex(), "bogus".into()]).await.unwrap();
        assert_eq!(users, vec![alice]);

        assert_eq!(store.update_image_name(&image.id, "Dog").await.unwrap(), 1);
        assert_eq!(store.update_image_name(&ObjectId::new(), "Dog").await.unwrap(), 0);
    }
}
