use std::sync::Arc;

use crate::database::CredentialStore;
use crate::models::CredentialRecord;
use crate::utils::error::AppError;

/// bcrypt work factor for stored passwords
pub const PASSWORD_HASH_COST: u32 = 10;

#[derive(Debug, PartialEq)]
pub enum Registration {
    Created,
    UsernameTaken,
}

/// Registers users and checks passwords against salted hashes.
#[derive(Clone)]
pub struct CredentialsService {
    store: Arc<dyn CredentialStore>,
    cost: u32,
}

impl CredentialsService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_cost(store, PASSWORD_HASH_COST)
    }

    /// Lower costs keep test suites fast; production uses `PASSWORD_HASH_COST`.
    pub fn with_cost(store: Arc<dyn CredentialStore>, cost: u32) -> Self {
        Self { store, cost }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Registration, AppError> {
        if self.store.find_credentials(username).await?.is_some() {
            return Ok(Registration::UsernameTaken);
        }

        let password = password.to_string();
        let cost = self.cost;
        let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Hash task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

        // The insert itself is the final word when two registrations race
        if self.store.insert_credentials(CredentialRecord::new(username, hashed)).await? {
            Ok(Registration::Created)
        } else {
            Ok(Registration::UsernameTaken)
        }
    }

    /// `false` for unknown users and wrong passwords alike.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AppError> {
        let record = match self.store.find_credentials(username).await? {
            Some(record) => record,
            None => return Ok(false),
        };

        let password = password.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &record.password))
            .await
            .map_err(|e| AppError::Internal(format!("Verify task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    fn service() -> CredentialsService {
        CredentialsService::with_cost(Arc::new(MemoryStore::new()), 4)
    }

    #[tokio::test]
    async fn test_register_twice_conflicts() {
        let credentials = service();

        assert_eq!(credentials.register("alice", "secret1").await.unwrap(), Registration::Created);
        assert_eq!(
            credentials.register("alice", "other").await.unwrap(),
            Registration::UsernameTaken
        );
    }

    #[tokio::test]
    async fn test_verify_exact_pair_only() {
        let credentials = service();
        credentials.register("alice", "secret1").await.unwrap();

        assert!(credentials.verify("alice", "secret1").await.unwrap());
        assert!(!credentials.verify("alice", "secret2").await.unwrap());
        assert!(!credentials.verify("bob", "secret1").await.unwrap());
    }

    #[tokio::test]
    async fn test_password_is_not_stored_in_clear() {
        let store = Arc::new(MemoryStore::new());
        let credentials = CredentialsService::with_cost(store.clone(), 4);
        credentials.register("alice", "secret1").await.unwrap();

        let record = store.find_credentials("alice").await.unwrap().unwrap();
        assert_ne!(record.password, "secret1");
        assert!(record.password.starts_with("$2"));
    }
}
