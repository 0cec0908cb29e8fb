use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Stored credentials. The username doubles as the document key.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CredentialRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub password: String,  // bcrypt hash, never the plain password
}

impl CredentialRecord {
    pub fn new(username: &str, password_hash: String) -> Self {
        Self {
            id: username.to_string(),
            username: username.to_string(),
            password: password_hash,
        }
    }
}

/// Author identity referenced by images.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
}
