use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

pub const MAX_IMAGE_NAME_LENGTH: usize = 100;

/// Username reported when an image's author cannot be resolved
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Image document as stored in MongoDB
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub src: String,
    pub name: String,
    /// Hex id of a user record. Nothing guarantees the user still exists.
    #[serde(rename = "authorId")]
    pub author_id: String,
}

impl ImageRecord {
    pub fn new(src: String, name: String, author_id: String) -> Self {
        Self {
            id: ObjectId::new(),
            src,
            name,
            author_id,
        }
    }
}

/// Denormalized image returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct ApiImage {
    pub id: String,
    pub src: String,
    pub name: String,
    pub author: ApiAuthor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct ApiAuthor {
    pub id: String,
    pub username: String,
}

impl ApiImage {
    pub fn from_record(record: ImageRecord, author_username: Option<String>) -> Self {
        Self {
            id: record.id.to_hex(),
            src: record.src,
            name: record.name,
            author: ApiAuthor {
                id: record.author_id,
                username: author_username.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            },
        }
    }
}

/// Query string of GET /api/images
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImageSearchQuery {
    /// Case-insensitive substring of the image name
    pub name: Option<String>,
}

/// Body of PATCH /api/images/{id}
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateImageNameRequest {
    pub name: String,
}

/// Multipart form accepted by POST /api/images (documentation only)
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct ImageUploadForm {
    /// PNG or JPEG file, at most 5 MB
    #[schema(format = Binary)]
    pub image: String,
    pub name: String,
}

pub fn name_exceeds_limit(name: &str) -> bool {
    name.chars().count() > MAX_IMAGE_NAME_LENGTH
}

pub fn name_too_long() -> AppError {
    AppError::UnprocessableEntity(format!("Image name exceeds {} characters", MAX_IMAGE_NAME_LENGTH))
}

/// Rejects names above the length limit with 422.
pub fn validate_image_name(name: &str) -> Result<(), AppError> {
    if name_exceeds_limit(name) {
        return Err(name_too_long());
    }
    Ok(())
}

pub fn parse_image_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_limit_counts_characters() {
        assert!(validate_image_name(&"a".repeat(100)).is_ok());
        assert!(matches!(
            validate_image_name(&"a".repeat(101)),
            Err(AppError::UnprocessableEntity(_))
        ));
        // 100 multi-byte characters are still within the limit
        assert!(validate_image_name(&"é".repeat(100)).is_ok());
    }

    #[test]
    fn test_unknown_author_fallback() {
        let record = ImageRecord::new("/uploads/a.png".into(), "A".into(), "deadbeef".into());
        let api = ApiImage::from_record(record.clone(), None);

        assert_eq!(api.id, record.id.to_hex());
        assert_eq!(api.author.id, "deadbeef");
        assert_eq!(api.author.username, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_parse_image_id() {
        assert!(parse_image_id("507f1f77bcf86cd799439011").is_some());
        assert!(parse_image_id("not-an-id").is_none());
        assert!(parse_image_id("").is_none());
    }

    #[test]
    fn test_record_uses_mongo_field_names() {
        let record = ImageRecord::new("/uploads/a.png".into(), "A".into(), "abc".into());
        let doc = mongodb::bson::to_document(&record).unwrap();

        assert!(doc.contains_key("_id"));
        assert_eq!(doc.get_str("authorId").unwrap(), "abc");
    }
}
