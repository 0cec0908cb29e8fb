use actix_multipart::{Field, Multipart};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Largest accepted image (5 MB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix uploaded files are served under
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

const IMAGE_FIELD: &str = "image";
const NAME_FIELD: &str = "name";
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub dir: PathBuf,
    pub max_file_bytes: usize,
}

impl UploadSettings {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_file_bytes: MAX_IMAGE_BYTES,
        }
    }
}

/// A file already written to the upload directory.
#[derive(Debug)]
pub struct StoredFile {
    pub file_name: String,
    pub path: PathBuf,
}

impl StoredFile {
    /// Public URL path of the file
    pub fn src(&self) -> String {
        format!("{}/{}", UPLOADS_URL_PREFIX, self.file_name)
    }

    pub async fn discard(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            log::warn!("⚠️  Could not remove {}: {}", self.path.display(), e);
        }
    }
}

/// Parsed `multipart/form-data` body of an image upload.
#[derive(Debug, Default)]
pub struct ImageUpload {
    pub file: Option<StoredFile>,
    pub name: Option<String>,
}

impl ImageUpload {
    /// Removes whatever reached the disk.
    pub async fn discard(self) {
        if let Some(file) = self.file {
            file.discard().await;
        }
    }
}

/// Maps an accepted image MIME type to the stored file extension.
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpg" | "image/jpeg" => Some("jpg"),
        _ => None,
    }
}

fn generate_file_name(extension: &str) -> String {
    format!(
        "{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

/// Streams the upload to disk. On any error the partial file is removed.
pub async fn receive_image_upload(
    mut payload: Multipart,
    settings: &UploadSettings,
) -> Result<ImageUpload, AppError> {
    let mut upload = ImageUpload::default();

    match read_fields(&mut payload, settings, &mut upload).await {
        Ok(()) => Ok(upload),
        Err(e) => {
            upload.discard().await;
            Err(e)
        }
    }
}

async fn read_fields(
    payload: &mut Multipart,
    settings: &UploadSettings,
    upload: &mut ImageUpload,
) -> Result<(), AppError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| AppError::bad_request(e.to_string()))?;

        let field_name = field.name().unwrap_or_default().to_string();
        let is_file = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .is_some();

        match field_name.as_str() {
            IMAGE_FIELD => {
                if upload.file.is_some() {
                    return Err(AppError::bad_request("Too many files"));
                }
                write_image_field(&mut field, settings, upload).await?;
            }
            NAME_FIELD if !is_file => {
                upload.name = Some(read_text_field(&mut field).await?);
            }
            _ if is_file => return Err(AppError::bad_request("Unexpected field")),
            _ => {
                // Unrelated text field
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| AppError::bad_request(e.to_string()))?;
                }
            }
        }
    }

    Ok(())
}

async fn write_image_field(
    field: &mut Field,
    settings: &UploadSettings,
    upload: &mut ImageUpload,
) -> Result<(), AppError> {
    let mime = field
        .content_type()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_default();
    let extension = extension_for_mime(&mime)
        .ok_or_else(|| AppError::bad_request("Unsupported image type"))?;

    let file_name = generate_file_name(extension);
    let path = settings.dir.join(&file_name);
    let mut file = tokio::fs::File::create(&path).await?;
    upload.file = Some(StoredFile { file_name, path });

    let mut written = 0usize;
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::bad_request(e.to_string()))?;
        written += chunk.len();
        if written > settings.max_file_bytes {
            return Err(AppError::bad_request("File too large"));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    Ok(())
}

async fn read_text_field(field: &mut Field) -> Result<String, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| AppError::bad_request(e.to_string()))?;
        if bytes.len() + chunk.len() > MAX_TEXT_FIELD_BYTES {
            return Err(AppError::bad_request("Field value too long"));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| AppError::bad_request("Field value is not valid UTF-8"))
}
