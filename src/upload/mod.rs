use axum::extract::multipart::{Field, Multipart};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

/// Image types accepted for entity uploads. "image/jpg" is nonstandard
/// but commonly sent by clients for JPEG files.
const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];
const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];

/// A stored upload: the public URL persisted to the database and the
/// on-disk filename.
#[derive(Debug, Clone)]
pub struct StoredImage {
    pub url: String,
    pub filename: String,
}

/// Parsed multipart payload: text fields plus at most one stored image.
#[derive(Debug, Default)]
pub struct SubmittedForm {
    pub fields: HashMap<String, String>,
    pub image: Option<StoredImage>,
}

impl SubmittedForm {
    pub fn text(&self, name: &str) -> Option<&String> {
        self.fields.get(name)
    }
}

/// Read a multipart request, storing the file carried under `file_field`
/// and collecting every other part as a text field.
///
/// The file is validated against the image allow-list and size cap before
/// anything touches the filesystem. Unknown file-bearing fields are
/// rejected rather than silently dropped.
pub async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<SubmittedForm, ApiError> {
    let mut form = SubmittedForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart body: {}", e)))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == file_field {
            form.image = Some(store_field(field).await?);
        } else if field.file_name().is_some() {
            return Err(ApiError::bad_request(format!(
                "unexpected file field '{}', expected '{}'",
                name, file_field
            )));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("failed to read field: {}", e)))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Validate and persist a single file part, producing its public URL.
async fn store_field(field: Field<'_>) -> Result<StoredImage, ApiError> {
    let uploads = &config::config().uploads;

    let original_name = field
        .file_name()
        .map(|s| s.to_string())
        .ok_or_else(|| ApiError::bad_request("uploaded file has no filename"))?;
    let content_type = field.content_type().map(|s| s.to_string());

    let extension = validate_image(&original_name, content_type.as_deref())?;

    let data = field
        .bytes()
        .await
        .map_err(|e| ApiError::bad_request(format!("failed to read upload: {}", e)))?;

    if data.len() > uploads.max_file_size_bytes {
        return Err(ApiError::bad_request(format!(
            "file too large, maximum is {} bytes",
            uploads.max_file_size_bytes
        )));
    }

    let filename = generate_filename(extension);
    let path = Path::new(&uploads.directory).join(&filename);

    tokio::fs::write(&path, &data).await.map_err(|e| {
        tracing::error!("Failed to persist upload {}: {}", path.display(), e);
        ApiError::internal_server_error("failed to store uploaded file")
    })?;

    Ok(StoredImage {
        url: format!("{}/{}", uploads.public_prefix, filename),
        filename,
    })
}

/// Check both the declared content type and the filename extension
/// against the image allow-list. Returns the normalized extension.
fn validate_image(filename: &str, content_type: Option<&str>) -> Result<&'static str, ApiError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let extension = ALLOWED_EXTENSIONS
        .iter()
        .find(|e| **e == extension)
        .copied()
        .ok_or_else(|| {
            ApiError::bad_request("only image files (JPEG, PNG, GIF) are allowed")
        })?;

    match content_type {
        Some(mime) if ALLOWED_MIME_TYPES.contains(&mime) => Ok(extension),
        _ => Err(ApiError::bad_request(
            "only image files (JPEG, PNG, GIF) are allowed",
        )),
    }
}

/// Collision-resistant filename preserving the validated extension
fn generate_filename(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

/// Best-effort deletion of a stored image by its public URL.
///
/// The database delete is the operation of record; a missing or
/// undeletable file is logged and never surfaced to the caller.
pub async fn remove_stored_image(image_url: &str) {
    let uploads = &config::config().uploads;

    let Some(path) = url_to_path(image_url, &uploads.public_prefix, &uploads.directory) else {
        tracing::warn!("Refusing to delete file outside the upload directory: {}", image_url);
        return;
    };

    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::info!("Deleted stored image {}", path.display()),
        Err(e) => tracing::warn!("Failed to delete stored image {}: {}", path.display(), e),
    }
}

/// Map a stored public URL back to its on-disk path.
///
/// Only bare filenames directly under the public prefix are accepted;
/// anything with path separators or traversal segments is rejected.
fn url_to_path(image_url: &str, public_prefix: &str, directory: &str) -> Option<PathBuf> {
    let filename = image_url
        .strip_prefix(public_prefix)?
        .strip_prefix('/')?;

    if filename.is_empty() || filename.contains('/') || filename.contains("..") {
        return None;
    }

    Some(Path::new(directory).join(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_images_and_normalizes_extension() {
        assert_eq!(validate_image("photo.JPG", Some("image/jpeg")).unwrap(), "jpg");
        assert_eq!(validate_image("a.png", Some("image/png")).unwrap(), "png");
        assert_eq!(validate_image("anim.gif", Some("image/gif")).unwrap(), "gif");
        // Nonstandard but widely sent JPEG declaration.
        assert_eq!(validate_image("photo.jpg", Some("image/jpg")).unwrap(), "jpg");
    }

    #[test]
    fn rejects_disallowed_extension_or_mime() {
        assert!(validate_image("doc.pdf", Some("application/pdf")).is_err());
        assert!(validate_image("image.bmp", Some("image/bmp")).is_err());
        // Extension and declared type must both pass.
        assert!(validate_image("sneaky.png", Some("application/octet-stream")).is_err());
        assert!(validate_image("sneaky.exe", Some("image/png")).is_err());
        assert!(validate_image("no-extension", Some("image/png")).is_err());
    }

    #[test]
    fn generated_filenames_preserve_extension_and_do_not_collide() {
        let a = generate_filename("png");
        let b = generate_filename("png");
        assert!(a.ends_with(".png"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn removing_a_missing_file_is_not_an_error() {
        // The row deletion already happened; a file that is gone from disk
        // must only be logged, never panic or surface a failure.
        remove_stored_image("/public/uploads/already-gone.png").await;
    }

    #[test]
    fn url_to_path_only_accepts_files_under_the_prefix() {
        let to_path = |url: &str| url_to_path(url, "/public/uploads", "public/uploads");

        assert_eq!(
            to_path("/public/uploads/abc.png"),
            Some(PathBuf::from("public/uploads/abc.png"))
        );
        assert_eq!(to_path("/public/uploads/../secrets.txt"), None);
        assert_eq!(to_path("/public/uploads/nested/file.png"), None);
        assert_eq!(to_path("/etc/passwd"), None);
        assert_eq!(to_path("/public/uploads/"), None);
    }
}
