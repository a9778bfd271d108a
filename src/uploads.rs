//! Product images on local disk, served under `/uploads`.

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Utc;
use rand::Rng;

use crate::error::{AppError, AppResult};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const PUBLIC_PREFIX: &str = "/uploads/";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/400x600?text=Product+Image";
const PRODUCTS_DIR: &str = "products";

/// An image file taken from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn validate(&self) -> AppResult<()> {
        if !self.content_type.starts_with("image/") {
            return Err(AppError::BadRequest("Only image files are allowed!".into()));
        }
        if self.bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest("Image must be 5MB or smaller".into()));
        }
        Ok(())
    }

    fn extension(&self) -> String {
        let from_name = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(str::to_ascii_lowercase);
        from_name.unwrap_or_else(|| extension_for(&self.content_type).to_string())
    }
}

fn extension_for(content_type: &str) -> &str {
    match content_type.trim_start_matches("image/") {
        "jpeg" | "pjpeg" => "jpg",
        "svg+xml" => "svg",
        "" => "img",
        other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other,
        _ => "img",
    }
}

fn new_file_name(ext: &str) -> String {
    let random: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("product-{}-{random}.{ext}", Utc::now().timestamp_millis())
}

async fn write_product_image(upload_dir: &str, ext: &str, bytes: &[u8]) -> AppResult<String> {
    let dir = Path::new(upload_dir).join(PRODUCTS_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::new(err).context("create upload directory")))?;

    let file_name = new_file_name(ext);
    tokio::fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(|err| AppError::Internal(anyhow::Error::new(err).context("write uploaded image")))?;

    tracing::debug!(file = %file_name, size = bytes.len(), "stored product image");
    Ok(format!("{PUBLIC_PREFIX}{PRODUCTS_DIR}/{file_name}"))
}

/// Store an uploaded file and return its public path.
pub async fn save_upload(upload_dir: &str, upload: &ImageUpload) -> AppResult<String> {
    upload.validate()?;
    write_product_image(upload_dir, &upload.extension(), &upload.bytes).await
}

/// Decode a `data:image/...;base64,` URL produced by the cropper.
pub fn decode_data_url(data_url: &str) -> AppResult<Vec<u8>> {
    let invalid = || AppError::BadRequest("Cropped image is not a valid image".into());
    let (meta, payload) = data_url
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(invalid)?;
    if !meta.ends_with(";base64") {
        return Err(invalid());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("Image must be 5MB or smaller".into()));
    }
    Ok(bytes)
}

/// Store a cropped image. The cropper always exports JPEG.
pub async fn save_data_url(upload_dir: &str, data_url: &str) -> AppResult<String> {
    let bytes = decode_data_url(data_url)?;
    write_product_image(upload_dir, "jpg", &bytes).await
}

/// Filesystem path for a public `/uploads/...` path, if it stays inside the upload dir.
fn local_path(upload_dir: &str, public_path: &str) -> Option<PathBuf> {
    let relative = public_path.strip_prefix(PUBLIC_PREFIX)?;
    if relative.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return None;
    }
    Some(Path::new(upload_dir).join(relative))
}

/// Remove a replaced image. Failures are logged and otherwise ignored.
pub async fn remove_image(upload_dir: &str, public_path: &str) {
    let Some(path) = local_path(upload_dir, public_path) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "removed replaced image"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(error = %err, path = %path.display(), "failed to remove image"),
    }
}

pub fn is_local(image: &str) -> bool {
    image.starts_with(PUBLIC_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_images() {
        let upload = ImageUpload {
            file_name: Some("notes.txt".into()),
            content_type: "text/plain".into(),
            bytes: b"hello".to_vec(),
        };
        assert!(upload.validate().is_err());
    }

    #[test]
    fn extension_prefers_file_name() {
        let upload = ImageUpload {
            file_name: Some("Saree.PNG".into()),
            content_type: "image/png".into(),
            bytes: vec![1],
        };
        assert_eq!(upload.extension(), "png");

        let unnamed = ImageUpload {
            file_name: None,
            content_type: "image/jpeg".into(),
            bytes: vec![1],
        };
        assert_eq!(unnamed.extension(), "jpg");
    }

    #[test]
    fn decodes_cropper_output() {
        let bytes = decode_data_url("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(&bytes[..2], &[0xff, 0xd8]);
        assert!(decode_data_url("data:text/plain;base64,aGk=").is_err());
        assert!(decode_data_url("data:image/png,raw").is_err());
    }

    #[test]
    fn local_path_stays_inside_upload_dir() {
        assert_eq!(
            local_path("uploads", "/uploads/products/product-1-2.jpg"),
            Some(Path::new("uploads").join("products/product-1-2.jpg"))
        );
        assert_eq!(local_path("uploads", "/uploads/../Cargo.toml"), None);
        assert_eq!(local_path("uploads", "https://cdn.example/x.jpg"), None);
    }

    #[test]
    fn file_names_follow_the_product_pattern() {
        let name = new_file_name("jpg");
        assert!(name.starts_with("product-"));
        assert!(name.ends_with(".jpg"));
    }
}
