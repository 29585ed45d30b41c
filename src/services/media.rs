use std::path::{Component, Path, PathBuf};

use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine,
};
use image::ImageFormat;
use thiserror::Error;
use uuid::Uuid;

use crate::api::origin::RequestOrigin;
use crate::config;

const RECIPE_IMAGE_DIR: &str = "recipes/images";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Image must be a data URI of the form data:image/<type>;base64,<data>.")]
    NotDataUri,

    #[error("Unsupported image type: {0}.")]
    UnsupportedType(String),

    #[error("Image data is not valid base64.")]
    InvalidBase64,

    #[error("The submitted data is empty.")]
    Empty,

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,

    #[error("Media storage failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Image payload decoded from a data URI, with the extension its bytes call for
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

/// Decode `data:image/<type>;base64,<payload>` and sniff the real format from the bytes
pub fn decode_data_uri(raw: &str) -> Result<DecodedImage, MediaError> {
    let rest = raw.trim().strip_prefix("data:").ok_or(MediaError::NotDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(MediaError::NotDataUri)?;
    let mime = header.strip_suffix(";base64").ok_or(MediaError::NotDataUri)?;

    if !mime.to_ascii_lowercase().starts_with("image/") {
        return Err(MediaError::UnsupportedType(mime.to_string()));
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if payload.is_empty() {
        return Err(MediaError::Empty);
    }

    let bytes = STANDARD
        .decode(payload.as_bytes())
        .or_else(|_| URL_SAFE.decode(payload.as_bytes()))
        .map_err(|_| MediaError::InvalidBase64)?;

    let extension = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => "png",
        Ok(ImageFormat::Jpeg) => "jpg",
        Ok(ImageFormat::Gif) => "gif",
        Ok(ImageFormat::WebP) => "webp",
        Ok(other) => return Err(MediaError::UnsupportedType(format!("{:?}", other).to_lowercase())),
        Err(_) => return Err(MediaError::NotAnImage),
    };

    Ok(DecodedImage { bytes, extension })
}

/// Filesystem-backed media store; paths in the database are relative to `root`
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn from_config() -> Self {
        let media = &config::config().media;
        Self::new(media.root.clone(), media.url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write a recipe image under a fresh name and return its relative path
    pub async fn save_recipe_image(&self, image: &DecodedImage) -> Result<String, MediaError> {
        let relative = format!("{}/{}.{}", RECIPE_IMAGE_DIR, Uuid::new_v4().simple(), image.extension);
        let full = self.root.join(&relative);
        if let Some(dir) = full.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&full, &image.bytes).await?;
        tracing::debug!("Stored image {} ({} bytes)", relative, image.bytes.len());
        Ok(relative)
    }

    /// Best-effort removal; a missing file is not an error
    pub async fn remove(&self, relative: &str) {
        let Some(full) = self.resolve(relative) else {
            tracing::warn!("Refusing to remove media outside root: {}", relative);
            return;
        };
        match tokio::fs::remove_file(&full).await {
            Ok(()) => tracing::debug!("Removed image {}", relative),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove image {}: {}", relative, e),
        }
    }

    /// Absolute URL for a stored file
    pub fn url(&self, origin: &RequestOrigin, relative: &str) -> String {
        origin.absolute(&format!("{}{}", self.url_prefix, relative.trim_start_matches('/')))
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let path = Path::new(relative);
        if relative.is_empty() || !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return None;
        }
        Some(self.root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_B64: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn decodes_png_data_uri() {
        let image = decode_data_uri(&format!("data:image/png;base64,{}", PNG_B64)).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn format_comes_from_bytes_not_mime() {
        let image = decode_data_uri(&format!("data:image/jpeg;base64,{}", PNG_B64)).unwrap();
        assert_eq!(image.extension, "png");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(decode_data_uri(PNG_B64), Err(MediaError::NotDataUri)));
        assert!(matches!(
            decode_data_uri("data:image/png,plain"),
            Err(MediaError::NotDataUri)
        ));
        assert!(matches!(
            decode_data_uri("data:text/plain;base64,aGVsbG8="),
            Err(MediaError::UnsupportedType(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(MediaError::InvalidBase64)
        ));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,aGVsbG8gd29ybGQ="),
            Err(MediaError::NotAnImage)
        ));
        assert!(matches!(decode_data_uri("data:image/png;base64,"), Err(MediaError::Empty)));
    }

    #[test]
    fn urls_are_absolute() {
        let storage = MediaStorage::new("/tmp/media", "/media/");
        let origin = RequestOrigin {
            scheme: "https".into(),
            host: "foodgram.example.com".into(),
        };
        assert_eq!(
            storage.url(&origin, "recipes/images/a.png"),
            "https://foodgram.example.com/media/recipes/images/a.png"
        );
    }

    #[test]
    fn resolve_rejects_traversal() {
        let storage = MediaStorage::new("/tmp/media", "/media/");
        assert!(storage.resolve("../etc/passwd").is_none());
        assert!(storage.resolve("/etc/passwd").is_none());
        assert!(storage.resolve("").is_none());
        assert_eq!(
            storage.resolve("recipes/images/a.png"),
            Some(PathBuf::from("/tmp/media/recipes/images/a.png"))
        );
    }

    #[tokio::test]
    async fn save_and_remove_round_trip() {
        let root = std::env::temp_dir().join(format!("foodgram-media-{}", Uuid::new_v4().simple()));
        let storage = MediaStorage::new(&root, "/media/");
        let image = decode_data_uri(&format!("data:image/png;base64,{}", PNG_B64)).unwrap();

        let relative = storage.save_recipe_image(&image).await.unwrap();
        assert!(relative.starts_with("recipes/images/"));
        assert!(relative.ends_with(".png"));
        let full = root.join(&relative);
        assert_eq!(tokio::fs::read(&full).await.unwrap(), image.bytes);

        storage.remove(&relative).await;
        assert!(!full.exists());
        storage.remove(&relative).await;

        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
