//! Types for photo storage

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use std::path::Path;

use crate::error::{Error, Result};
use crate::listings::ImageRef;

/// The two photo formats listings accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
}

impl ImageKind {
    /// Parse a content type; parameters such as `charset` are ignored.
    pub fn from_content_type(content_type: &str) -> Result<Self> {
        let parsed: mime::Mime = content_type
            .parse()
            .map_err(|_| Error::UnsupportedImageType(content_type.to_string()))?;

        if parsed.essence_str() == mime::IMAGE_JPEG.essence_str() {
            Ok(ImageKind::Jpeg)
        } else if parsed.essence_str() == mime::IMAGE_PNG.essence_str() {
            Ok(ImageKind::Png)
        } else {
            Err(Error::UnsupportedImageType(content_type.to_string()))
        }
    }

    pub fn mime(&self) -> mime::Mime {
        match self {
            ImageKind::Jpeg => mime::IMAGE_JPEG,
            ImageKind::Png => mime::IMAGE_PNG,
        }
    }
}

/// A photo picked by the user, not yet uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlob {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageBlob {
    pub fn new(file_name: &str, content_type: &str, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing the content type from its extension
    pub async fn from_file(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::general(format!("cannot read {}: {}", path.display(), e)))?;

        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let extension = path
            .extension()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let content_type = match extension.as_str() {
            "jpg" | "jpeg" => mime::IMAGE_JPEG.to_string(),
            "png" => mime::IMAGE_PNG.to_string(),
            _ => mime::APPLICATION_OCTET_STREAM.to_string(),
        };

        Ok(Self::new(&file_name, &content_type, bytes))
    }

    /// Fails with `UnsupportedImageType` for anything but JPEG or PNG
    pub fn kind(&self) -> Result<ImageKind> {
        ImageKind::from_content_type(&self.content_type)
    }

    /// `data:` URL rendering the blob itself, available before any upload
    pub fn preview_url(&self) -> Result<String> {
        let kind = self.kind()?;
        Ok(format!("data:{};base64,{}", kind.mime(), BASE64.encode(&self.bytes)))
    }
}

/// Result of a finished upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    /// What gets stored on the listing
    pub image: ImageRef,

    /// Local preview; never persisted
    pub preview_url: String,
}

/// Object path of a photo inside the bucket
pub fn image_path(folder: &str, owner_id: &str, name: &str) -> String {
    format!("{}/{}/{}", folder, owner_id, name)
}
