//! Photo storage for listings

pub mod memory;
mod types;

use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::SessionProvider;
use crate::config::ClientOptions;
use crate::error::Result;
use crate::fetch::{Fetch, FetchBuilder};
use crate::listings::ImageRef;

pub use memory::MemoryImageStore;
pub use types::*;

/// Upload and delete listing photos
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store a photo under a freshly generated name owned by `owner_id`.
    /// Non JPEG/PNG blobs are rejected before any network call.
    async fn upload(&self, owner_id: &str, blob: &ImageBlob) -> Result<UploadedImage>;

    /// Remove the photo at the owner/name path
    async fn delete(&self, owner_id: &str, name: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key", default)]
    key: Option<String>,
}

/// Image store backed by the storage REST API
pub struct RestImageStore {
    /// The base URL for the backend project
    url: String,

    /// The anonymous API key
    key: String,

    /// HTTP client used for requests
    client: Client,

    /// Value of the `X-Client-Info` header
    client_info: String,

    bucket: String,
    folder: String,
    session: Arc<dyn SessionProvider>,
}

impl RestImageStore {
    pub fn new(
        url: &str,
        key: &str,
        client: Client,
        options: &ClientOptions,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            client,
            client_info: options.client_info.clone(),
            bucket: options.storage_bucket.clone(),
            folder: options.images_folder.clone(),
            session,
        }
    }

    fn get_url(&self, path: &str) -> String {
        format!("{}/storage/v1{}", self.url, path)
    }

    /// Durable URL of an object in a public bucket
    pub fn public_url(&self, owner_id: &str, name: &str) -> String {
        self.get_url(&format!(
            "/object/public/{}/{}",
            self.bucket,
            image_path(&self.folder, owner_id, name)
        ))
    }

    fn prepare<'a>(&self, fetch: FetchBuilder<'a>) -> FetchBuilder<'a> {
        let bearer = self
            .session
            .access_token()
            .unwrap_or_else(|| self.key.clone());
        fetch
            .header("apikey", &self.key)
            .header("X-Client-Info", &self.client_info)
            .bearer_auth(&bearer)
    }
}

#[async_trait]
impl ImageStore for RestImageStore {
    async fn upload(&self, owner_id: &str, blob: &ImageBlob) -> Result<UploadedImage> {
        let kind = blob.kind()?;
        let preview_url = blob.preview_url()?;

        let name = Uuid::new_v4().to_string();
        let path = image_path(&self.folder, owner_id, &name);
        let url = self.get_url(&format!("/object/{}/{}", self.bucket, path));

        let part = multipart::Part::bytes(blob.bytes.to_vec())
            .file_name(blob.file_name.clone())
            .mime_str(kind.mime().as_ref())?;
        let form = multipart::Form::new().part("file", part);

        let fetch = Fetch::post(&self.client, &url)
            .header("x-upsert", "false")
            .multipart(form);
        let response = self.prepare(fetch).execute::<UploadResponse>().await?;
        debug!(
            "stored {} as {}",
            blob.file_name,
            response.key.as_deref().unwrap_or(&path)
        );

        Ok(UploadedImage {
            image: ImageRef {
                owner_id: owner_id.to_string(),
                url: self.public_url(owner_id, &name),
                name,
            },
            preview_url,
        })
    }

    async fn delete(&self, owner_id: &str, name: &str) -> Result<()> {
        let url = self.get_url(&format!("/object/{}", self.bucket));
        let path = image_path(&self.folder, owner_id, name);

        let body = serde_json::json!({
            "prefixes": [path]
        });

        let fetch = Fetch::delete(&self.client, &url).json(&body)?;
        self.prepare(fetch).execute_checked().await.map_err(|e| {
            warn!("failed to delete {}: {}", path, e);
            e
        })?;

        Ok(())
    }
}
