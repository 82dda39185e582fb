//! Configuration options for the marketplace client

use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Environment variable holding the backend base URL
pub const URL_ENV: &str = "CARMARKET_URL";

/// Environment variable holding the anonymous API key
pub const ANON_KEY_ENV: &str = "CARMARKET_ANON_KEY";

/// Configuration options for the marketplace client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Table holding the listings
    pub listings_table: String,

    /// Storage bucket holding listing photos
    pub storage_bucket: String,

    /// Folder inside the bucket; objects live at `{folder}/{owner}/{name}`
    pub images_folder: String,

    /// Delete already uploaded photos when creating the listing fails
    pub cleanup_orphaned_images: bool,

    /// Value sent in the `X-Client-Info` header
    pub client_info: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
            listings_table: "cars".to_string(),
            storage_bucket: "marketplace".to_string(),
            images_folder: "images".to_string(),
            cleanup_orphaned_images: false,
            client_info: format!("carmarket/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientOptions {
    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the listings table
    pub fn with_listings_table(mut self, value: &str) -> Self {
        self.listings_table = value.to_string();
        self
    }

    /// Set the storage bucket
    pub fn with_storage_bucket(mut self, value: &str) -> Self {
        self.storage_bucket = value.to_string();
        self
    }

    /// Set the images folder
    pub fn with_images_folder(mut self, value: &str) -> Self {
        self.images_folder = value.to_string();
        self
    }

    /// Set whether orphaned photos are deleted after a failed submission
    pub fn with_cleanup_orphaned_images(mut self, value: bool) -> Self {
        self.cleanup_orphaned_images = value;
        self
    }
}

/// Connection settings for the backend project
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub url: Url,
    pub anon_key: String,
    pub options: ClientOptions,
}

impl MarketplaceConfig {
    /// Creates a new configuration, validating the URL and key.
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if anon_key.is_empty() {
            return Err(Error::config("anon key cannot be empty"));
        }
        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            options: ClientOptions::default(),
        })
    }

    /// Reads `CARMARKET_URL` and `CARMARKET_ANON_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(URL_ENV)
            .map_err(|_| Error::config(format!("{} environment variable not found", URL_ENV)))?;
        let anon_key = std::env::var(ANON_KEY_ENV).map_err(|_| {
            Error::config(format!("{} environment variable not found", ANON_KEY_ENV))
        })?;
        Self::new(&url, &anon_key)
    }

    /// Replace the client options
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Base URL without a trailing slash, ready for path concatenation
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }
}
