//! Car listing marketplace client
//!
//! Browse and search car listings, publish new ones with photos and manage a
//! dealer's own listings against a managed backend providing auth, a listings
//! table and object storage.

pub mod auth;
pub mod browse;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod fetch;
pub mod listings;
pub mod notify;
pub mod routes;
pub mod storage;
pub mod submission;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::{Auth, SessionProvider, SessionStore};
use crate::browse::BrowseFlow;
use crate::config::MarketplaceConfig;
use crate::dashboard::DashboardFlow;
use crate::error::Result;
use crate::listings::{ListingRepository, RestListingRepository};
use crate::notify::{Notifier, TracingNotifier};
use crate::routes::{guard, Route, RouteDecision};
use crate::storage::{ImageStore, RestImageStore};
use crate::submission::SubmissionFlow;

/// The main entry point: owns the shared session and backend clients and
/// hands out flows wired to them.
pub struct Marketplace {
    config: MarketplaceConfig,
    /// HTTP client shared by every backend client
    http_client: Client,
    session: Arc<SessionStore>,
    auth: Auth,
    listings: Arc<dyn ListingRepository>,
    images: Arc<dyn ImageStore>,
    notifier: Arc<dyn Notifier>,
}

impl Marketplace {
    /// Create a new marketplace client
    ///
    /// # Example
    ///
    /// ```
    /// use carmarket::auth::SessionProvider;
    /// use carmarket::{config::MarketplaceConfig, Marketplace};
    ///
    /// # fn main() -> carmarket::error::Result<()> {
    /// let config = MarketplaceConfig::new("https://cars.example.com", "anon-key")?;
    /// let marketplace = Marketplace::new(config)?;
    /// assert!(marketplace.session().state().is_loading());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: MarketplaceConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let url = config.base_url();
        let key = config.anon_key.clone();
        let options = &config.options;

        let session = Arc::new(SessionStore::new());
        let provider: Arc<dyn SessionProvider> = session.clone();

        let auth = Auth::new(&url, &key, http_client.clone(), options, session.clone());
        let listings = Arc::new(RestListingRepository::new(
            &url,
            &key,
            http_client.clone(),
            options,
            provider.clone(),
        ));
        let images = Arc::new(RestImageStore::new(
            &url,
            &key,
            http_client.clone(),
            options,
            provider,
        ));

        Ok(Self {
            config,
            http_client,
            session,
            auth,
            listings,
            images,
            notifier: Arc::new(TracingNotifier),
        })
    }

    /// Create a client from `CARMARKET_URL` and `CARMARKET_ANON_KEY`
    pub fn from_env() -> Result<Self> {
        Self::new(MarketplaceConfig::from_env()?)
    }

    /// Route notices to the embedding UI instead of the log
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn config(&self) -> &MarketplaceConfig {
        &self.config
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Get a reference to the auth client
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The session store every flow reads from
    pub fn session(&self) -> Arc<SessionStore> {
        self.session.clone()
    }

    pub fn listings(&self) -> Arc<dyn ListingRepository> {
        self.listings.clone()
    }

    pub fn images(&self) -> Arc<dyn ImageStore> {
        self.images.clone()
    }

    /// The home page flow
    pub fn browse(&self) -> BrowseFlow {
        BrowseFlow::new(self.listings.clone())
    }

    /// A fresh new-listing flow
    pub fn submission(&self) -> SubmissionFlow {
        SubmissionFlow::new(
            self.session.clone(),
            self.listings.clone(),
            self.images.clone(),
            self.notifier.clone(),
        )
        .with_cleanup_orphaned_images(self.config.options.cleanup_orphaned_images)
    }

    /// The signed-in user's dashboard
    pub fn dashboard(&self) -> DashboardFlow {
        DashboardFlow::new(
            self.session.clone(),
            self.listings.clone(),
            self.images.clone(),
        )
    }

    /// Decide whether a route can render for the current session
    pub fn guard(&self, route: &Route) -> RouteDecision {
        guard(route, &self.session.state())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{Session, SessionProvider, SessionState, SessionStore, StoredTokens};
    pub use crate::browse::{BrowseFlow, ListingCard};
    pub use crate::config::{ClientOptions, MarketplaceConfig};
    pub use crate::dashboard::DashboardFlow;
    pub use crate::error::{Error, Result};
    pub use crate::listings::{ImageRef, Listing, ListingRepository, NewListing};
    pub use crate::notify::{Notice, Notifier};
    pub use crate::routes::{Route, RouteDecision};
    pub use crate::storage::{ImageBlob, ImageStore, UploadedImage};
    pub use crate::submission::{Field, SubmissionFlow, SubmissionState, SubmitOutcome};
    pub use crate::Marketplace;
}
