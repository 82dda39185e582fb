//! The dealer dashboard: the signed-in user's own listings

use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{SessionProvider, SessionUser};
use crate::error::{Error, Result};
use crate::listings::{Listing, ListingRepository};
use crate::storage::ImageStore;

pub struct DashboardFlow {
    session: Arc<dyn SessionProvider>,
    listings: Arc<dyn ListingRepository>,
    images: Arc<dyn ImageStore>,
    loaded: Vec<Listing>,
}

impl DashboardFlow {
    pub fn new(
        session: Arc<dyn SessionProvider>,
        listings: Arc<dyn ListingRepository>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            session,
            listings,
            images,
            loaded: Vec::new(),
        }
    }

    fn current_user(&self) -> Result<SessionUser> {
        self.session.user().ok_or(Error::NotSignedIn)
    }

    /// Load the signed-in user's listings, newest first
    pub async fn load(&mut self) -> Result<&[Listing]> {
        let user = self.current_user()?;
        self.loaded = self.listings.list_by_owner(&user.id).await?;
        Ok(&self.loaded)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.loaded
    }

    /// Delete one of the user's listings and then its photos.
    ///
    /// Photo deletions that fail are logged; the listing is gone either way.
    pub async fn delete_listing(&mut self, id: &str) -> Result<()> {
        let user = self.current_user()?;

        let listing = match self.loaded.iter().find(|listing| listing.id == id) {
            Some(listing) => listing.clone(),
            None => self
                .listings
                .get(id)
                .await?
                .ok_or_else(|| Error::database(format!("listing {} not found", id)))?,
        };

        if listing.owner_id != user.id {
            return Err(Error::auth(format!(
                "listing {} belongs to another user",
                id
            )));
        }

        self.listings.delete(id).await?;
        info!("deleted listing {}", id);

        for image in &listing.images {
            if let Err(e) = self.images.delete(&image.owner_id, &image.name).await {
                warn!("photo {} of listing {} left in storage: {}", image.name, id, e);
            }
        }

        self.loaded.retain(|listing| listing.id != id);
        Ok(())
    }
}
