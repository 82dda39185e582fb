//! The home page: every listing, newest first, with a name search

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::listings::{Listing, ListingRepository};

/// What a listing card on the home page shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub id: String,
    pub name: String,
    pub year: String,
    pub km: String,
    pub price: String,
    pub city: String,
    pub cover_url: Option<String>,

    /// Render a placeholder block until the cover image reports it loaded
    pub show_placeholder: bool,
}

pub struct BrowseFlow {
    listings: Arc<dyn ListingRepository>,
    input: String,
    results: Vec<Listing>,
    loaded_images: HashSet<String>,
}

impl BrowseFlow {
    pub fn new(listings: Arc<dyn ListingRepository>) -> Self {
        Self {
            listings,
            input: String::new(),
            results: Vec::new(),
            loaded_images: HashSet::new(),
        }
    }

    /// Load every listing, newest first. Loaded-image flags survive.
    pub async fn load(&mut self) -> Result<&[Listing]> {
        self.results = self.listings.list_all().await?;
        debug!("loaded {} listings", self.results.len());
        Ok(&self.results)
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
    }

    /// Run the search box. An empty box reloads everything; otherwise the
    /// current cards and their loaded-image flags are dropped before querying.
    pub async fn search(&mut self) -> Result<&[Listing]> {
        if self.input.is_empty() {
            return self.load().await;
        }

        self.results.clear();
        self.loaded_images.clear();

        self.results = self.listings.search_by_name_prefix(&self.input).await?;
        debug!("{} listings match {:?}", self.results.len(), self.input);
        Ok(&self.results)
    }

    /// The cover image of a card finished loading
    pub fn mark_image_loaded(&mut self, id: &str) {
        self.loaded_images.insert(id.to_string());
    }

    pub fn is_image_loaded(&self, id: &str) -> bool {
        self.loaded_images.contains(id)
    }

    pub fn results(&self) -> &[Listing] {
        &self.results
    }

    pub fn cards(&self) -> Vec<ListingCard> {
        self.results
            .iter()
            .map(|listing| ListingCard {
                id: listing.id.clone(),
                name: listing.name.clone(),
                year: listing.year.clone(),
                km: listing.odometer.clone(),
                price: listing.price.clone(),
                city: listing.city.clone(),
                cover_url: listing.cover_image().map(|image| image.url.clone()),
                show_placeholder: !self.is_image_loaded(&listing.id),
            })
            .collect()
    }
}
