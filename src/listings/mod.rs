//! Listing repository backed by the REST table API

mod filter;
pub mod memory;
mod query;
mod types;

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

use crate::auth::SessionProvider;
use crate::config::ClientOptions;
use crate::error::{Error, Result};

pub use filter::*;
pub use memory::MemoryListingRepository;
pub use query::*;
pub use types::*;

/// Create/read/query access to the listings collection
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Write a new listing and return it with its backend-assigned id.
    /// Nothing is validated here; callers validate first.
    async fn create(&self, listing: NewListing) -> Result<Listing>;

    /// Every listing, newest first. Unbounded.
    async fn list_all(&self) -> Result<Vec<Listing>>;

    /// Listings whose name lies in `[prefix, prefix + sentinel)`
    async fn list_in_name_range(&self, range: &NamePrefixRange) -> Result<Vec<Listing>>;

    /// One listing by id
    async fn get(&self, id: &str) -> Result<Option<Listing>>;

    /// Listings created by one owner, newest first
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>>;

    /// Remove a listing row; its photos are left alone
    async fn delete(&self, id: &str) -> Result<()>;

    /// Prefix search on the upper-cased name. An empty input lists everything.
    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Listing>> {
        if prefix.is_empty() {
            return self.list_all().await;
        }
        self.list_in_name_range(&NamePrefixRange::new(prefix)).await
    }
}

/// Listing repository talking to `{url}/rest/v1/{table}`
pub struct RestListingRepository {
    table: Table,
    session: Arc<dyn SessionProvider>,
}

impl RestListingRepository {
    pub fn new(
        url: &str,
        key: &str,
        client: Client,
        options: &ClientOptions,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            table: Table::new(url, key, &options.listings_table, client, &options.client_info),
            session,
        }
    }

    fn table(&self) -> Table {
        match self.session.access_token() {
            Some(token) => self.table.clone().with_auth(&token),
            None => self.table.clone(),
        }
    }
}

#[async_trait]
impl ListingRepository for RestListingRepository {
    async fn create(&self, listing: NewListing) -> Result<Listing> {
        let rows = self
            .table()
            .insert(&listing)
            .execute::<Listing>()
            .await?;

        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| Error::database("insert returned no rows"))?;
        debug!("created listing {}", created.id);
        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<Listing>> {
        self.table()
            .select("*")
            .order("created", SortOrder::Descending)
            .execute::<Listing>()
            .await
    }

    async fn list_in_name_range(&self, range: &NamePrefixRange) -> Result<Vec<Listing>> {
        self.table()
            .select("*")
            .gte(NamePrefixRange::COLUMN, range.lower())
            .lt(NamePrefixRange::COLUMN, range.upper())
            .order(NamePrefixRange::COLUMN, SortOrder::Ascending)
            .execute::<Listing>()
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<Listing>> {
        self.table()
            .select("*")
            .eq("id", id)
            .execute_one::<Listing>()
            .await
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>> {
        self.table()
            .select("*")
            .eq("uid", owner_id)
            .order("created", SortOrder::Descending)
            .execute::<Listing>()
            .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.table().delete().eq("id", id).execute().await
    }
}
