//! In-memory listing repository for tests and offline tools

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::listings::{Listing, ListingRepository, NamePrefixRange, NewListing};

/// Keeps listings in a vector and mimics the ordering of the REST table
#[derive(Debug, Default)]
pub struct MemoryListingRepository {
    rows: Mutex<Vec<Listing>>,
    fail_writes: AtomicBool,
}

impl MemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `create` and `delete` fail until switched off again
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Copy of every stored row in insertion order
    pub fn snapshot(&self) -> Vec<Listing> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<Listing>>> {
        self.rows
            .lock()
            .map_err(|_| Error::database("listing store lock poisoned"))
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                message: "listing store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn newest_first(mut rows: Vec<Listing>) -> Vec<Listing> {
    rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    rows
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn create(&self, listing: NewListing) -> Result<Listing> {
        self.check_writable()?;
        let created = listing.with_id(Uuid::new_v4().to_string());
        self.rows()?.push(created.clone());
        Ok(created)
    }

    async fn list_all(&self) -> Result<Vec<Listing>> {
        Ok(newest_first(self.rows()?.clone()))
    }

    async fn list_in_name_range(&self, range: &NamePrefixRange) -> Result<Vec<Listing>> {
        let mut rows: Vec<Listing> = self
            .rows()?
            .iter()
            .filter(|listing| range.contains(&listing.name))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn get(&self, id: &str) -> Result<Option<Listing>> {
        Ok(self.rows()?.iter().find(|listing| listing.id == id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>> {
        let rows = self
            .rows()?
            .iter()
            .filter(|listing| listing.owner_id == owner_id)
            .cloned()
            .collect();
        Ok(newest_first(rows))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.rows()?.retain(|listing| listing.id != id);
        Ok(())
    }
}
