//! In-memory image store

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::listings::ImageRef;
use crate::storage::{image_path, ImageBlob, ImageStore, UploadedImage};

const FOLDER: &str = "images";

/// Keeps uploaded photos in a map keyed by object path
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
    uploads: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of upload attempts that reached the store, failed ones included
    pub fn upload_attempts(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Paths of every stored object, sorted
    pub fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, owner_id: &str, name: &str) -> bool {
        self.paths().contains(&image_path(FOLDER, owner_id, name))
    }

    fn objects(&self) -> Result<MutexGuard<'_, BTreeMap<String, Bytes>>> {
        self.objects
            .lock()
            .map_err(|_| Error::storage("image store lock poisoned"))
    }
}

fn unavailable() -> Error {
    Error::Api {
        status: 503,
        message: "storage unavailable".to_string(),
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(&self, owner_id: &str, blob: &ImageBlob) -> Result<UploadedImage> {
        let preview_url = blob.preview_url()?;

        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }

        let name = Uuid::new_v4().to_string();
        let path = image_path(FOLDER, owner_id, &name);
        self.objects()?.insert(path.clone(), blob.bytes.clone());

        Ok(UploadedImage {
            image: ImageRef {
                owner_id: owner_id.to_string(),
                name,
                url: format!("memory://{}", path),
            },
            preview_url,
        })
    }

    async fn delete(&self, owner_id: &str, name: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.objects()?.remove(&image_path(FOLDER, owner_id, name));
        Ok(())
    }
}
