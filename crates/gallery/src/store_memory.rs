//! In-memory persistence for tests and dry runs.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;

use crate::{
    error::{Error, Result},
    store::{GalleryDocument, GalleryPersistence},
};

/// Keeps the last saved document in memory. Can be switched into a failing
/// mode to exercise error paths.
#[derive(Default)]
pub struct InMemoryGalleryPersistence {
    document: Mutex<GalleryDocument>,
    saves: AtomicUsize,
    failing: AtomicBool,
}

impl InMemoryGalleryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: GalleryDocument) -> Self {
        Self {
            document: Mutex::new(document),
            ..Self::default()
        }
    }

    /// Make every subsequent load and save fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Last saved document.
    pub fn snapshot(&self) -> GalleryDocument {
        self.document
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::persistence("in-memory backend set to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl GalleryPersistence for InMemoryGalleryPersistence {
    async fn load(&self) -> Result<GalleryDocument> {
        self.check()?;
        Ok(self.snapshot())
    }

    async fn save(&self, document: &GalleryDocument) -> Result<()> {
        self.check()?;
        *self.document.lock().unwrap_or_else(|e| e.into_inner()) = document.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
