//! JSON file-backed gallery persistence with atomic writes.

use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    tokio::fs,
    tracing::{debug, warn},
};

use crate::{
    error::Result,
    store::{GalleryDocument, GalleryPersistence},
};

/// Whole-document JSON file. Every save rewrites the file.
pub struct FileGalleryPersistence {
    path: PathBuf,
}

impl FileGalleryPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write to a temp file, keep the previous version as `.bak`, then
    /// rename over the target.
    async fn atomic_write(&self, json: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await?;

        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = self.path.with_extension("json.bak");
            if let Err(e) = fs::copy(&self.path, &bak).await {
                warn!(path = %bak.display(), error = %e, "failed to back up gallery file");
            }
        }

        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl GalleryPersistence for FileGalleryPersistence {
    async fn load(&self) -> Result<GalleryDocument> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!(path = %self.path.display(), "no gallery file yet");
            return Ok(GalleryDocument::new());
        }
        let data = fs::read_to_string(&self.path).await?;
        if data.trim().is_empty() {
            return Ok(GalleryDocument::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    async fn save(&self, document: &GalleryDocument) -> Result<()> {
        let json = serde_json::to_vec_pretty(document)?;
        self.atomic_write(&json).await?;
        debug!(path = %self.path.display(), users = document.len(), "galleries saved");
        Ok(())
    }
}
