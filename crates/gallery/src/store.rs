//! Gallery store: capped, ordered, duplicate-free channel selections per user.

use std::{collections::BTreeMap, sync::Arc};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tokio::sync::Mutex,
    tracing::{debug, info, warn},
};

use crate::{error::Result, user::UserId};

/// Maximum number of channels a gallery can hold.
pub const GALLERY_CAPACITY: usize = 10;

/// Persisted selection of a single user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGallery {
    #[serde(default)]
    pub selected: Vec<String>,
}

/// The whole persisted state, written in full on every mutation.
pub type GalleryDocument = BTreeMap<UserId, UserGallery>;

/// Persistence backend for the gallery document.
#[async_trait]
pub trait GalleryPersistence: Send + Sync {
    async fn load(&self) -> Result<GalleryDocument>;
    async fn save(&self, document: &GalleryDocument) -> Result<()>;
}

/// Result of [`GalleryStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added { count: usize },
    AlreadyPresent,
    CapacityReached,
}

/// In-memory gallery state with write-through persistence.
///
/// A single async mutex is held across decide, save and commit, so two
/// concurrent adds for one user can never both see room for one more item,
/// and the in-memory state never runs ahead of what was saved.
pub struct GalleryStore {
    persistence: Arc<dyn GalleryPersistence>,
    galleries: Mutex<GalleryDocument>,
}

impl GalleryStore {
    /// Open the store, loading the persisted document.
    ///
    /// A missing or unreadable document is not fatal: the store starts empty.
    pub async fn open(persistence: Arc<dyn GalleryPersistence>) -> Self {
        let document = match persistence.load().await {
            Ok(document) => sanitize(document),
            Err(e) => {
                warn!(error = %e, "failed to load galleries, starting empty");
                GalleryDocument::new()
            },
        };
        info!(users = document.len(), "galleries loaded");
        Self {
            persistence,
            galleries: Mutex::new(document),
        }
    }

    /// Ordered selection of `user`; empty for unknown users.
    pub async fn get(&self, user: &UserId) -> Vec<String> {
        let galleries = self.galleries.lock().await;
        galleries
            .get(user)
            .map(|g| g.selected.clone())
            .unwrap_or_default()
    }

    pub async fn len(&self, user: &UserId) -> usize {
        let galleries = self.galleries.lock().await;
        galleries.get(user).map_or(0, |g| g.selected.len())
    }

    /// Append `key` to the user's gallery unless present or full.
    pub async fn add(&self, user: &UserId, key: &str) -> Result<AddOutcome> {
        let mut galleries = self.galleries.lock().await;
        let current = galleries.get(user).map(|g| g.selected.as_slice()).unwrap_or_default();

        if current.iter().any(|k| k == key) {
            debug!(user_id = %user, key, "channel already in gallery");
            return Ok(AddOutcome::AlreadyPresent);
        }
        if current.len() >= GALLERY_CAPACITY {
            debug!(user_id = %user, key, "gallery full");
            return Ok(AddOutcome::CapacityReached);
        }

        let mut next = galleries.clone();
        let gallery = next.entry(user.clone()).or_default();
        gallery.selected.push(key.to_string());
        let count = gallery.selected.len();

        self.persistence.save(&next).await?;
        *galleries = next;

        info!(user_id = %user, key, count, "channel added to gallery");
        Ok(AddOutcome::Added { count })
    }

    /// Empty the user's gallery and return how many channels were removed.
    pub async fn clear(&self, user: &UserId) -> Result<usize> {
        let mut galleries = self.galleries.lock().await;
        let removed = galleries.get(user).map_or(0, |g| g.selected.len());
        if removed == 0 {
            return Ok(0);
        }

        let mut next = galleries.clone();
        next.insert(user.clone(), UserGallery::default());

        self.persistence.save(&next).await?;
        *galleries = next;

        info!(user_id = %user, removed, "gallery cleared");
        Ok(removed)
    }
}

/// Drop duplicates and anything past the cap from a loaded document.
fn sanitize(mut document: GalleryDocument) -> GalleryDocument {
    for (user, gallery) in &mut document {
        let before = gallery.selected.len();
        let mut seen = std::collections::HashSet::new();
        gallery.selected.retain(|k| seen.insert(k.clone()));
        gallery.selected.truncate(GALLERY_CAPACITY);
        if gallery.selected.len() != before {
            warn!(
                user_id = %user,
                before,
                after = gallery.selected.len(),
                "trimmed invalid persisted gallery"
            );
        }
    }
    document
}
