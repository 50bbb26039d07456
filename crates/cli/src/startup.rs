//! Shared construction of the catalog and gallery store from config.

use std::sync::Arc;

use {
    anyhow::Context,
    tracing::info,
    tvlogo_catalog::Catalog,
    tvlogo_config::DataConfig,
    tvlogo_gallery::{FileGalleryPersistence, GalleryPersistence, GalleryStore},
};

pub fn load_catalog(data: &DataConfig) -> anyhow::Result<Catalog> {
    let catalog = Catalog::load(&data.catalog_path, data.logo_root.as_deref())
        .with_context(|| format!("failed to load catalog {}", data.catalog_path.display()))?;
    info!(
        channels = catalog.len(),
        path = %data.catalog_path.display(),
        "catalog loaded"
    );
    Ok(catalog)
}

pub async fn open_gallery(data: &DataConfig) -> GalleryStore {
    let persistence: Arc<dyn GalleryPersistence> =
        Arc::new(FileGalleryPersistence::new(&data.gallery_path));
    GalleryStore::open(persistence).await
}
