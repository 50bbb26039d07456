//! PDF output for a laid-out gallery.

use std::{
    io::BufWriter,
    path::{Path, PathBuf},
};

use {
    printpdf::{
        Image, ImageTransform, Mm, PdfDocument,
        image_crate::{self, DynamicImage, GenericImageView},
    },
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    layout::{self, GRID_CELLS, ImageSize, PageSize, Placement},
};

const DOCUMENT_TITLE: &str = "TV logo gallery";
/// Images are embedded at 72 dpi so one pixel maps to one point.
const IMAGE_DPI: f32 = 72.0;

/// A rendered sheet together with the layout that produced it.
#[derive(Debug)]
pub struct RenderedGallery {
    pub bytes: Vec<u8>,
    pub placements: Vec<Placement>,
    /// Entries that could not be loaded and were left out.
    pub skipped: usize,
}

/// Render up to ten logos onto an A4 sheet.
pub fn render<P: AsRef<Path>>(paths: &[P]) -> Result<RenderedGallery> {
    render_page(PageSize::A4, paths)
}

/// Render up to ten logos onto a page of the given size.
///
/// Logos that cannot be opened or decoded are skipped and their cell stays
/// empty. An empty input is rejected before any layout happens.
pub fn render_page<P: AsRef<Path>>(page: PageSize, paths: &[P]) -> Result<RenderedGallery> {
    if paths.is_empty() {
        return Err(Error::EmptyGallery);
    }
    if paths.len() > GRID_CELLS {
        debug!(
            requested = paths.len(),
            "more logos than grid cells, truncating"
        );
    }

    let images: Vec<Option<DynamicImage>> = paths
        .iter()
        .take(GRID_CELLS)
        .map(|p| load_image(p.as_ref()))
        .collect();
    let sizes: Vec<Option<ImageSize>> = images
        .iter()
        .map(|img| {
            img.as_ref().map(|img| {
                let (width, height) = img.dimensions();
                ImageSize { width, height }
            })
        })
        .collect();
    let placements = layout::plan(page, &sizes);

    let (doc, page_index, layer_index) = PdfDocument::new(
        DOCUMENT_TITLE,
        pt_to_mm(page.width),
        pt_to_mm(page.height),
        "Logos",
    );
    let layer = doc.get_page(page_index).get_layer(layer_index);

    for placement in &placements {
        let Some(image) = images[placement.index].as_ref() else {
            continue;
        };
        Image::from_dynamic_image(image).add_to_layer(layer.clone(), ImageTransform {
            translate_x: Some(pt_to_mm(placement.x)),
            translate_y: Some(pt_to_mm(placement.y)),
            rotate: None,
            scale_x: Some(placement.scale),
            scale_y: Some(placement.scale),
            dpi: Some(IMAGE_DPI),
        });
    }

    drop(layer);

    let mut bytes = Vec::new();
    {
        let mut writer = BufWriter::new(&mut bytes);
        doc.save(&mut writer)
            .map_err(|e| Error::render(format!("failed to serialize document: {e}")))?;
    }

    let skipped = images.len() - placements.len();
    info!(
        placed = placements.len(),
        skipped,
        size = bytes.len(),
        "gallery pdf rendered"
    );
    Ok(RenderedGallery {
        bytes,
        placements,
        skipped,
    })
}

/// Write a rendered document to `dest`, creating parent directories.
pub fn write_document(dest: &Path, bytes: &[u8]) -> Result<()> {
    let write_err = |source: std::io::Error| Error::Write {
        path: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(dest, bytes).map_err(write_err)?;
    debug!(path = %dest.display(), size = bytes.len(), "pdf written");
    Ok(())
}

fn load_image(path: &Path) -> Option<DynamicImage> {
    match image_crate::open(path) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "skipping unreadable logo");
            None
        },
    }
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// Default export file name for a user's sheet.
pub fn export_file_name(user: &str) -> PathBuf {
    PathBuf::from(format!("gallery_{user}.pdf"))
}
