//! Gallery sheet rendering: a fixed 2×5 grid of logos on one A4 page.

pub mod error;
pub mod layout;
pub mod render;

pub use {
    error::{Error, Result},
    layout::{GRID_CELLS, ImageSize, PageSize, Placement},
    render::{RenderedGallery, export_file_name, render, render_page, write_document},
};
