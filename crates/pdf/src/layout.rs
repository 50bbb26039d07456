//! Grid placement of logos on a single page.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! the page, so the top-down row index is flipped when computing `y`.

/// Number of grid columns.
pub const GRID_COLUMNS: usize = 5;
/// Number of grid rows.
pub const GRID_ROWS: usize = 2;
/// Total cells on the page; input beyond this is ignored.
pub const GRID_CELLS: usize = GRID_COLUMNS * GRID_ROWS;

/// Share of the cell width an image may occupy.
const WIDTH_FILL: f32 = 0.8;
/// Share of the cell height an image may occupy.
const HEIGHT_FILL: f32 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// A4 portrait, in points.
    pub const A4: Self = Self {
        width: 595.2756,
        height: 841.8898,
    };

    pub fn cell_width(&self) -> f32 {
        self.width / GRID_COLUMNS as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.height / GRID_ROWS as f32
    }
}

/// Pixel dimensions of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Where and how large one image is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Position in the input sequence.
    pub index: usize,
    pub column: usize,
    pub row: usize,
    /// Bottom-left corner of the drawn image.
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Factor applied to the image's pixel size (1 px = 1 pt).
    pub scale: f32,
}

/// Place the image at sequence position `index` into its grid cell.
pub fn place(page: PageSize, index: usize, image: ImageSize) -> Placement {
    let column = index % GRID_COLUMNS;
    let row = index / GRID_COLUMNS;
    let cell_w = page.cell_width();
    let cell_h = page.cell_height();

    let scale = (cell_w * WIDTH_FILL / image.width as f32)
        .min(cell_h * HEIGHT_FILL / image.height as f32);
    let width = image.width as f32 * scale;
    let height = image.height as f32 * scale;

    Placement {
        index,
        column,
        row,
        x: column as f32 * cell_w + (cell_w - width) / 2.0,
        y: page.height - (row as f32 + 1.0) * cell_h + (cell_h - height) / 2.0,
        width,
        height,
        scale,
    }
}

/// Lay out a sequence of images. `None` slots (unresolvable images) leave
/// their cell empty; entries past [`GRID_CELLS`] are dropped.
pub fn plan(page: PageSize, images: &[Option<ImageSize>]) -> Vec<Placement> {
    images
        .iter()
        .take(GRID_CELLS)
        .enumerate()
        .filter_map(|(index, size)| match size {
            Some(size) if size.width > 0 && size.height > 0 => Some(place(page, index, *size)),
            _ => None,
        })
        .collect()
}
