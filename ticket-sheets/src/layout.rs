//! Grid and pagination layout
//!
//! Pure geometry in PDF points with the origin at the bottom-left of the
//! page. Records keep their stored order; cell `i` lands on page
//! `i / cells_per_page` at
//! `row = (i % cells_per_page) / columns`, `col = (i % cells_per_page) % columns`.

use crate::error::{Result, SheetError};

/// A4 width in points
pub const A4_WIDTH_PT: f32 = 595.2756;

/// A4 height in points
pub const A4_HEIGHT_PT: f32 = 841.8898;

/// Page grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub page_width: f32,
    pub page_height: f32,
    pub columns: usize,
    pub rows: usize,
}

impl GridSpec {
    pub fn new(page_width: f32, page_height: f32, columns: usize, rows: usize) -> Result<Self> {
        if columns == 0 || rows == 0 {
            return Err(SheetError::Config(format!(
                "grid must have at least one cell, got {}x{}",
                columns, rows
            )));
        }
        Ok(Self {
            page_width,
            page_height,
            columns,
            rows,
        })
    }

    /// A4 page with the given grid
    pub fn a4(columns: usize, rows: usize) -> Result<Self> {
        Self::new(A4_WIDTH_PT, A4_HEIGHT_PT, columns, rows)
    }

    pub fn cells_per_page(&self) -> usize {
        self.columns * self.rows
    }

    pub fn cell_width(&self) -> f32 {
        self.page_width / self.columns as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.page_height / self.rows as f32
    }

    /// Placement of the record at `index` in stored order
    pub fn place(&self, index: usize) -> CellPlacement {
        let per_page = self.cells_per_page();
        let slot = index % per_page;
        CellPlacement {
            record_index: index,
            page: index / per_page,
            row: slot / self.columns,
            col: slot % self.columns,
        }
    }

    /// Bounding box of a cell. Row 0 is the top of the page.
    pub fn frame(&self, row: usize, col: usize) -> CellFrame {
        let width = self.cell_width();
        let height = self.cell_height();
        CellFrame {
            x: col as f32 * width,
            y: self.page_height - (row + 1) as f32 * height,
            width,
            height,
        }
    }
}

/// Where one record is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement {
    pub record_index: usize,
    pub page: usize,
    pub row: usize,
    pub col: usize,
}

/// Cell rectangle, lower-left corner plus size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellFrame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// All placements, grouped by page
#[derive(Debug, Clone, Default)]
pub struct SheetLayout {
    pages: Vec<Vec<CellPlacement>>,
}

impl SheetLayout {
    pub fn plan(record_count: usize, grid: &GridSpec) -> Self {
        let mut pages: Vec<Vec<CellPlacement>> = Vec::new();
        for index in 0..record_count {
            let placement = grid.place(index);
            if placement.page == pages.len() {
                pages.push(Vec::with_capacity(grid.cells_per_page()));
            }
            pages[placement.page].push(placement);
        }
        Self { pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Vec<CellPlacement>] {
        &self.pages
    }
}

/// Fixed positions inside a ticket cell, in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TicketGeometry {
    pub logo_size: f32,
    pub qr_size: f32,
    /// Distance from the cell top to the logo's lower edge
    pub logo_drop: f32,
    /// Gap between the logo's lower edge and the code baseline
    pub code_gap: f32,
    /// Distance from the cell bottom to the QR's lower edge
    pub qr_lift: f32,
    /// Left padding for text
    pub text_inset: f32,
}

impl Default for TicketGeometry {
    fn default() -> Self {
        Self {
            logo_size: 50.0,
            qr_size: 100.0,
            logo_drop: 60.0,
            code_gap: 20.0,
            qr_lift: 20.0,
            text_inset: 10.0,
        }
    }
}

/// Absolute anchor points of a ticket's elements
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TicketAnchors {
    pub logo: (f32, f32),
    pub code_text: (f32, f32),
    pub qr: (f32, f32),
    pub caption: (f32, f32),
}

impl TicketGeometry {
    pub fn anchors(&self, frame: &CellFrame) -> TicketAnchors {
        let logo_x = frame.x + (frame.width - self.logo_size) / 2.0;
        let logo_y = frame.y + frame.height - self.logo_drop;
        TicketAnchors {
            logo: (logo_x, logo_y),
            code_text: (frame.x + self.text_inset, logo_y - self.code_gap),
            qr: (frame.x + (frame.width - self.qr_size) / 2.0, frame.y + self.qr_lift),
            caption: (frame.x + self.text_inset, frame.y + self.text_inset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridSpec {
        GridSpec::a4(4, 4).unwrap()
    }

    #[test]
    fn test_seventeen_records_two_pages() {
        let layout = SheetLayout::plan(17, &grid());
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.pages()[0].len(), 16);
        assert_eq!(layout.pages()[1].len(), 1);

        let last = layout.pages()[1][0];
        assert_eq!(last.record_index, 16);
        assert_eq!((last.page, last.row, last.col), (1, 0, 0));
    }

    #[test]
    fn test_row_major_order() {
        let grid = grid();
        assert_eq!(grid.place(0), CellPlacement { record_index: 0, page: 0, row: 0, col: 0 });
        assert_eq!(grid.place(3), CellPlacement { record_index: 3, page: 0, row: 0, col: 3 });
        assert_eq!(grid.place(4), CellPlacement { record_index: 4, page: 0, row: 1, col: 0 });
        assert_eq!(grid.place(15), CellPlacement { record_index: 15, page: 0, row: 3, col: 3 });
    }

    #[test]
    fn test_empty_layout() {
        assert_eq!(SheetLayout::plan(0, &grid()).page_count(), 0);
    }

    #[test]
    fn test_zero_grid_rejected() {
        assert!(GridSpec::a4(0, 4).is_err());
        assert!(GridSpec::a4(4, 0).is_err());
    }

    #[test]
    fn test_frames_tile_the_page() {
        let grid = grid();
        let top_left = grid.frame(0, 0);
        assert!((top_left.y + top_left.height - A4_HEIGHT_PT).abs() < 1e-3);
        assert_eq!(top_left.x, 0.0);

        let bottom_right = grid.frame(3, 3);
        assert!(bottom_right.y.abs() < 1e-3);
        assert!((bottom_right.x + bottom_right.width - A4_WIDTH_PT).abs() < 1e-3);
    }

    #[test]
    fn test_ticket_anchors() {
        let frame = CellFrame { x: 100.0, y: 200.0, width: 150.0, height: 210.0 };
        let anchors = TicketGeometry::default().anchors(&frame);
        assert_eq!(anchors.logo, (150.0, 350.0));
        assert_eq!(anchors.code_text, (110.0, 330.0));
        assert_eq!(anchors.qr, (125.0, 220.0));
        assert_eq!(anchors.caption, (110.0, 210.0));
    }
}
