//! PDF backend
//!
//! Each ticket: bordered cell, logo (or text mark) centred near the top,
//! `Code : {ticket}` below it, QR code centred near the bottom and the
//! caption at the bottom-left.

use crate::config::SheetConfig;
use crate::error::{Result, SheetError};
use crate::layout::{CellFrame, GridSpec, SheetLayout, TicketAnchors, TicketGeometry};
use crate::qr::{QrMatrix, QUIET_ZONE};
use beneficiary_ledger::BeneficiaryRecord;
use printpdf::image_crate::GenericImageView;
use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm, PdfDocument,
    PdfLayerReference, Rect, Rgb,
};
use std::path::Path;

const LAYER: &str = "Tickets";
const CODE_FONT_SIZE: f32 = 12.0;
const CAPTION_FONT_SIZE: f32 = 10.0;
const BORDER_THICKNESS: f32 = 1.0;

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

struct Fonts {
    bold: IndirectFontRef,
    regular: IndirectFontRef,
}

/// Logo decoded once, drawn in every cell
struct Logo {
    image: ImageXObject,
    width_px: u32,
    height_px: u32,
}

impl Logo {
    fn load(path: &Path) -> Result<Self> {
        let decoded = printpdf::image_crate::open(path)
            .map_err(|e| SheetError::Logo(format!("{:?}: {}", path, e)))?;
        Ok(Self {
            width_px: decoded.width(),
            height_px: decoded.height(),
            image: Image::from_dynamic_image(&decoded).image,
        })
    }

    /// Draw scaled to a `size` x `size` point square
    fn draw(&self, layer: &PdfLayerReference, x: f32, y: f32, size: f32) {
        // At `dpi`, the image is exactly `size` points wide
        let dpi = self.width_px as f32 * 72.0 / size;
        let natural_height = self.height_px as f32 * 72.0 / dpi;
        let scale_y = if natural_height > 0.0 { size / natural_height } else { 1.0 };

        Image::from(self.image.clone()).add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(mm(x)),
                translate_y: Some(mm(y)),
                scale_y: Some(scale_y),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }
}

/// Render records into a PDF document
pub fn render_pdf(records: &[BeneficiaryRecord], config: &SheetConfig) -> Result<Vec<u8>> {
    if records.is_empty() {
        return Err(SheetError::Empty);
    }

    let grid = GridSpec::a4(config.columns, config.rows)?;
    let layout = SheetLayout::plan(records.len(), &grid);
    let geometry = TicketGeometry::default();

    let logo = config.logo_path.as_deref().map(Logo::load).transpose()?;

    // Matrices are built up front so an unencodable record fails before any drawing
    let matrices = records
        .iter()
        .map(QrMatrix::for_record)
        .collect::<Result<Vec<_>>>()?;

    let (doc, first_page, first_layer) = PdfDocument::new(
        config.title.as_str(),
        mm(grid.page_width),
        mm(grid.page_height),
        LAYER,
    );

    let fonts = Fonts {
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| SheetError::Pdf(e.to_string()))?,
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| SheetError::Pdf(e.to_string()))?,
    };

    for (page_number, cells) in layout.pages().iter().enumerate() {
        let (page, layer) = if page_number == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(grid.page_width), mm(grid.page_height), LAYER)
        };
        let layer = doc.get_page(page).get_layer(layer);
        layer.set_outline_color(black());
        layer.set_fill_color(black());
        layer.set_outline_thickness(BORDER_THICKNESS);

        for cell in cells {
            let record = &records[cell.record_index];
            let frame = grid.frame(cell.row, cell.col);
            let anchors = geometry.anchors(&frame);

            draw_ticket(
                &layer,
                &fonts,
                logo.as_ref(),
                config,
                &geometry,
                &frame,
                &anchors,
                record,
                &matrices[cell.record_index],
            );
        }

        tracing::debug!(page = page_number + 1, tickets = cells.len(), "Page laid out");
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| SheetError::Pdf(e.to_string()))?;

    tracing::info!(
        tickets = records.len(),
        pages = layout.page_count(),
        bytes = bytes.len(),
        "Ticket sheet rendered"
    );
    Ok(bytes)
}

/// Render and write to `path`, returning the document size
pub fn render_to_file(
    records: &[BeneficiaryRecord],
    config: &SheetConfig,
    path: impl AsRef<Path>,
) -> Result<u64> {
    let bytes = render_pdf(records, config)?;
    std::fs::write(path.as_ref(), &bytes)?;
    Ok(bytes.len() as u64)
}

#[allow(clippy::too_many_arguments)]
fn draw_ticket(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    logo: Option<&Logo>,
    config: &SheetConfig,
    geometry: &TicketGeometry,
    frame: &CellFrame,
    anchors: &TicketAnchors,
    record: &BeneficiaryRecord,
    matrix: &QrMatrix,
) {
    // Border
    layer.add_rect(
        Rect::new(
            mm(frame.x),
            mm(frame.y),
            mm(frame.x + frame.width),
            mm(frame.y + frame.height),
        )
        .with_mode(PaintMode::Stroke),
    );

    // Mark
    let (logo_x, logo_y) = anchors.logo;
    match logo {
        Some(logo) => logo.draw(layer, logo_x, logo_y, geometry.logo_size),
        None => {
            // Roughly centred: Helvetica-Bold averages ~0.6 em per glyph
            let text_width = config.mark_text.chars().count() as f32 * CODE_FONT_SIZE * 0.6;
            let x = frame.x + (frame.width - text_width) / 2.0;
            layer.use_text(
                config.mark_text.as_str(),
                CODE_FONT_SIZE,
                mm(x),
                mm(logo_y + geometry.logo_size / 2.0),
                &fonts.bold,
            );
        }
    }

    // Ticket code
    let (code_x, code_y) = anchors.code_text;
    layer.use_text(
        format!("Code : {}", record.ticket_code),
        CODE_FONT_SIZE,
        mm(code_x),
        mm(code_y),
        &fonts.bold,
    );

    // QR code
    let (qr_x, qr_y) = anchors.qr;
    draw_qr(layer, matrix, qr_x, qr_y, geometry.qr_size);

    // Caption
    let (caption_x, caption_y) = anchors.caption;
    layer.use_text(
        config.caption.as_str(),
        CAPTION_FONT_SIZE,
        mm(caption_x),
        mm(caption_y),
        &fonts.regular,
    );
}

/// Dark modules as filled squares inside a `size` point square at (x, y)
fn draw_qr(layer: &PdfLayerReference, matrix: &QrMatrix, x: f32, y: f32, size: f32) {
    let module = size / matrix.width_with_quiet_zone() as f32;
    let top = y + size;

    for (col, row) in matrix.dark_modules() {
        let left = x + (col + QUIET_ZONE) as f32 * module;
        let upper = top - (row + QUIET_ZONE) as f32 * module;
        layer.add_rect(
            Rect::new(mm(left), mm(upper - module), mm(left + module), mm(upper))
                .with_mode(PaintMode::Fill),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beneficiary_ledger::{DistributionFlags, TicketCode};

    fn records(count: usize) -> Vec<BeneficiaryRecord> {
        (0..count)
            .map(|i| BeneficiaryRecord {
                ticket_code: TicketCode::new(format!("A{:03}", i)),
                name: format!("Beneficiary {}", i),
                age: "30".to_string(),
                partner_info: String::new(),
                card_info: String::new(),
                flags: DistributionFlags::default(),
            })
            .collect()
    }

    #[test]
    fn test_render_produces_pdf() {
        let bytes = render_pdf(&records(17), &SheetConfig::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_empty_rejected() {
        let err = render_pdf(&[], &SheetConfig::default()).unwrap_err();
        assert!(matches!(err, SheetError::Empty));
    }

    #[test]
    fn test_missing_logo_rejected() {
        let config = SheetConfig {
            logo_path: Some("/nonexistent/logo.jpeg".into()),
            ..SheetConfig::default()
        };
        let err = render_pdf(&records(1), &config).unwrap_err();
        assert!(matches!(err, SheetError::Logo(_)));
    }

    #[test]
    fn test_render_with_logo() {
        let dir = tempfile::tempdir().unwrap();
        let logo_path = dir.path().join("logo.png");
        printpdf::image_crate::RgbImage::from_pixel(
            24,
            12,
            printpdf::image_crate::Rgb([200, 30, 30]),
        )
        .save(&logo_path)
        .unwrap();

        let config = SheetConfig {
            logo_path: Some(logo_path),
            ..SheetConfig::default()
        };
        let bytes = render_pdf(&records(17), &config).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickets.pdf");
        let written = render_to_file(&records(3), &SheetConfig::default(), &path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
    }
}
