//! Flowing page layout on top of `printpdf`.
//!
//! `printpdf` places everything at absolute coordinates; [`PageCursor`] keeps
//! a vertical position and starts a new page whenever the next block would
//! cross the bottom margin.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;

use crate::error::{AppError, AppResult};

pub const PAGE_WIDTH: f32 = 215.9;
pub const PAGE_HEIGHT: f32 = 279.4;
pub const MARGIN_LEFT: f32 = 25.4;
pub const MARGIN_RIGHT: f32 = 25.4;
pub const MARGIN_TOP: f32 = 25.4;
pub const MARGIN_BOTTOM: f32 = 6.35;

const PT_TO_MM: f32 = 0.352_778;
const LINE_SPACING: f32 = 1.4;
const LAYER_NAME: &str = "Layer 1";

pub fn rgb(color: [u8; 3]) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(color[0]) / 255.0,
        f32::from(color[1]) / 255.0,
        f32::from(color[2]) / 255.0,
        None,
    ))
}

pub const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
pub const DARK_BLUE: [u8; 3] = [0x00, 0x00, 0x8b];
pub const WHITE_SMOKE: [u8; 3] = [0xf5, 0xf5, 0xf5];
pub const BEIGE: [u8; 3] = [0xf5, 0xf5, 0xdc];

pub struct Fonts {
    pub regular: IndirectFontRef,
    pub bold: IndirectFontRef,
}

pub struct PageCursor {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl PageCursor {
    pub fn new(title: &str) -> AppResult<(Self, Fonts)> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| AppError::Render(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| AppError::Render(format!("PDF font error: {e}")))?;
        let layer = doc.get_page(page).get_layer(layer);

        let cursor = Self {
            doc,
            layer,
            y: PAGE_HEIGHT - MARGIN_TOP,
            pages: 1,
        };
        Ok((cursor, Fonts { regular, bold }))
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    pub fn content_width(&self) -> f32 {
        PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.pages += 1;
    }

    /// Makes sure `height` millimetres fit above the bottom margin.
    pub fn reserve(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM && self.y < PAGE_HEIGHT - MARGIN_TOP {
            self.new_page();
        }
    }

    pub fn space(&mut self, height: f32) {
        self.y -= height;
        if self.y < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    pub fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.line_at(text, size, font, MARGIN_LEFT);
    }

    pub fn line_at(&mut self, text: &str, size: f32, font: &IndirectFontRef, x: f32) {
        let height = size * PT_TO_MM * LINE_SPACING;
        self.reserve(height);
        self.y -= height;
        self.layer.set_fill_color(rgb(BLACK));
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    pub fn colored_line(&mut self, text: &str, size: f32, font: &IndirectFontRef, color: [u8; 3]) {
        let height = size * PT_TO_MM * LINE_SPACING;
        self.reserve(height);
        self.y -= height;
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), font);
        self.layer.set_fill_color(rgb(BLACK));
    }

    /// Wrapped text; embedded newlines start new lines.
    pub fn paragraph(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        let max_chars = chars_per_line(self.content_width(), size);
        for raw in text.split('\n') {
            for line in wrap_text(raw, max_chars) {
                self.line(&line, size, font);
            }
        }
    }

    /// A colored square followed by a label, used for chart legends.
    pub fn legend_entry(&mut self, label: &str, color: [u8; 3], size: f32, font: &IndirectFontRef) {
        let height = size * PT_TO_MM * LINE_SPACING;
        self.reserve(height);
        self.y -= height;

        let side = size * PT_TO_MM * 0.8;
        self.fill_rect(MARGIN_LEFT, self.y, side, side, color);
        self.layer.set_fill_color(rgb(BLACK));
        self.layer
            .use_text(label, size, Mm(MARGIN_LEFT + side + 2.0), Mm(self.y), font);
    }

    pub fn image(&mut self, image: &::image::DynamicImage, dpi: f32) {
        let (width_px, height_px) = ::image::GenericImageView::dimensions(image);
        let width = width_px as f32 / dpi * 25.4;
        let height = height_px as f32 / dpi * 25.4;
        self.reserve(height);
        self.y -= height;

        let x = MARGIN_LEFT + (self.content_width() - width).max(0.0) / 2.0;
        Image::from_dynamic_image(image).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(x)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
    }

    /// Grid table with a dark header row. Column widths are in millimetres.
    pub fn table(&mut self, rows: &[Vec<String>], widths: &[f32], fonts: &Fonts) {
        const HEADER_SIZE: f32 = 10.0;
        const BODY_SIZE: f32 = 8.0;
        const PADDING: f32 = 2.0;

        let total_width: f32 = widths.iter().sum();
        let left = MARGIN_LEFT + (self.content_width() - total_width).max(0.0) / 2.0;

        for (index, row) in rows.iter().enumerate() {
            let header = index == 0;
            let size = if header { HEADER_SIZE } else { BODY_SIZE };
            let row_height = size * PT_TO_MM + 2.0 * PADDING + if header { 2.0 } else { 0.0 };

            self.reserve(row_height);
            let top = self.y;
            let bottom = top - row_height;
            let background = if header { DARK_BLUE } else { BEIGE };
            self.fill_rect(left, bottom, total_width, row_height, background);

            self.layer
                .set_fill_color(rgb(if header { WHITE_SMOKE } else { BLACK }));
            let font = if header { &fonts.bold } else { &fonts.regular };
            let mut x = left;
            for (cell, width) in row.iter().zip(widths) {
                let text_width = cell.chars().count() as f32 * size * PT_TO_MM * 0.5;
                let text_x = x + ((width - text_width) / 2.0).max(PADDING);
                self.layer
                    .use_text(cell.as_str(), size, Mm(text_x), Mm(bottom + PADDING), font);
                x += width;
            }

            self.grid_row(left, top, bottom, widths);
            self.y = bottom;
        }
        self.layer.set_fill_color(rgb(BLACK));
    }

    fn grid_row(&self, left: f32, top: f32, bottom: f32, widths: &[f32]) {
        let right = left + widths.iter().sum::<f32>();
        self.layer.set_outline_color(rgb(BLACK));
        self.layer.set_outline_thickness(1.0);

        self.stroke(vec![(left, top), (right, top), (right, bottom), (left, bottom)], true);
        let mut x = left;
        for width in &widths[..widths.len().saturating_sub(1)] {
            x += width;
            self.stroke(vec![(x, top), (x, bottom)], false);
        }
    }

    fn stroke(&self, points: Vec<(f32, f32)>, is_closed: bool) {
        self.layer.add_line(Line {
            points: points
                .into_iter()
                .map(|(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed,
        });
    }

    fn fill_rect(&self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        self.layer.set_fill_color(rgb(color));
        let corners = [(x, y), (x + width, y), (x + width, y + height), (x, y + height)];
        self.layer.add_polygon(Polygon {
            rings: vec![
                corners
                    .iter()
                    .map(|&(px, py)| (Point::new(Mm(px), Mm(py)), false))
                    .collect(),
            ],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    /// Serializes the document to bytes.
    pub fn finish(self) -> AppResult<Vec<u8>> {
        let mut buf = std::io::BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| AppError::Render(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| AppError::Render(format!("PDF buffer error: {e}")))
    }
}

/// Rough Helvetica capacity: average glyph width is about half the font size.
pub fn chars_per_line(width_mm: f32, size: f32) -> usize {
    ((width_mm / (size * PT_TO_MM * 0.5)) as usize).max(1)
}

pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let current_len = current.chars().count();
        let word_len = word.chars().count();
        if current_len + word_len + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
