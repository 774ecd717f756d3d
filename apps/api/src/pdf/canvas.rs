//! # Page Canvas
//!
//! Thin layer over `printpdf` for the comprobante layout: A4 pages, the
//! two built-in Helvetica faces, stroked lines and filled rectangles.
//!
//! Callers work in points with the origin at the top-left corner, the way
//! the layout is drawn. The canvas converts to printpdf's millimetres with
//! the origin at the bottom-left.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point, Rect, Rgb,
};

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.0;

/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 842.0;

/// Baseline offset from the top of a text line, as a fraction of the size.
const ASCENT: f32 = 0.8;

const LAYER: &str = "Contenido";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

/// A document being drawn. Pages are addressed by their position.
pub struct Canvas {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

impl Canvas {
    /// Starts a document with one empty page.
    pub fn new(title: &str) -> Result<Self, printpdf::Error> {
        let (doc, page, layer) = PdfDocument::new(title, mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

        Ok(Canvas {
            doc,
            pages: vec![(page, layer)],
            regular,
            bold,
        })
    }

    /// Appends a page and returns its position.
    pub fn add_page(&mut self) -> usize {
        let (page, layer) = self.doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), LAYER);
        self.pages.push((page, layer));
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn layer(&self, page: usize) -> Option<PdfLayerReference> {
        let (page, layer) = *self.pages.get(page)?;
        Some(self.doc.get_page(page).get_layer(layer))
    }

    /// Draws `text` with its top edge at `y`.
    pub fn text(&self, page: usize, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let Some(layer) = self.layer(page) else {
            return;
        };
        let font = match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
        };
        let baseline = PAGE_HEIGHT - y - size * ASCENT;
        layer.use_text(text, size, mm(x), mm(baseline), font);
    }

    /// Draws `text` so that it ends at `right`.
    pub fn text_right(&self, page: usize, right: f32, y: f32, size: f32, font: Font, text: &str) {
        self.text(page, right - text_width(text, size, font), y, size, font, text);
    }

    /// Draws `text` centered on the page.
    pub fn text_centered(&self, page: usize, y: f32, size: f32, font: Font, text: &str) {
        let x = (PAGE_WIDTH - text_width(text, size, font)) / 2.0;
        self.text(page, x, y, size, font, text);
    }

    /// Strokes a line `width` points thick.
    pub fn line(&self, page: usize, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        let Some(layer) = self.layer(page) else {
            return;
        };
        layer.set_outline_color(black());
        layer.set_outline_thickness(width);
        layer.add_line(Line {
            points: vec![
                (Point::new(mm(x1), mm(PAGE_HEIGHT - y1)), false),
                (Point::new(mm(x2), mm(PAGE_HEIGHT - y2)), false),
            ],
            is_closed: false,
        });
    }

    /// Fills a black rectangle whose top-left corner is `(x, y)`.
    pub fn fill_rect(&self, page: usize, x: f32, y: f32, width: f32, height: f32) {
        let Some(layer) = self.layer(page) else {
            return;
        };
        layer.set_fill_color(black());
        layer.add_rect(Rect::new(
            mm(x),
            mm(PAGE_HEIGHT - y - height),
            mm(x + width),
            mm(PAGE_HEIGHT - y),
        ));
    }

    pub fn finish(self) -> Result<Vec<u8>, printpdf::Error> {
        self.doc.save_to_bytes()
    }
}

fn black() -> Color {
    Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None))
}

/// Estimated width of `text` in points.
///
/// Built-in fonts carry no metrics in the file, so this groups glyphs by
/// their Helvetica advance: narrow punctuation and thin letters, digits,
/// capitals and wide letters. Estimates err on the wide side.
pub fn text_width(text: &str, size: f32, font: Font) -> f32 {
    let em: f32 = text.chars().map(advance).sum();
    let em = match font {
        Font::Regular => em,
        Font::Bold => em * 1.07,
    };
    em * size
}

fn advance(c: char) -> f32 {
    match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '|' | '\'' | 'i' | 'j' | 'l' | 'í' | 'I' | 'Í' => 0.28,
        '/' | '(' | ')' | '-' | 'f' | 't' | 'r' => 0.34,
        'm' | 'M' | 'W' => 0.84,
        'w' => 0.73,
        '0'..='9' => 0.556,
        c if c.is_uppercase() => 0.73,
        _ => 0.56,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_in(pdf: &[u8]) -> usize {
        lopdf::Document::load_mem(pdf).unwrap().get_pages().len()
    }

    #[test]
    fn test_blank_canvas_has_one_page() {
        let canvas = Canvas::new("Prueba").unwrap();
        assert_eq!(canvas.page_count(), 1);

        let pdf = canvas.finish().unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert_eq!(pages_in(&pdf), 1);
    }

    #[test]
    fn test_draws_on_added_pages() {
        let mut canvas = Canvas::new("Prueba").unwrap();
        let second = canvas.add_page();
        assert_eq!(second, 1);

        canvas.text(second, 40.0, 40.0, 10.0, Font::Bold, "Página 2");
        canvas.line(second, 40.0, 60.0, 555.0, 60.0, 0.5);
        canvas.fill_rect(second, 40.0, 80.0, 10.0, 10.0);
        // Unknown pages are ignored
        canvas.text(9, 40.0, 40.0, 10.0, Font::Regular, "nada");

        assert_eq!(pages_in(&canvas.finish().unwrap()), 2);
    }

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 10.0, Font::Regular), 0.0);
        // Digits share one advance, so amounts line up on the right
        assert_eq!(
            text_width("123.45", 10.0, Font::Regular),
            text_width("987.60", 10.0, Font::Regular)
        );
        assert!(text_width("WWW", 10.0, Font::Regular) > text_width("iii", 10.0, Font::Regular));
        assert!(text_width("Total", 10.0, Font::Bold) > text_width("Total", 10.0, Font::Regular));
        assert_eq!(text_width("ab", 20.0, Font::Regular), 2.0 * text_width("ab", 10.0, Font::Regular));
    }
}
