//! # Comprobante Layout
//!
//! Lays out a stored comprobante on A4 pages.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐  y = 40
//! │        BOLETA DE VENTA ELECTRÓNICA           │
//! │  Ferretería Ejemplo S.A.C.                   │
//! │  RUC / dirección                             │
//! │  Serie-Número, fecha                         │
//! │  Cliente, documento, dirección               │
//! │ ──────────────────────────────────────────── │
//! │  Item  Descripción        Cant. P.Unit. Sub. │  header row
//! │ ──────────────────────────────────────────── │
//! │  01    Cemento Sol ...      2   29.90  59.80 │  rows grow with
//! │  02    Cable THW 14 AWG     1  189.00 189.00 │  wrapped text
//! │        rollo 100m                            │
//! │  ...                                         │  break past y = 750,
//! │                                              │  continue at y = 60
//! │  ┌──────┐                Op. Gravada  S/ ... │
//! │  │  QR  │                IGV (18%)    S/ ... │
//! │  └──────┘                Total        S/ ... │
//! │                 Página 1 de 2                │
//! └──────────────────────────────────────────────┘
//! ```

use qrcode::types::QrError;
use thiserror::Error;

use super::canvas::{text_width, Canvas, Font, PAGE_HEIGHT, PAGE_WIDTH};
use super::qr::draw_qr;
use cajas_core::calendar::lima_date;
use cajas_core::sunat::QrPayload;
use cajas_core::{IdentityDocument, Invoice, InvoiceLine, Money, IGV_RATE};

// =============================================================================
// Geometry
// =============================================================================

const MARGIN: f32 = 40.0;
const RIGHT: f32 = PAGE_WIDTH - MARGIN;

/// Rows that would cross this line go to the next page.
const BREAK_Y: f32 = 750.0;

/// Where content resumes on continuation pages.
const CONTINUE_Y: f32 = 60.0;

const BODY_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 12.0;
const ROW_PADDING: f32 = 6.0;

const COL_ITEM: f32 = 40.0;
const COL_DESC: f32 = 100.0;
const DESC_WIDTH: f32 = 250.0;
/// Right edges of the numeric columns.
const COL_QTY_END: f32 = 410.0;
const COL_PRICE_END: f32 = 480.0;
const COL_TOTAL_END: f32 = RIGHT;

const QR_SIZE: f32 = 100.0;
/// Height reserved for totals plus QR and caption.
const CLOSING_HEIGHT: f32 = QR_SIZE + 30.0;

/// Store data printed on the header. The RUC comes from the comprobante.
#[derive(Debug, Clone, Copy)]
pub struct Issuer<'a> {
    pub name: &'a str,
    pub address: &'a str,
}

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("QR payload does not fit: {0}")]
    Qr(#[from] QrError),

    #[error("PDF rendering failed: {0}")]
    Render(#[from] printpdf::Error),
}

/// Renders a comprobante to PDF bytes.
pub fn render_invoice(issuer: &Issuer<'_>, invoice: &Invoice, lines: &[InvoiceLine]) -> Result<Vec<u8>, PdfError> {
    let title = invoice.tipo.title();
    let mut canvas = Canvas::new(&format!("{} {}", title, invoice.full_number()))?;
    let mut page = 0;
    let mut y = MARGIN;

    // ---- Header ----------------------------------------------------------
    canvas.text_centered(page, y, 16.0, Font::Bold, title);
    y += 26.0;

    canvas.text(page, MARGIN, y, BODY_SIZE, Font::Bold, issuer.name);
    y += 14.0;
    canvas.text(page, MARGIN, y, BODY_SIZE, Font::Regular, &format!("RUC: {}", invoice.emisor_ruc));
    y += 14.0;
    canvas.text(page, MARGIN, y, BODY_SIZE, Font::Regular, issuer.address);
    y += 22.0;

    canvas.text(
        page,
        MARGIN,
        y,
        BODY_SIZE,
        Font::Bold,
        &format!("Serie-Número: {}", invoice.full_number()),
    );
    y += 14.0;
    let fecha = lima_date(invoice.fecha_emision).format("%d/%m/%Y");
    canvas.text(page, MARGIN, y, BODY_SIZE, Font::Regular, &format!("Fecha de emisión: {}", fecha));
    y += 20.0;

    canvas.text(
        page,
        MARGIN,
        y,
        BODY_SIZE,
        Font::Regular,
        &format!("Cliente: {}", invoice.cliente_nombre),
    );
    y += 14.0;
    canvas.text(
        page,
        MARGIN,
        y,
        BODY_SIZE,
        Font::Regular,
        &format!(
            "{}: {}",
            document_label(invoice.cliente_tipo_documento),
            invoice.cliente_documento
        ),
    );
    y += 14.0;
    let direccion = if invoice.cliente_direccion.trim().is_empty() {
        "-"
    } else {
        invoice.cliente_direccion.as_str()
    };
    canvas.text(page, MARGIN, y, BODY_SIZE, Font::Regular, &format!("Dirección: {}", direccion));
    y += 24.0;

    // ---- Detail table ----------------------------------------------------
    y = table_header(&canvas, page, y);

    for (i, line) in lines.iter().enumerate() {
        let wrapped = wrap(&line.descripcion, DESC_WIDTH, BODY_SIZE, Font::Regular);
        let row_height = wrapped.len() as f32 * LINE_HEIGHT + ROW_PADDING;

        if y + row_height > BREAK_Y {
            page = canvas.add_page();
            y = table_header(&canvas, page, CONTINUE_Y);
        }

        canvas.text(page, COL_ITEM, y, BODY_SIZE, Font::Regular, &format!("{:02}", i + 1));
        for (n, text) in wrapped.iter().enumerate() {
            canvas.text(page, COL_DESC, y + n as f32 * LINE_HEIGHT, BODY_SIZE, Font::Regular, text);
        }
        canvas.text_right(page, COL_QTY_END, y, BODY_SIZE, Font::Regular, &line.cantidad.to_string());
        canvas.text_right(
            page,
            COL_PRICE_END,
            y,
            BODY_SIZE,
            Font::Regular,
            &Money::from_cents(line.unit_price_cents).to_string(),
        );
        canvas.text_right(
            page,
            COL_TOTAL_END,
            y,
            BODY_SIZE,
            Font::Regular,
            &Money::from_cents(line.subtotal_cents).to_string(),
        );
        y += row_height;
    }

    // ---- Totals and QR ---------------------------------------------------
    if y + 10.0 + CLOSING_HEIGHT > BREAK_Y {
        page = canvas.add_page();
        y = CONTINUE_Y;
    }
    y += 10.0;

    canvas.line(page, 350.0, y, RIGHT, y, 0.5);

    let igv_label = format!("IGV ({}%):", IGV_RATE.bps() / 100);
    let totals = [
        ("Op. Gravada:", invoice.op_gravada_cents),
        (igv_label.as_str(), invoice.igv_cents),
        ("Total:", invoice.total_cents),
    ];
    let mut row_y = y + 6.0;
    for (label, cents) in totals {
        canvas.text_right(page, 470.0, row_y, BODY_SIZE, Font::Regular, label);
        canvas.text_right(page, RIGHT, row_y, BODY_SIZE, Font::Bold, &Money::from_cents(cents).to_string());
        row_y += 14.0;
    }

    let payload = QrPayload::for_invoice(invoice).to_string();
    let caption = format!("Representación impresa de la {}", title.to_lowercase());
    draw_qr(&canvas, page, &payload, (MARGIN, y), QR_SIZE, &caption)?;

    // ---- Footer ----------------------------------------------------------
    let total_pages = canvas.page_count();
    for i in 0..total_pages {
        canvas.text_centered(
            i,
            PAGE_HEIGHT - 30.0,
            8.0,
            Font::Regular,
            &format!("Página {} de {}", i + 1, total_pages),
        );
    }

    Ok(canvas.finish()?)
}

/// Draws the column headers at `y` and returns where the first row goes.
fn table_header(canvas: &Canvas, page: usize, y: f32) -> f32 {
    canvas.line(page, MARGIN, y, RIGHT, y, 0.5);
    let text_y = y + 5.0;
    canvas.text(page, COL_ITEM, text_y, BODY_SIZE, Font::Bold, "Item");
    canvas.text(page, COL_DESC, text_y, BODY_SIZE, Font::Bold, "Descripción");
    canvas.text_right(page, COL_QTY_END, text_y, BODY_SIZE, Font::Bold, "Cant.");
    canvas.text_right(page, COL_PRICE_END, text_y, BODY_SIZE, Font::Bold, "P. Unit.");
    canvas.text_right(page, COL_TOTAL_END, text_y, BODY_SIZE, Font::Bold, "Subtotal");
    canvas.line(page, MARGIN, y + 20.0, RIGHT, y + 20.0, 0.5);
    y + 25.0
}

fn document_label(kind: IdentityDocument) -> &'static str {
    match kind {
        IdentityDocument::Dni => "DNI",
        IdentityDocument::Ruc => "RUC",
        IdentityDocument::Ce => "Carné de extranjería",
        IdentityDocument::Pasaporte => "Pasaporte",
        IdentityDocument::Otro => "Documento",
    }
}

/// Greedy word wrap to `width` points. Words wider than a line are split.
/// Always returns at least one line.
pub fn wrap(text: &str, width: f32, size: f32, font: Font) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, size, font) <= width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        // The word alone may still be too wide
        for c in word.chars() {
            current.push(c);
            if text_width(&current, size, font) > width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(c);
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
