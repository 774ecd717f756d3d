//! SUNAT QR drawn as vector modules.

use qrcode::types::QrError;
use qrcode::{Color, EcLevel, QrCode};

use super::canvas::{Canvas, Font};

/// Light modules around the symbol.
const QUIET_ZONE: usize = 2;

/// Draws the QR for `payload` in a `size`×`size` square at `(x, y)` and the
/// caption below it. Returns the caption's bottom edge.
pub fn draw_qr(
    canvas: &Canvas,
    page: usize,
    payload: &str,
    (x, y): (f32, f32),
    size: f32,
    caption: &str,
) -> Result<f32, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let width = code.width();
    let module = size / (width + QUIET_ZONE * 2) as f32;
    let origin_x = x + module * QUIET_ZONE as f32;
    let origin_y = y + module * QUIET_ZONE as f32;

    for (i, color) in code.to_colors().into_iter().enumerate() {
        if color == Color::Dark {
            let row = i / width;
            let col = i % width;
            canvas.fill_rect(
                page,
                origin_x + col as f32 * module,
                origin_y + row as f32 * module,
                module,
                module,
            );
        }
    }

    let caption_y = y + size + 4.0;
    canvas.text(page, x, caption_y, 7.0, Font::Regular, caption);
    Ok(caption_y + 9.0)
}
