//! # Comprobante PDF
//!
//! In-memory rendering of the printed representation of a comprobante:
//!
//! - [`canvas`] - `printpdf` pages in top-down point coordinates
//! - [`layout`] - A4 layout, wrapping and pagination
//! - [`qr`] - SUNAT QR drawn as filled rectangles

pub mod canvas;
pub mod layout;
pub mod qr;

pub use layout::{render_invoice, Issuer, PdfError};
