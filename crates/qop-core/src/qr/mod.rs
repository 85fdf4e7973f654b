//! QR rendering for qop payloads.
//!
//! The optical channel itself is the `qrcode` crate's job; this module only
//! turns a payload string into something a screen can show:
//!
//! - Unicode half-block art for terminal display
//! - PNG bytes for an external image viewer
//!
//! Payloads that exceed the capacity of a single QR symbol are reported as
//! [`Error::PayloadTooLarge`] so the sender can log and skip them.

use qrcode::render::unicode;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

use crate::error::{Error, Result};

/// Error correction level used for every generated code.
///
/// Medium matches what phone cameras handle comfortably at the payload
/// sizes produced by the default chunking.
pub const ERROR_CORRECTION: EcLevel = EcLevel::M;

fn build_code(data: &str) -> Result<QrCode> {
    QrCode::with_error_correction_level(data, ERROR_CORRECTION).map_err(|e| match e {
        QrError::DataTooLong => Error::PayloadTooLarge {
            size: data.len(),
            reason: "data too long".to_string(),
        },
        other => Error::QrRender(other.to_string()),
    })
}

/// Render a payload string as Unicode half-block art for the terminal.
///
/// Colors are inverted (light modules drawn dark) so the code reads
/// correctly on the dark terminal themes scanners are usually pointed at.
///
/// # Errors
///
/// Returns an error if the payload does not fit in one QR symbol.
pub fn render_ascii(data: &str) -> Result<String> {
    let code = build_code(data)?;

    let rendered = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build();

    Ok(rendered)
}

/// Render a payload string as PNG bytes.
///
/// The code is scaled to `size` x `size` pixels with nearest-neighbor
/// sampling so module edges stay sharp for the scanning camera.
///
/// # Errors
///
/// Returns an error if the payload does not fit in one QR symbol or PNG
/// encoding fails.
pub fn render_png(data: &str, size: u32) -> Result<Vec<u8>> {
    use image::{ImageEncoder, Luma};

    let code = build_code(data)?;

    let img = code.render::<Luma<u8>>().build();
    let scaled = image::imageops::resize(&img, size, size, image::imageops::FilterType::Nearest);

    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder
        .write_image(&scaled, size, size, image::ExtendedColorType::L8)
        .map_err(|e| Error::QrRender(e.to_string()))?;

    Ok(png_bytes)
}
