use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};

use crate::core::GatewayError;

/// Pixels per QR module.
pub const SCALE: u32 = 2;

/// Light modules around the symbol.
pub const QUIET_ZONE: u32 = 1;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Render the gateway's signed QR string as a PNG.
///
/// Error correction level L, 2 pixels per module, 1-module quiet zone,
/// 8-bit grayscale. The output is byte-identical for identical input.
pub fn render_qrcode(signed_payload: &str) -> Result<Vec<u8>, GatewayError> {
    let code = QrCode::with_error_correction_level(signed_payload.as_bytes(), EcLevel::L)
        .map_err(|e| GatewayError::QrCode(e.to_string()))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * SCALE;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
        if !inside {
            return LIGHT;
        }
        let idx = ((my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)) as usize;
        match colors[idx] {
            Color::Dark => DARK,
            Color::Light => LIGHT,
        }
    });

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| GatewayError::QrCode(e.to_string()))?;
    Ok(png)
}

/// File name of the QR attachment for an invoice, with path separators
/// replaced so the name stays a single path component.
pub fn attachment_file_name(invoice_id: &str) -> String {
    format!("{invoice_id} - QRCode.png").replace(std::path::MAIN_SEPARATOR_STR, "__")
}
