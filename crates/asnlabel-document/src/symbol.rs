// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// QR symbol encoder. Turns a label identifier into a square RGBA raster of
// fixed size using the `qrcode` and `image` crates.

use asnlabel_core::error::{LabelError, Result};
use image::{DynamicImage, GrayImage, Luma, RgbaImage, imageops};
use qrcode::{Color, EcLevel, QrCode};
use tracing::{debug, instrument};

/// Edge length in pixels of every encoded glyph.
pub const GLYPH_RESOLUTION: u32 = 100;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Encodes identifiers as QR symbols at error-correction level M.
///
/// The symbol version is chosen automatically. Modules are scaled by the
/// largest whole factor that fits the target resolution and centred on a
/// white canvas, so the same text always yields the same pixels.
#[derive(Debug, Clone)]
pub struct SymbolEncoder {
    resolution: u32,
    ec_level: EcLevel,
}

impl Default for SymbolEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolEncoder {
    pub fn new() -> Self {
        Self {
            resolution: GLYPH_RESOLUTION,
            ec_level: EcLevel::M,
        }
    }

    /// Encode `text` into a `resolution` x `resolution` RGBA raster.
    ///
    /// # Errors
    ///
    /// `LabelError::Encoding` when the text exceeds QR capacity or the
    /// resulting symbol has more modules than the raster has pixels.
    #[instrument(skip(self), level = "debug")]
    pub fn encode(&self, text: &str) -> Result<RgbaImage> {
        let encoding_err = |reason: String| LabelError::Encoding {
            identifier: text.to_string(),
            reason,
        };

        let code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)
            .map_err(|err| encoding_err(format!("QR encode error: {err}")))?;

        let modules = code.width() as u32;
        let factor = self.resolution / modules;
        if factor == 0 {
            return Err(encoding_err(format!(
                "{modules}-module symbol cannot be scaled into {res}x{res} pixels",
                res = self.resolution
            )));
        }

        let colors = code.to_colors();
        let side = modules * factor;
        let symbol = GrayImage::from_fn(side, side, |x, y| {
            let index = ((y / factor) * modules + x / factor) as usize;
            match colors[index] {
                Color::Dark => DARK,
                Color::Light => LIGHT,
            }
        });

        let mut canvas = GrayImage::from_pixel(self.resolution, self.resolution, LIGHT);
        let offset = i64::from((self.resolution - side) / 2);
        imageops::overlay(&mut canvas, &symbol, offset, offset);

        debug!(
            version = ?code.version(),
            modules,
            factor,
            "QR symbol encoded"
        );

        Ok(DynamicImage::ImageLuma8(canvas).to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn glyph_has_fixed_resolution() {
        let glyph = SymbolEncoder::new().encode("ASN0001").expect("encode");
        assert_eq!(glyph.dimensions(), (GLYPH_RESOLUTION, GLYPH_RESOLUTION));
    }

    #[test]
    fn same_text_yields_identical_pixels() {
        let encoder = SymbolEncoder::new();
        let a = encoder.encode("ASN0042").expect("encode a");
        let b = encoder.encode("ASN0042").expect("encode b");
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn different_text_yields_different_pixels() {
        let encoder = SymbolEncoder::new();
        let a = encoder.encode("ASN0042").expect("encode a");
        let b = encoder.encode("ASN0043").expect("encode b");
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn symbol_is_centred_with_white_border() {
        // Version 1 is 21 modules: factor 4, 84 px, centred at offset 8.
        let glyph = SymbolEncoder::new().encode("ASN0001").expect("encode");
        assert_eq!(*glyph.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*glyph.get_pixel(7, 7), Rgba([255, 255, 255, 255]));
        // Top-left finder pattern corner.
        assert_eq!(*glyph.get_pixel(8, 8), Rgba([0, 0, 0, 255]));
        assert_eq!(*glyph.get_pixel(91, 8), Rgba([0, 0, 0, 255]));
        assert_eq!(*glyph.get_pixel(92, 8), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn every_pixel_is_opaque_black_or_white() {
        let glyph = SymbolEncoder::new().encode("ASN9999").expect("encode");
        assert!(glyph.pixels().all(|p| {
            *p == Rgba([0, 0, 0, 255]) || *p == Rgba([255, 255, 255, 255])
        }));
    }

    #[test]
    fn text_beyond_qr_capacity_fails() {
        let text = "x".repeat(3000);
        let err = SymbolEncoder::new().encode(&text).unwrap_err();
        assert!(matches!(err, LabelError::Encoding { .. }));
    }

    #[test]
    fn symbol_too_large_for_raster_fails() {
        // Encodable, but needs well over 100 modules.
        let text = "x".repeat(1000);
        let err = SymbolEncoder::new().encode(&text).unwrap_err();
        match err {
            LabelError::Encoding { identifier, reason } => {
                assert_eq!(identifier, text);
                assert!(reason.contains("cannot be scaled"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
