use image::{Rgb, RgbImage};
use qrcode::{Color as Module, EcLevel, QrCode};
use tracing::{debug, info};

use crate::{
    config::QrConfig,
    error::{QRError, QRResult},
};

#[derive(Debug, Clone, Copy)]
pub struct EncodeRequest<'a> {
    pub text: &'a str,
    /// Pixel size of a single module.
    pub box_size: u32,
    /// Quiet zone width, in modules.
    pub border: u32,
    pub fill_color: Rgb<u8>,
    pub back_color: Rgb<u8>,
}

impl<'a> EncodeRequest<'a> {
    pub fn new(text: &'a str, config: &QrConfig) -> Self {
        Self {
            text,
            box_size: config.box_size,
            border: config.border,
            fill_color: config.fill_color.rgb(),
            back_color: config.back_color.rgb(),
        }
    }
}

/// Encodes text at error correction level M, in the smallest version that fits.
#[derive(Debug, Default, Clone, Copy)]
pub struct QrEncoder;

impl QrEncoder {
    pub const EC_LEVEL: EcLevel = EcLevel::M;

    pub fn encode(&self, req: &EncodeRequest) -> QRResult<RgbImage> {
        if req.text.is_empty() {
            return Err(QRError::EmptyData);
        }
        if req.box_size == 0 {
            return Err(QRError::InvalidBoxSize);
        }

        let code = QrCode::with_error_correction_level(req.text.as_bytes(), Self::EC_LEVEL)
            .map_err(|e| QRError::Encoding(e.to_string()))?;
        info!("Encoded {} bytes as {:?} ({} modules)", req.text.len(), code.version(), code.width());

        let img = render(code.width(), &code.to_colors(), req)?;
        debug!("Rasterized symbol to {}x{}", img.width(), img.height());
        Ok(img)
    }
}

/// Whether an RGB canvas of `width` x `height` pixels has an addressable buffer.
pub(crate) fn fits_in_memory(width: u32, height: u32) -> bool {
    (width as usize).checked_mul(height as usize).and_then(|n| n.checked_mul(3)).is_some()
}

fn render(width: usize, modules: &[Module], req: &EncodeRequest) -> QRResult<RgbImage> {
    let too_large = || QRError::ImageTooLarge { what: "symbol" };
    let qz_sz = req.border.checked_mul(req.box_size).ok_or_else(too_large)?;
    let qr_sz = u32::try_from(width)
        .ok()
        .and_then(|w| w.checked_mul(req.box_size))
        .ok_or_else(too_large)?;
    let total_sz = qz_sz
        .checked_mul(2)
        .and_then(|qz| qz.checked_add(qr_sz))
        .filter(|&sz| fits_in_memory(sz, sz))
        .ok_or_else(too_large)?;

    let img = RgbImage::from_fn(total_sz, total_sz, |j, i| {
        if i < qz_sz || i >= qz_sz + qr_sz || j < qz_sz || j >= qz_sz + qr_sz {
            return req.back_color;
        }
        let r = ((i - qz_sz) / req.box_size) as usize;
        let c = ((j - qz_sz) / req.box_size) as usize;

        match modules[r * width + c] {
            Module::Dark => req.fill_color,
            Module::Light => req.back_color,
        }
    });
    Ok(img)
}

#[cfg(test)]
mod encode_tests {
    use image::Rgb;
    use test_case::test_case;

    use super::{EncodeRequest, QrEncoder};
    use crate::{config::QrConfig, error::QRError};

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn request(text: &str, box_size: u32, border: u32) -> EncodeRequest<'_> {
        EncodeRequest { text, box_size, border, fill_color: BLACK, back_color: WHITE }
    }

    // Version 1 is 21 modules wide, version 2 is 25, version 3 is 29.
    #[test_case("Hello, World!", 10, 4, 21; "version_1_default_size")]
    #[test_case("Hello, World!", 1, 0, 21; "version_1_no_border")]
    #[test_case("Hello, World!", 3, 2, 21; "version_1_small")]
    #[test_case("https://example.com/some/longer/path", 10, 4, 29; "version_3_url")]
    #[test_case("0123456789012345678901234567890123", 2, 4, 21; "version_1_numeric")]
    fn test_dimensions(text: &str, box_size: u32, border: u32, modules: u32) {
        let img = QrEncoder.encode(&request(text, box_size, border)).unwrap();
        let side = (modules + 2 * border) * box_size;
        assert_eq!(img.dimensions(), (side, side));
    }

    #[test]
    fn test_default_config_size() {
        let config = QrConfig::default();
        let img = QrEncoder.encode(&EncodeRequest::new("Hello, World!", &config)).unwrap();
        assert_eq!(img.dimensions(), (290, 290));
    }

    #[test]
    fn test_colors() {
        let red = Rgb([200, 0, 0]);
        let cream = Rgb([250, 240, 220]);
        let req = EncodeRequest { text: "TEST", box_size: 5, border: 4, fill_color: red, back_color: cream };
        let img = QrEncoder.encode(&req).unwrap();

        // Quiet zone, then the outer ring of the top-left finder pattern.
        assert_eq!(*img.get_pixel(0, 0), cream);
        assert_eq!(*img.get_pixel(19, 19), cream);
        assert_eq!(*img.get_pixel(20, 20), red);
        assert_eq!(*img.get_pixel(24, 24), red);
        assert!(img.pixels().all(|p| *p == red || *p == cream));
    }

    #[test]
    fn test_empty_text() {
        assert!(matches!(QrEncoder.encode(&request("", 10, 4)), Err(QRError::EmptyData)));
    }

    #[test]
    fn test_zero_box_size() {
        assert!(matches!(QrEncoder.encode(&request("x", 0, 4)), Err(QRError::InvalidBoxSize)));
    }

    // 21 modules + 8 of border, at 200M px each, overflows u32. At 100M px the side fits in
    // u32 but the pixel buffer does not fit in a usize.
    #[test_case(200_000_000, 4; "side_overflows")]
    #[test_case(100_000_000, 4; "buffer_overflows")]
    #[test_case(1, u32::MAX; "border_overflows")]
    fn test_oversized_symbol(box_size: u32, border: u32) {
        let err = QrEncoder.encode(&request("x", box_size, border)).unwrap_err();
        assert!(matches!(err, QRError::ImageTooLarge { what: "symbol" }));
    }

    #[test]
    fn test_data_overflow() {
        // Level M holds at most 2331 bytes.
        let data = "x".repeat(2400);
        let err = QrEncoder.encode(&request(&data, 1, 4)).unwrap_err();
        assert!(matches!(err, QRError::Encoding(_)));
        assert!(!err.to_string().is_empty());
    }
}
