use std::borrow::Cow;

use image::{imageops, Rgb, RgbImage};
use tracing::debug;

use crate::{
    config::CaptionConfig,
    encode::fits_in_memory,
    error::{QRError, QRResult},
    font::CaptionFont,
    measure::TextMeasurer,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSpec {
    /// `None` or an empty string means no caption.
    pub text: Option<String>,
    pub padding: u32,
    pub background: Rgb<u8>,
    pub text_color: Rgb<u8>,
}

impl CaptionSpec {
    pub fn new(text: Option<String>, config: &CaptionConfig) -> Self {
        Self {
            text,
            padding: config.padding,
            background: config.background.rgb(),
            text_color: config.text_color.rgb(),
        }
    }

    fn caption(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Geometry of a captioned canvas. Both elements are centered with floor division, so an odd
/// width difference leaves the narrower element one pixel left of true center.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct CaptionLayout {
    pub width: u32,
    pub height: u32,
    pub qr_x: u32,
    pub text_x: u32,
    pub text_y: u32,
}

impl CaptionLayout {
    /// `None` when the canvas would not fit in a `u32` side or in memory.
    pub fn compute(qr_w: u32, qr_h: u32, cap_w: u32, cap_h: u32, padding: u32) -> Option<Self> {
        let pad2 = padding.checked_mul(2)?;
        let width = qr_w.max(cap_w.checked_add(pad2)?);
        let height = qr_h.checked_add(cap_h)?.checked_add(pad2)?;
        if !fits_in_memory(width, height) {
            return None;
        }
        Some(Self {
            width,
            height,
            qr_x: (width - qr_w) / 2,
            text_x: (width - cap_w) / 2,
            text_y: qr_h + padding,
        })
    }
}

/// Places a caption under a QR image, on a new canvas grown to fit it.
pub struct CaptionComposer<'f> {
    measurer: TextMeasurer<'f>,
}

impl<'f> CaptionComposer<'f> {
    pub fn new(font: &'f CaptionFont) -> Self {
        Self { measurer: TextMeasurer::for_font(font) }
    }

    /// Returns `qr` itself, borrowed, when there is no caption to draw.
    pub fn compose<'a>(&self, qr: &'a RgbImage, spec: &CaptionSpec) -> QRResult<Cow<'a, RgbImage>> {
        let Some(text) = spec.caption() else {
            return Ok(Cow::Borrowed(qr));
        };

        let (cap_w, cap_h) = self.measurer.measure(text);
        let layout = CaptionLayout::compute(qr.width(), qr.height(), cap_w, cap_h, spec.padding)
            .ok_or(QRError::ImageTooLarge { what: "captioned canvas" })?;
        debug!("Caption {cap_w}x{cap_h}, canvas {layout:?}");

        let mut canvas = RgbImage::from_pixel(layout.width, layout.height, spec.background);
        imageops::replace(&mut canvas, qr, layout.qr_x as i64, 0);
        self.measurer.font().draw(
            &mut canvas,
            layout.text_x as i32,
            layout.text_y as i32,
            text,
            spec.text_color,
        );

        Ok(Cow::Owned(canvas))
    }
}
