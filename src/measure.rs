use tracing::debug;

use crate::font::CaptionFont;

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum MeasureStrategy {
    /// Union of the outlined glyphs' pixel bounds.
    InkBounds,
    /// Advance widths and line height.
    AdvanceEstimate,
}

/// Measures caption text with a fixed strategy, picked once from the font's capabilities.
pub struct TextMeasurer<'f> {
    font: &'f CaptionFont,
    strategy: MeasureStrategy,
}

impl<'f> TextMeasurer<'f> {
    pub fn for_font(font: &'f CaptionFont) -> Self {
        let strategy = if font.supports_ink_bounds() {
            MeasureStrategy::InkBounds
        } else {
            MeasureStrategy::AdvanceEstimate
        };
        debug!("Measuring text with {strategy:?}");
        Self { font, strategy }
    }

    pub fn font(&self) -> &'f CaptionFont {
        self.font
    }

    pub fn strategy(&self) -> MeasureStrategy {
        self.strategy
    }

    /// Rendered `(width, height)` of `text` in pixels.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self.strategy {
            MeasureStrategy::InkBounds => match self.font.ink_bounds(text) {
                Some(bb) => {
                    let w = bb.max.x.ceil() - bb.min.x.floor();
                    let h = bb.max.y.ceil() - bb.min.y.floor();
                    (w.max(0.0) as u32, h.max(0.0) as u32)
                }
                None => (0, 0),
            },
            MeasureStrategy::AdvanceEstimate => self.font.advance_size(text),
        }
    }
}
