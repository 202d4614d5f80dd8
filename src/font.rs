//! Caption fonts.
//!
//! [`FontResolver`] walks an ordered list of font files and returns the first one that loads.
//! When none does, it hands out the built-in 8x8 bitmap glyphs, so resolving a font never
//! fails. The returned [`CaptionFont`] is used for both measuring and drawing the caption.

use std::{fs, path::PathBuf};

use ab_glyph::{point, Font, FontVec, Glyph, OutlinedGlyph, PxScale, Rect, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_filled_rect_mut, pixelops::interpolate, rect::Rect as PixelRect};
use tracing::debug;

/// Side of a built-in glyph cell, in pixels.
pub const BUILTIN_CELL: u32 = 8;

// Resolver
//------------------------------------------------------------------------------

pub struct FontResolver {
    candidates: Vec<PathBuf>,
}

impl FontResolver {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn resolve(&self, size: u32) -> CaptionFont {
        for path in &self.candidates {
            if !path.exists() {
                debug!("Font candidate {} does not exist", path.display());
                continue;
            }
            let font = fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| FontVec::try_from_vec(bytes).map_err(|e| e.to_string()));
            match font {
                Ok(font) => {
                    debug!("Using font {} at {size}px", path.display());
                    return CaptionFont::Outline(OutlineFont::new(font, size));
                }
                Err(e) => debug!("Skipping font {}: {e}", path.display()),
            }
        }

        debug!("No usable font file, falling back to built-in glyphs");
        CaptionFont::Builtin
    }
}

// Font
//------------------------------------------------------------------------------

pub enum CaptionFont {
    Outline(OutlineFont),
    Builtin,
}

impl CaptionFont {
    /// Whether the font can report the exact ink extents of a string.
    pub fn supports_ink_bounds(&self) -> bool {
        matches!(self, Self::Outline(_))
    }

    /// Exact ink extents of `text` drawn at the origin, or `None` when the font cannot tell
    /// or nothing would be inked.
    pub fn ink_bounds(&self, text: &str) -> Option<Rect> {
        match self {
            Self::Outline(f) => f.ink_bounds(text),
            Self::Builtin => None,
        }
    }

    /// Coarse size from advance widths and line height.
    pub fn advance_size(&self, text: &str) -> (u32, u32) {
        match self {
            Self::Outline(f) => f.advance_size(text),
            Self::Builtin => (text.chars().count() as u32 * BUILTIN_CELL, BUILTIN_CELL),
        }
    }

    /// Draws `text` with its layout origin (top of the line, left of the caret) at `(x, y)`.
    /// Pixels falling outside the canvas are clipped.
    pub fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        match self {
            Self::Outline(f) => f.draw(canvas, x, y, text, color),
            Self::Builtin => draw_builtin(canvas, x, y, text, color),
        }
    }
}

pub struct OutlineFont {
    font: FontVec,
    scale: PxScale,
}

impl OutlineFont {
    /// `size` is the em size in pixels. `PxScale` is the ascent-to-descent height, so it is
    /// the em size times the line height in ems.
    pub fn new(font: FontVec, size: u32) -> Self {
        let em = size as f32;
        let px = match font.units_per_em() {
            Some(units) if units > 0.0 => em * font.height_unscaled() / units,
            _ => em,
        };
        Self { font, scale: PxScale::from(px) }
    }

    // Positions every glyph on a baseline one ascent below the origin, with kerning.
    fn layout(&self, text: &str) -> Vec<Glyph> {
        let scaled = self.font.as_scaled(self.scale);
        let mut caret = 0.0;
        let mut prev = None;
        let mut glyphs = Vec::with_capacity(text.len());
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(self.scale, point(caret, scaled.ascent())));
            caret += scaled.h_advance(id);
            prev = Some(id);
        }
        glyphs
    }

    fn outlines(&self, text: &str) -> impl Iterator<Item = OutlinedGlyph> + '_ {
        self.layout(text).into_iter().filter_map(|g| self.font.outline_glyph(g))
    }

    fn ink_bounds(&self, text: &str) -> Option<Rect> {
        self.outlines(text).map(|g| g.px_bounds()).reduce(|a, b| Rect {
            min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
            max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
        })
    }

    fn advance_size(&self, text: &str) -> (u32, u32) {
        let scaled = self.font.as_scaled(self.scale);
        let width = match self.layout(text).last() {
            Some(g) => g.position.x + scaled.h_advance(g.id),
            None => 0.0,
        };
        (width.ceil() as u32, scaled.height().ceil() as u32)
    }

    fn draw(&self, canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        for glyph in self.outlines(text) {
            let bb = glyph.px_bounds();
            let (gx, gy) = (x + bb.min.x as i32, y + bb.min.y as i32);
            glyph.draw(|dx, dy, coverage| {
                let (px, py) = (gx + dx as i32, gy + dy as i32);
                if px < 0 || py < 0 || px >= w || py >= h {
                    return;
                }
                let pixel = canvas.get_pixel_mut(px as u32, py as u32);
                *pixel = interpolate(color, *pixel, coverage.clamp(0.0, 1.0));
            });
        }
    }
}

fn draw_builtin(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let Some(rows) = BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')) else {
            continue;
        };
        let cx = x + (i as u32 * BUILTIN_CELL) as i32;
        for (r, &bits) in rows.iter().enumerate() {
            for b in 0..BUILTIN_CELL {
                if (bits >> b) & 1 == 1 {
                    let dot = PixelRect::at(cx + b as i32, y + r as i32).of_size(1, 1);
                    draw_filled_rect_mut(canvas, dot, color);
                }
            }
        }
    }
}
