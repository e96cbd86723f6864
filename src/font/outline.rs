use std::path::Path;
use std::sync::Arc;

use fontdue::{Font, FontSettings};

use super::fixed::{Fixed, PixelPoint, PixelRect, Point, Rect};
use super::traits::{FontFace, GlyphIndex};
use super::types::{FaceError, Glyph, GlyphBounds, Lookup, Mask, Metrics};

/// A parsed TrueType/OpenType font, shared between its index and its faces.
#[derive(Clone)]
pub struct OutlineFont {
    font: Arc<Font>,
}

impl OutlineFont {
    pub fn from_bytes(data: &[u8]) -> Result<Self, FaceError> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| FaceError::Outline(e.to_string()))?;
        Ok(Self {
            font: Arc::new(font),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, FaceError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn glyph_count(&self) -> u16 {
        self.font.glyph_count()
    }
}

impl GlyphIndex for OutlineFont {
    fn glyph_index(&self, ch: char) -> u16 {
        self.font.lookup_glyph_index(ch)
    }
}

impl std::fmt::Debug for OutlineFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineFont")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

/// An [`OutlineFont`] at a fixed pixel size.
///
/// Like other outline rasterizers it never reports a glyph as missing: chars
/// the font lacks are drawn with the .notdef glyph. Register it together with
/// its [`OutlineFont`] so a fallback chain can tell the difference.
#[derive(Debug, Clone)]
pub struct OutlineFace {
    font: OutlineFont,
    px: f32,
}

impl OutlineFace {
    /// `size_pt` at `dpi` dots per inch.
    pub fn new(font: OutlineFont, size_pt: f32, dpi: f32) -> Self {
        Self::with_px(font, points_to_px(size_pt, dpi))
    }

    pub fn with_px(font: OutlineFont, px: f32) -> Self {
        Self { font, px }
    }

    pub fn size_px(&self) -> f32 {
        self.px
    }

    fn extent(&self, ch: char) -> Fixed {
        if self.font.glyph_index(ch) == 0 {
            return Fixed::ZERO;
        }
        Fixed::from_f32(self.font.font.metrics(ch, self.px).bounds.height)
    }
}

pub fn points_to_px(size_pt: f32, dpi: f32) -> f32 {
    size_pt * dpi / 72.0
}

impl FontFace for OutlineFace {
    fn glyph(&self, dot: Point, ch: char) -> Lookup<Glyph> {
        let (m, coverage) = self.font.font.rasterize(ch, self.px);
        let (width, height) = (m.width as i32, m.height as i32);
        let mask = Mask::new(m.width as u32, m.height as u32, coverage).unwrap_or_default();
        let x = dot.x.round() + m.xmin;
        let y = dot.y.round() - (m.ymin + height);
        Lookup::found(Glyph {
            rect: PixelRect::new(x, y, x + width, y + height),
            mask,
            mask_origin: PixelPoint::default(),
            advance: Fixed::from_f32(m.advance_width),
        })
    }

    fn glyph_bounds(&self, ch: char) -> Lookup<GlyphBounds> {
        let m = self.font.font.metrics(ch, self.px);
        let b = m.bounds;
        Lookup::found(GlyphBounds {
            bounds: Rect::new(
                Point::new(Fixed::from_f32(b.xmin), Fixed::from_f32(-(b.ymin + b.height))),
                Point::new(Fixed::from_f32(b.xmin + b.width), Fixed::from_f32(-b.ymin)),
            ),
            advance: Fixed::from_f32(m.advance_width),
        })
    }

    fn glyph_advance(&self, ch: char) -> Lookup<Fixed> {
        Lookup::found(Fixed::from_f32(
            self.font.font.metrics(ch, self.px).advance_width,
        ))
    }

    fn kern(&self, a: char, b: char) -> Fixed {
        self.font
            .font
            .horizontal_kern(a, b, self.px)
            .map(Fixed::from_f32)
            .unwrap_or_default()
    }

    fn metrics(&self) -> Metrics {
        let Some(line) = self.font.font.horizontal_line_metrics(self.px) else {
            return Metrics::default();
        };
        Metrics {
            height: Fixed::from_f32(line.new_line_size),
            ascent: Fixed::from_f32(line.ascent),
            descent: Fixed::from_f32(-line.descent),
            x_height: self.extent('x'),
            cap_height: self.extent('H'),
        }
    }

    fn release(&mut self) -> Result<(), FaceError> {
        Ok(())
    }
}
