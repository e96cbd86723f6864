//! Bitmap fonts in the BDF 2.1 text format.
//!
//! A BDF font has no character map beyond the glyphs it lists, so
//! [`BitmapFace`] does not implement [`GlyphIndex`](super::GlyphIndex) and
//! reports missing glyphs through the `found` flag instead.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ahash::RandomState;

use super::fixed::{Fixed, PixelPoint, PixelRect, Point, Rect};
use super::traits::FontFace;
use super::types::{FaceError, Glyph, GlyphBounds, Lookup, Mask, Metrics};

/// Largest accepted bounding box coordinate, in pixels.
const MAX_COORD: i32 = 1 << 16;
/// Largest accepted glyph bitmap, in pixels.
const MAX_GLYPH_PIXELS: usize = 1 << 24;

/// Glyph bounding box in font units (pixels), y up from the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub width: i32,
    pub height: i32,
    pub x_offset: i32,
    pub y_offset: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BdfGlyph {
    pub name: String,
    pub advance: i32,
    pub bbx: BoundingBox,
    /// One byte of coverage per pixel, `bbx.width * bbx.height` bytes.
    pub coverage: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct BdfFont {
    pub name: String,
    pub pixel_size: i32,
    pub bounding_box: BoundingBox,
    pub ascent: i32,
    pub descent: i32,
    pub x_height: Option<i32>,
    pub cap_height: Option<i32>,
    pub default_char: Option<char>,
    glyphs: HashMap<char, BdfGlyph, RandomState>,
}

impl BdfFont {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FaceError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    pub fn parse(source: &str) -> Result<Self, FaceError> {
        Parser::new(source).parse()
    }

    pub fn glyph(&self, ch: char) -> Option<&BdfGlyph> {
        self.glyphs.get(&ch)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
            line: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> FaceError {
        FaceError::Bdf {
            line: self.line,
            reason: reason.into(),
        }
    }

    /// Next non-empty, non-comment line split into keyword and arguments.
    fn next_line(&mut self) -> Option<(&'a str, &'a str)> {
        for (n, raw) in self.lines.by_ref() {
            self.line = n + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with("COMMENT") {
                continue;
            }
            return Some(match trimmed.split_once(char::is_whitespace) {
                Some((keyword, rest)) => (keyword, rest.trim()),
                None => (trimmed, ""),
            });
        }
        None
    }

    fn ints<const N: usize>(&self, args: &str) -> Result<[i32; N], FaceError> {
        let mut out = [0; N];
        let mut fields = args.split_whitespace();
        for slot in &mut out {
            let field = fields
                .next()
                .ok_or_else(|| self.error(format!("expected {} integers", N)))?;
            *slot = field
                .parse()
                .map_err(|_| self.error(format!("invalid integer {:?}", field)))?;
        }
        Ok(out)
    }

    fn bounding_box(&self, args: &str) -> Result<BoundingBox, FaceError> {
        let [width, height, x_offset, y_offset] = self.ints::<4>(args)?;
        if width < 0 || height < 0 {
            return Err(self.error("negative bounding box size"));
        }
        if [width, height, x_offset, y_offset]
            .iter()
            .any(|v| v.unsigned_abs() > MAX_COORD as u32)
        {
            return Err(self.error("bounding box out of range"));
        }
        Ok(BoundingBox {
            width,
            height,
            x_offset,
            y_offset,
        })
    }

    fn parse(mut self) -> Result<BdfFont, FaceError> {
        match self.next_line() {
            Some(("STARTFONT", _)) => {}
            _ => return Err(self.error("missing STARTFONT")),
        }

        let mut font = BdfFont {
            name: String::new(),
            pixel_size: 0,
            bounding_box: BoundingBox::default(),
            ascent: 0,
            descent: 0,
            x_height: None,
            cap_height: None,
            default_char: None,
            glyphs: HashMap::default(),
        };
        let mut ascent = None;
        let mut descent = None;

        while let Some((keyword, args)) = self.next_line() {
            match keyword {
                "FONT" => font.name = args.to_string(),
                "SIZE" => font.pixel_size = self.ints::<1>(args)?[0],
                "FONTBOUNDINGBOX" => font.bounding_box = self.bounding_box(args)?,
                "FONT_ASCENT" => ascent = Some(self.ints::<1>(args)?[0]),
                "FONT_DESCENT" => descent = Some(self.ints::<1>(args)?[0]),
                "X_HEIGHT" => font.x_height = Some(self.ints::<1>(args)?[0]),
                "CAP_HEIGHT" => font.cap_height = Some(self.ints::<1>(args)?[0]),
                "DEFAULT_CHAR" => {
                    font.default_char = u32::try_from(self.ints::<1>(args)?[0])
                        .ok()
                        .and_then(char::from_u32);
                }
                "STARTCHAR" => {
                    let (encoding, glyph) = self.parse_char(args, &font.bounding_box)?;
                    match encoding {
                        Some(ch) => {
                            font.glyphs.insert(ch, glyph);
                        }
                        None => log::debug!("Skipping unencoded BDF glyph {:?}", glyph.name),
                    }
                }
                "ENDFONT" => {
                    let bbx = font.bounding_box;
                    font.ascent = ascent.unwrap_or(bbx.height + bbx.y_offset);
                    font.descent = descent.unwrap_or(-bbx.y_offset);
                    return Ok(font);
                }
                _ => {}
            }
        }

        Err(self.error("missing ENDFONT"))
    }

    fn parse_char(
        &mut self,
        name: &str,
        font_bbx: &BoundingBox,
    ) -> Result<(Option<char>, BdfGlyph), FaceError> {
        let mut encoding = None;
        let mut advance = font_bbx.width;
        let mut bbx = *font_bbx;

        loop {
            let (keyword, args) = self
                .next_line()
                .ok_or_else(|| self.error("unterminated STARTCHAR"))?;
            match keyword {
                "ENCODING" => {
                    let code = self.ints::<1>(args)?[0];
                    encoding = u32::try_from(code).ok().and_then(char::from_u32);
                }
                "DWIDTH" => advance = self.ints::<1>(args)?[0],
                "BBX" => bbx = self.bounding_box(args)?,
                "BITMAP" => {
                    let coverage = self.parse_bitmap(&bbx)?;
                    let glyph = BdfGlyph {
                        name: name.to_string(),
                        advance,
                        bbx,
                        coverage,
                    };
                    return Ok((encoding, glyph));
                }
                "ENDCHAR" => return Err(self.error("ENDCHAR before BITMAP")),
                _ => {}
            }
        }
    }

    fn parse_bitmap(&mut self, bbx: &BoundingBox) -> Result<Vec<u8>, FaceError> {
        let width = bbx.width as usize;
        let height = bbx.height as usize;
        let size = width
            .checked_mul(height)
            .filter(|&n| n <= MAX_GLYPH_PIXELS)
            .ok_or_else(|| self.error("glyph bitmap too large"))?;
        let mut coverage = Vec::with_capacity(size);
        let mut rows = 0;

        loop {
            let (row, _) = self
                .next_line()
                .ok_or_else(|| self.error("unterminated BITMAP"))?;
            if row == "ENDCHAR" {
                break;
            }
            if rows == height {
                return Err(self.error("more BITMAP rows than BBX height"));
            }
            let bytes = decode_hex_row(row).ok_or_else(|| self.error("invalid BITMAP row"))?;
            if bytes.len() * 8 < width {
                return Err(self.error("BITMAP row narrower than BBX width"));
            }
            coverage.extend((0..width).map(|x| {
                if bytes[x / 8] & (0x80 >> (x % 8)) != 0 {
                    0xFF
                } else {
                    0x00
                }
            }));
            rows += 1;
        }

        if rows != height {
            return Err(self.error("fewer BITMAP rows than BBX height"));
        }
        Ok(coverage)
    }
}

fn decode_hex_row(row: &str) -> Option<Vec<u8>> {
    if row.len() % 2 != 0 {
        return None;
    }
    (0..row.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(row.get(i..i + 2)?, 16).ok())
        .collect()
}

/// Face over a parsed BDF font, drawn at its native pixel size.
#[derive(Debug, Clone)]
pub struct BitmapFace {
    font: Arc<BdfFont>,
    released: bool,
}

impl BitmapFace {
    pub fn new(font: Arc<BdfFont>) -> Self {
        Self {
            font,
            released: false,
        }
    }

    pub fn font(&self) -> &BdfFont {
        &self.font
    }

    fn bounds_of(glyph: &BdfGlyph) -> Rect {
        let bbx = glyph.bbx;
        Rect::new(
            Point::from_int(bbx.x_offset, -(bbx.y_offset + bbx.height)),
            Point::from_int(bbx.x_offset + bbx.width, -bbx.y_offset),
        )
    }
}

impl FontFace for BitmapFace {
    fn glyph(&self, dot: Point, ch: char) -> Lookup<Glyph> {
        let Some(glyph) = self.font.glyph(ch) else {
            return Lookup::default();
        };
        let bbx = glyph.bbx;
        let Some(mask) = Mask::new(bbx.width as u32, bbx.height as u32, glyph.coverage.clone())
        else {
            return Lookup::default();
        };
        let x = dot.x.floor() + bbx.x_offset;
        let y = dot.y.floor() - (bbx.y_offset + bbx.height);
        Lookup::found(Glyph {
            rect: PixelRect::new(x, y, x + bbx.width, y + bbx.height),
            mask,
            mask_origin: PixelPoint::default(),
            advance: Fixed::from_int(glyph.advance),
        })
    }

    fn glyph_bounds(&self, ch: char) -> Lookup<GlyphBounds> {
        match self.font.glyph(ch) {
            Some(glyph) => Lookup::found(GlyphBounds {
                bounds: Self::bounds_of(glyph),
                advance: Fixed::from_int(glyph.advance),
            }),
            None => Lookup::default(),
        }
    }

    fn glyph_advance(&self, ch: char) -> Lookup<Fixed> {
        match self.font.glyph(ch) {
            Some(glyph) => Lookup::found(Fixed::from_int(glyph.advance)),
            None => Lookup::default(),
        }
    }

    fn kern(&self, _a: char, _b: char) -> Fixed {
        Fixed::ZERO
    }

    fn metrics(&self) -> Metrics {
        let font = &self.font;
        Metrics {
            height: Fixed::from_int(font.ascent.saturating_add(font.descent)),
            ascent: Fixed::from_int(font.ascent),
            descent: Fixed::from_int(font.descent),
            x_height: Fixed::from_int(font.x_height.unwrap_or(0)),
            cap_height: Fixed::from_int(font.cap_height.unwrap_or(0)),
        }
    }

    fn release(&mut self) -> Result<(), FaceError> {
        if self.released {
            return Err(FaceError::Closed);
        }
        self.released = true;
        Ok(())
    }
}
