use super::fixed::{Fixed, Point};
use super::types::{FaceError, Glyph, GlyphBounds, Lookup, Metrics};

/// Query surface of a single sized font face.
///
/// Per-glyph queries never fail hard: a face without a glyph reports
/// `found == false` and the caller decides what to do with that.
pub trait FontFace: Send + Sync {
    /// Rasterizes `ch` with its origin at `dot`.
    fn glyph(&self, dot: Point, ch: char) -> Lookup<Glyph>;
    fn glyph_bounds(&self, ch: char) -> Lookup<GlyphBounds>;
    fn glyph_advance(&self, ch: char) -> Lookup<Fixed>;
    /// Horizontal adjustment between `a` and a following `b`.
    fn kern(&self, a: char, b: char) -> Fixed;
    fn metrics(&self) -> Metrics;
    /// Releases whatever the face holds. Calling it twice is backend-defined.
    fn release(&mut self) -> Result<(), FaceError>;
}

/// Character-to-glyph mapping for fonts that can tell a missing glyph apart.
///
/// Formats without a character map (plain bitmap fonts) do not implement it.
pub trait GlyphIndex: Send + Sync {
    /// Glyph id for `ch`; 0 means the font has no glyph for it.
    fn glyph_index(&self, ch: char) -> u16;

    fn covers(&self, ch: char) -> bool {
        self.glyph_index(ch) != 0
    }
}
