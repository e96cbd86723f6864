use std::fmt;

use crate::font::{FallbackFace, FontFace, Fixed, GlyphBounds, Metrics};

/// How the chain answers for one character of a probed string.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeLine {
    pub ch: char,
    /// Entry that has the glyph, if any.
    pub entry: Option<usize>,
    pub advance: Fixed,
    pub bounds: GlyphBounds,
    /// Kerning against the previous character.
    pub kern: Fixed,
}

pub fn probe(face: &FallbackFace, text: &str) -> Vec<ProbeLine> {
    let mut prev = None;
    text.chars()
        .map(|ch| {
            let line = ProbeLine {
                ch,
                entry: face.resolve(ch),
                advance: face.glyph_advance(ch).value,
                bounds: face.glyph_bounds(ch).value,
                kern: prev.map_or(Fixed::ZERO, |p| face.kern(p, ch)),
            };
            prev = Some(ch);
            line
        })
        .collect()
}

impl fmt::Display for ProbeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entry = match self.entry {
            Some(i) => i.to_string(),
            None => "-".to_string(),
        };
        let b = self.bounds.bounds;
        write!(
            f,
            "{:?}\tU+{:04X}\tentry {}\tadvance {}\tbounds ({}, {})-({}, {})\tkern {}",
            self.ch,
            self.ch as u32,
            entry,
            self.advance,
            b.min.x,
            b.min.y,
            b.max.x,
            b.max.y,
            self.kern
        )
    }
}

pub fn format_metrics(metrics: &Metrics) -> String {
    format!(
        "height {}\nascent {}\ndescent {}\nx-height {}\ncap-height {}",
        metrics.height, metrics.ascent, metrics.descent, metrics.x_height, metrics.cap_height
    )
}
