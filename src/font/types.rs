use std::fmt;
use std::path::PathBuf;

use super::fixed::{Fixed, PixelPoint, PixelRect, Rect};

/// Result of a per-glyph query.
///
/// The value is carried even when `found` is false: a face that has nothing
/// better to offer still reports whatever it computed, and the fallback
/// chain forwards that verbatim from its last entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Lookup<T> {
    pub value: T,
    pub found: bool,
}

impl<T> Lookup<T> {
    pub fn found(value: T) -> Self {
        Self { value, found: true }
    }

    pub fn missing(value: T) -> Self {
        Self {
            value,
            found: false,
        }
    }

    pub fn is_found(&self) -> bool {
        self.found
    }

    /// Drops the value when the glyph was not found.
    pub fn into_option(self) -> Option<T> {
        self.found.then_some(self.value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        Lookup {
            value: f(self.value),
            found: self.found,
        }
    }
}

/// 8-bit coverage mask, row-major, one byte per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Mask {
    /// Returns `None` if `data` does not hold exactly `width * height` bytes.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            data,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Coverage at `(x, y)`; zero outside the mask.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.data[(y * self.width + x) as usize]
    }
}

/// A rasterized glyph positioned relative to a pen position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Glyph {
    /// Destination rectangle in pixels.
    pub rect: PixelRect,
    pub mask: Mask,
    /// Point in `mask` that maps to `rect.min`.
    pub mask_origin: PixelPoint,
    pub advance: Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphBounds {
    /// Ink bounds relative to the pen position, y down.
    pub bounds: Rect,
    pub advance: Fixed,
}

/// Face-level measurements. All zero by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Metrics {
    /// Recommended baseline-to-baseline distance.
    pub height: Fixed,
    pub ascent: Fixed,
    /// Distance below the baseline, positive.
    pub descent: Fixed,
    pub x_height: Fixed,
    pub cap_height: Fixed,
}

#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid BDF font at line {line}: {reason}")]
    Bdf { line: usize, reason: String },
    #[error("Invalid outline font: {0}")]
    Outline(String),
    #[error("Failed to load font {}: {reason}", path.display())]
    FontLoad { path: PathBuf, reason: String },
    #[error(transparent)]
    Release(#[from] ReleaseError),
    #[error("Face already released")]
    Closed,
}

/// Every failure collected while releasing a fallback chain.
#[derive(Debug)]
pub struct ReleaseError {
    failures: Vec<(usize, FaceError)>,
}

impl ReleaseError {
    pub(crate) fn new(failures: Vec<(usize, FaceError)>) -> Self {
        Self { failures }
    }

    /// `(entry index, error)` pairs in entry order.
    pub fn failures(&self) -> &[(usize, FaceError)] {
        &self.failures
    }

    pub fn last(&self) -> Option<&(usize, FaceError)> {
        self.failures.last()
    }

    pub fn failed_entries(&self) -> impl Iterator<Item = usize> + '_ {
        self.failures.iter().map(|(index, _)| *index)
    }
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to release {} face(s)", self.failures.len())?;
        for (index, err) in &self.failures {
            write!(f, "; entry {}: {}", index, err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ReleaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .last()
            .map(|(_, err)| err as &(dyn std::error::Error + 'static))
    }
}
