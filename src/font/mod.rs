mod bitmap;
mod fallback;
mod fixed;
mod outline;
mod traits;
mod types;

pub use bitmap::{BdfFont, BdfGlyph, BitmapFace, BoundingBox};
pub use fallback::FallbackFace;
pub use fixed::{Fixed, PixelPoint, PixelRect, Point, Rect};
pub use outline::{points_to_px, OutlineFace, OutlineFont};
pub use traits::{FontFace, GlyphIndex};
pub use types::{FaceError, Glyph, GlyphBounds, Lookup, Mask, Metrics, ReleaseError};
