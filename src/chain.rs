use std::sync::Arc;

use crate::config::{Config, FontEntry, FontFormat};
use crate::font::{BdfFont, BitmapFace, FaceError, FallbackFace, OutlineFace, OutlineFont};

/// Loads every font in `config` into a fallback chain, in listed order.
///
/// Fails on the first font that cannot be loaded; faces already loaded are
/// released before returning.
pub fn build(config: &Config) -> Result<FallbackFace, FaceError> {
    let mut face = FallbackFace::new();
    for entry in &config.fonts {
        if let Err(e) = push_font(&mut face, entry, config) {
            if let Err(release) = face.release_entries() {
                log::warn!("{}", release);
            }
            return Err(FaceError::FontLoad {
                path: entry.path.clone(),
                reason: e.to_string(),
            });
        }
    }
    Ok(face)
}

fn push_font(face: &mut FallbackFace, entry: &FontEntry, config: &Config) -> Result<(), FaceError> {
    match entry.format() {
        FontFormat::Outline => {
            let font = OutlineFont::load(&entry.path)?;
            log::info!(
                "Loaded outline font {} ({} glyphs)",
                entry.path.display(),
                font.glyph_count()
            );
            let outline = OutlineFace::new(font.clone(), config.face.size_pt(), config.face.dpi());
            face.push_indexed(outline, font);
        }
        FontFormat::Bitmap => {
            let font = BdfFont::load(&entry.path)?;
            log::info!(
                "Loaded bitmap font {} ({} glyphs)",
                entry.path.display(),
                font.glyph_count()
            );
            face.push(BitmapFace::new(Arc::new(font)));
        }
    }
    Ok(())
}
