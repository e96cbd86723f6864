use crate::font::fixed::{Fixed, Point};
use crate::font::traits::{FontFace, GlyphIndex};
use crate::font::types::{FaceError, Glyph, GlyphBounds, Lookup, Metrics, ReleaseError};

struct Entry {
    face: Box<dyn FontFace>,
    index: Option<Box<dyn GlyphIndex>>,
}

impl Entry {
    /// False only when the entry has a character map and it lacks `ch`.
    fn covers(&self, ch: char) -> bool {
        self.index.as_ref().map_or(true, |index| index.covers(ch))
    }
}

/// A font face backed by a priority-ordered chain of faces.
///
/// Every per-glyph query walks the chain from the first registered face and
/// answers from the first one that has the glyph:
///
/// 1. A face whose [`GlyphIndex`] reports glyph 0 is skipped, unless it is
///    the last face.
/// 2. Otherwise the face is queried; a not-found answer moves on to the next
///    face, unless it is the last face.
/// 3. The last face's answer is returned as is, found or not.
///
/// Metrics always come from the first face.
#[derive(Default)]
pub struct FallbackFace {
    entries: Vec<Entry>,
}

impl FallbackFace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a face that cannot report missing glyphs up front.
    pub fn push<F: FontFace + 'static>(&mut self, face: F) {
        self.entries.push(Entry {
            face: Box::new(face),
            index: None,
        });
        log::debug!("Registered fallback face #{}", self.entries.len() - 1);
    }

    /// Appends a face together with the character map used to skip it.
    pub fn push_indexed<F, I>(&mut self, face: F, index: I)
    where
        F: FontFace + 'static,
        I: GlyphIndex + 'static,
    {
        self.entries.push(Entry {
            face: Box::new(face),
            index: Some(Box::new(index)),
        });
        log::debug!(
            "Registered indexed fallback face #{}",
            self.entries.len() - 1
        );
    }

    pub fn with_face<F: FontFace + 'static>(mut self, face: F) -> Self {
        self.push(face);
        self
    }

    pub fn with_indexed_face<F, I>(mut self, face: F, index: I) -> Self
    where
        F: FontFace + 'static,
        I: GlyphIndex + 'static,
    {
        self.push_indexed(face, index);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the face that has a glyph for `ch`, judged the same way
    /// [`FontFace::glyph_advance`] picks its answer.
    pub fn resolve(&self, ch: char) -> Option<usize> {
        self.find(ch, |face| face.glyph_advance(ch))
            .and_then(|(i, lookup)| lookup.found.then_some(i))
    }

    /// Releases every face in order.
    ///
    /// A failing face does not stop the rest from being released; all
    /// failures are returned together.
    pub fn release_entries(&mut self) -> Result<(), ReleaseError> {
        let mut failures = Vec::new();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            if let Err(e) = entry.face.release() {
                log::warn!("Failed to release fallback face #{}: {}", i, e);
                failures.push((i, e));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ReleaseError::new(failures))
        }
    }

    fn find<T>(
        &self,
        ch: char,
        query: impl Fn(&dyn FontFace) -> Lookup<T>,
    ) -> Option<(usize, Lookup<T>)> {
        let last = self.entries.len().checked_sub(1)?;
        for (i, entry) in self.entries.iter().enumerate() {
            // The last face is queried even when its index reports glyph 0.
            if i < last && !entry.covers(ch) {
                log::trace!("Face #{} has no glyph for {:?}", i, ch);
                continue;
            }
            let lookup = query(entry.face.as_ref());
            if !lookup.found && i < last {
                log::trace!("Face #{} did not find {:?}", i, ch);
                continue;
            }
            return Some((i, lookup));
        }
        None
    }

    fn lookup<T: Default>(
        &self,
        ch: char,
        query: impl Fn(&dyn FontFace) -> Lookup<T>,
    ) -> Lookup<T> {
        self.find(ch, query)
            .map(|(_, lookup)| lookup)
            .unwrap_or_default()
    }
}

impl FontFace for FallbackFace {
    fn glyph(&self, dot: Point, ch: char) -> Lookup<Glyph> {
        self.lookup(ch, |face| face.glyph(dot, ch))
    }

    fn glyph_bounds(&self, ch: char) -> Lookup<GlyphBounds> {
        self.lookup(ch, |face| face.glyph_bounds(ch))
    }

    fn glyph_advance(&self, ch: char) -> Lookup<Fixed> {
        self.lookup(ch, |face| face.glyph_advance(ch))
    }

    /// Kerning from the first face that has both glyphs.
    ///
    /// Unlike the glyph queries there is no forced answer from the last face:
    /// if no face has both glyphs the pair is not kerned.
    fn kern(&self, a: char, b: char) -> Fixed {
        self.entries
            .iter()
            .find(|entry| {
                entry.covers(a)
                    && entry.covers(b)
                    && entry.face.glyph_advance(a).found
                    && entry.face.glyph_advance(b).found
            })
            .map_or(Fixed::ZERO, |entry| entry.face.kern(a, b))
    }

    fn metrics(&self) -> Metrics {
        self.entries
            .first()
            .map(|entry| entry.face.metrics())
            .unwrap_or_default()
    }

    fn release(&mut self) -> Result<(), FaceError> {
        self.release_entries().map_err(FaceError::from)
    }
}

impl std::fmt::Debug for FallbackFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackFace")
            .field("len", &self.entries.len())
            .field(
                "indexed",
                &self.entries.iter().filter(|e| e.index.is_some()).count(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::fixed::{PixelRect, Rect};
    use crate::font::types::Mask;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // Mock face whose advance for every char is `advance` pixels. When
    // `always_found` is set it behaves like an outline face and answers
    // every query, drawing .notdef for chars it lacks.
    struct MockFace {
        codepoints: Vec<char>,
        advance: i32,
        always_found: bool,
        kern: Fixed,
        metrics: Metrics,
        releases: Arc<AtomicUsize>,
        fail_release: bool,
    }

    impl MockFace {
        fn new(advance: i32, codepoints: &str) -> Self {
            Self {
                codepoints: codepoints.chars().collect(),
                advance,
                always_found: false,
                kern: Fixed::ZERO,
                metrics: Metrics::default(),
                releases: Arc::new(AtomicUsize::new(0)),
                fail_release: false,
            }
        }

        fn always_found(mut self) -> Self {
            self.always_found = true;
            self
        }

        fn with_kern(mut self, kern: Fixed) -> Self {
            self.kern = kern;
            self
        }

        fn with_ascent(mut self, px: i32) -> Self {
            self.metrics.ascent = Fixed::from_int(px);
            self
        }

        fn index(&self) -> MockIndex {
            MockIndex {
                codepoints: self.codepoints.clone(),
            }
        }

        fn has(&self, ch: char) -> bool {
            self.always_found || self.codepoints.contains(&ch)
        }

        fn bounds(&self) -> Rect {
            Rect::new(Point::from_int(0, -self.advance), Point::from_int(self.advance, 0))
        }
    }

    impl FontFace for MockFace {
        fn glyph(&self, dot: Point, ch: char) -> Lookup<Glyph> {
            let n = self.advance as u32;
            let glyph = Glyph {
                rect: PixelRect::new(0, -self.advance, self.advance, 0)
                    .translate(dot.x.floor(), dot.y.floor()),
                mask: Mask::new(n, n, vec![self.advance as u8; (n * n) as usize]).unwrap(),
                mask_origin: Default::default(),
                advance: Fixed::from_int(self.advance),
            };
            if self.has(ch) {
                Lookup::found(glyph)
            } else {
                Lookup::missing(glyph)
            }
        }

        fn glyph_bounds(&self, ch: char) -> Lookup<GlyphBounds> {
            let bounds = GlyphBounds {
                bounds: self.bounds(),
                advance: Fixed::from_int(self.advance),
            };
            if self.has(ch) {
                Lookup::found(bounds)
            } else {
                Lookup::missing(bounds)
            }
        }

        fn glyph_advance(&self, ch: char) -> Lookup<Fixed> {
            let advance = Fixed::from_int(self.advance);
            if self.has(ch) {
                Lookup::found(advance)
            } else {
                Lookup::missing(advance)
            }
        }

        fn kern(&self, _a: char, _b: char) -> Fixed {
            self.kern
        }

        fn metrics(&self) -> Metrics {
            self.metrics
        }

        fn release(&mut self) -> Result<(), FaceError> {
            self.releases.fetch_add(1, Ordering::SeqCst);
            if self.fail_release {
                Err(FaceError::Closed)
            } else {
                Ok(())
            }
        }
    }

    struct MockIndex {
        codepoints: Vec<char>,
    }

    impl GlyphIndex for MockIndex {
        fn glyph_index(&self, ch: char) -> u16 {
            self.codepoints
                .iter()
                .position(|&c| c == ch)
                .map_or(0, |i| i as u16 + 1)
        }
    }

    fn indexed(face: MockFace) -> (MockFace, MockIndex) {
        let index = face.index();
        (face, index)
    }

    #[test]
    fn test_empty_chain_reports_nothing() {
        let face = FallbackFace::new();

        assert!(face.is_empty());
        assert_eq!(face.glyph(Point::default(), 'a'), Lookup::default());
        assert_eq!(face.glyph_bounds('a'), Lookup::default());
        assert_eq!(face.glyph_advance('a'), Lookup::default());
        assert_eq!(face.kern('a', 'b'), Fixed::ZERO);
        assert_eq!(face.metrics(), Metrics::default());
        assert_eq!(face.resolve('a'), None);
    }

    #[test]
    fn test_index_skips_outline_face_without_glyph() {
        let (a, a_index) = indexed(MockFace::new(4, "a").always_found());
        let (b, b_index) = indexed(MockFace::new(9, "\u{0E01}").always_found());
        let face = FallbackFace::new()
            .with_indexed_face(a, a_index)
            .with_indexed_face(b, b_index);

        let thai = face.glyph(Point::from_int(10, 25), '\u{0E01}');
        assert!(thai.found);
        assert_eq!(thai.value.advance, Fixed::from_int(9));
        assert_eq!(thai.value.rect, PixelRect::new(10, 16, 19, 25));

        let latin = face.glyph(Point::from_int(10, 25), 'a');
        assert!(latin.found);
        assert_eq!(latin.value.advance, Fixed::from_int(4));

        assert_eq!(face.resolve('\u{0E01}'), Some(1));
        assert_eq!(face.resolve('a'), Some(0));
    }

    #[test]
    fn test_unindexed_face_is_always_a_candidate() {
        let (b, b_index) = indexed(MockFace::new(9, "x"));
        let face = FallbackFace::new()
            .with_face(MockFace::new(6, "x"))
            .with_indexed_face(b, b_index);

        assert_eq!(face.glyph_advance('x'), Lookup::found(Fixed::from_int(6)));
    }

    #[test]
    fn test_not_found_answer_falls_through() {
        let face = FallbackFace::new()
            .with_face(MockFace::new(6, "x"))
            .with_face(MockFace::new(9, "y"));

        assert_eq!(face.glyph_advance('y'), Lookup::found(Fixed::from_int(9)));
        assert_eq!(face.resolve('y'), Some(1));
    }

    #[test]
    fn test_last_face_answers_even_when_missing() {
        let (a, a_index) = indexed(MockFace::new(4, "a"));
        let (b, b_index) = indexed(MockFace::new(9, "b"));
        let face = FallbackFace::new()
            .with_indexed_face(a, a_index)
            .with_indexed_face(b, b_index);

        let bounds = face.glyph_bounds('y');
        assert!(!bounds.found);
        assert_eq!(bounds.value.advance, Fixed::from_int(9));
        assert_eq!(
            bounds.value.bounds,
            Rect::new(Point::from_int(0, -9), Point::from_int(9, 0))
        );
        assert_eq!(face.resolve('y'), None);
    }

    #[test]
    fn test_last_face_queried_despite_zero_index() {
        // The index says 'y' is absent but the face still draws something.
        let (b, _) = indexed(MockFace::new(9, "").always_found());
        let face = FallbackFace::new()
            .with_face(MockFace::new(4, "a"))
            .with_indexed_face(b, MockIndex { codepoints: vec![] });

        assert_eq!(face.glyph_advance('y'), Lookup::found(Fixed::from_int(9)));
    }

    #[test]
    fn test_single_face_forwards_its_answer() {
        let face = FallbackFace::new().with_face(MockFace::new(5, "a"));

        assert_eq!(face.glyph_advance('a'), Lookup::found(Fixed::from_int(5)));
        assert_eq!(face.glyph_advance('z'), Lookup::missing(Fixed::from_int(5)));
    }

    #[test]
    fn test_queries_are_repeatable() {
        let face = FallbackFace::new()
            .with_face(MockFace::new(6, "x"))
            .with_face(MockFace::new(9, "y"));

        let first = face.glyph(Point::from_int(1, 2), 'y');
        let second = face.glyph(Point::from_int(1, 2), 'y');
        assert_eq!(first, second);
        assert_eq!(face.kern('x', 'y'), face.kern('x', 'y'));
    }

    #[test]
    fn test_kern_uses_first_face_with_both_glyphs() {
        let (a, a_index) = indexed(MockFace::new(4, "ab").with_kern(Fixed(-3)));
        let (b, b_index) = indexed(MockFace::new(5, "bc").with_kern(Fixed(-7)));
        let face = FallbackFace::new()
            .with_indexed_face(a, a_index)
            .with_indexed_face(b, b_index);

        assert_eq!(face.kern('a', 'b'), Fixed(-3));
        assert_eq!(face.kern('b', 'c'), Fixed(-7));
    }

    #[test]
    fn test_kern_has_no_forced_last_face() {
        let (a, a_index) = indexed(MockFace::new(4, "a").with_kern(Fixed(-3)));
        let (b, b_index) = indexed(MockFace::new(5, "c").with_kern(Fixed(-7)));
        let face = FallbackFace::new()
            .with_indexed_face(a, a_index)
            .with_indexed_face(b, b_index);

        // No face has both 'a' and 'c', so the pair is not kerned even
        // though single-glyph queries would land on the last face.
        assert_eq!(face.kern('a', 'c'), Fixed::ZERO);
        assert_eq!(face.glyph_advance('q'), Lookup::missing(Fixed::from_int(5)));
    }

    #[test]
    fn test_kern_requires_found_advances() {
        let face = FallbackFace::new()
            .with_face(MockFace::new(4, "a").with_kern(Fixed(-3)))
            .with_face(MockFace::new(5, "ab").with_kern(Fixed(-7)));

        assert_eq!(face.kern('a', 'b'), Fixed(-7));
        assert_eq!(face.kern('a', 'a'), Fixed(-3));
    }

    #[test]
    fn test_kern_index_applies_to_last_face() {
        let (b, _) = indexed(MockFace::new(5, "").always_found().with_kern(Fixed(-7)));
        let face = FallbackFace::new().with_indexed_face(b, MockIndex { codepoints: vec!['a'] });

        assert_eq!(face.kern('a', 'b'), Fixed::ZERO);
    }

    #[test]
    fn test_metrics_come_from_first_face() {
        let mut face = FallbackFace::new().with_face(MockFace::new(4, "a").with_ascent(12));
        let before = face.metrics();
        assert_eq!(before.ascent, Fixed::from_int(12));

        face.push(MockFace::new(5, "b").with_ascent(30));
        let (c, c_index) = indexed(MockFace::new(6, "c").with_ascent(40));
        face.push_indexed(c, c_index);
        assert_eq!(face.metrics(), before);
    }

    #[test]
    fn test_release_reaches_every_face() {
        let faces: Vec<MockFace> = (0..3).map(|i| MockFace::new(i + 1, "a")).collect();
        let counters: Vec<_> = faces.iter().map(|f| f.releases.clone()).collect();

        let mut face = FallbackFace::new();
        for (i, mut f) in faces.into_iter().enumerate() {
            f.fail_release = i == 1;
            face.push(f);
        }

        let err = face.release_entries().unwrap_err();
        assert_eq!(err.failed_entries().collect::<Vec<_>>(), vec![1]);
        assert!(matches!(err.last(), Some((1, FaceError::Closed))));
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_release_collects_all_failures() {
        let mut face = FallbackFace::new();
        for i in 0..4 {
            let mut f = MockFace::new(1, "a");
            f.fail_release = i % 2 == 0;
            face.push(f);
        }

        let err = face.release_entries().unwrap_err();
        assert_eq!(err.failed_entries().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_release_ok_and_empty() {
        let mut face = FallbackFace::new().with_face(MockFace::new(1, "a"));
        assert!(face.release_entries().is_ok());
        assert!(FallbackFace::new().release_entries().is_ok());
    }

    #[test]
    fn test_nested_chain_is_a_face() {
        let inner = FallbackFace::new()
            .with_face(MockFace::new(3, "x"))
            .with_face(MockFace::new(7, "y"));
        let mut outer = FallbackFace::new()
            .with_face(MockFace::new(2, "a"))
            .with_face(inner);

        assert_eq!(outer.glyph_advance('y'), Lookup::found(Fixed::from_int(7)));
        assert!(outer.release().is_ok());
    }
}
