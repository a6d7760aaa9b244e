//! Source locations for declarations and diagnostics.

use std::fmt;

pub use text_size::TextRange;
pub use text_size::TextSize;

use super::FileId;

/// Where a declaration (or a part of it) was authored.
///
/// Ranges are byte ranges into the declaring file as reported by the
/// external parser. A parser that cannot report a range uses the empty
/// range at offset zero.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Location {
    pub file: FileId,
    pub range: TextRange,
}

impl Location {
    #[inline]
    pub const fn new(file: FileId, range: TextRange) -> Self {
        Self { file, range }
    }

    /// A location covering no text, for declarations without position info.
    #[inline]
    pub fn file_start(file: FileId) -> Self {
        Self {
            file,
            range: TextRange::empty(TextSize::from(0)),
        }
    }

    /// Build a location from an optional `(start, end)` pair.
    ///
    /// Inverted pairs are clamped to an empty range at `start`.
    pub fn from_offsets(file: FileId, offsets: Option<(u32, u32)>) -> Self {
        match offsets {
            Some((start, end)) if start <= end => {
                Self::new(file, TextRange::new(start.into(), end.into()))
            }
            Some((start, _)) => Self::new(file, TextRange::empty(start.into())),
            None => Self::file_start(file),
        }
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{:?}", self.file, self.range)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}",
            self.file,
            u32::from(self.range.start()),
            u32::from(self.range.end())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = Location::from_offsets(FileId::new(2), Some((10, 24)));
        assert_eq!(format!("{}", loc), "file#2:10..24");
    }

    #[test]
    fn test_location_inverted_offsets() {
        let loc = Location::from_offsets(FileId::new(0), Some((12, 4)));
        assert!(loc.range.is_empty());
        assert_eq!(loc.range.start(), TextSize::from(12));
    }

    #[test]
    fn test_location_missing_offsets() {
        let loc = Location::from_offsets(FileId::new(0), None);
        assert_eq!(loc, Location::file_start(FileId::new(0)));
    }
}
