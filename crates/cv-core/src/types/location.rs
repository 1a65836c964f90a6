//! Source location types for tracking positions in source files.

use serde::{Deserialize, Serialize};

/// A position within a source file.
///
/// - `line` is 1-indexed (first line is line 1)
/// - `column` is 0-indexed (UTF-8 byte offset within the line)
///
/// # Examples
///
/// ```
/// use cv_core::SourceLocation;
///
/// let loc = SourceLocation::new(12, 4);
/// assert_eq!(loc.line, 12);
/// assert_eq!(loc.to_string(), "12:4");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Line number (1-indexed).
    pub line: u32,

    /// Column number (0-indexed, UTF-8 byte offset within the line).
    pub column: u32,
}

impl SourceLocation {
    /// Creates a new source location.
    #[inline]
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Computes the location of a byte offset within `text`.
    ///
    /// Offsets past the end clamp to the last position.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_core::SourceLocation;
    ///
    /// let text = "first\nsecond line";
    /// assert_eq!(SourceLocation::from_offset(text, 9), SourceLocation::new(2, 3));
    /// ```
    #[must_use]
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let before = &text.as_bytes()[..offset];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |pos| pos + 1);
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(offset - line_start).unwrap_or(u32::MAX),
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_new() {
        let loc = SourceLocation::new(10, 5);
        assert_eq!(loc.line, 10);
        assert_eq!(loc.column, 5);
    }

    #[test]
    fn test_from_offset_first_line() {
        assert_eq!(SourceLocation::from_offset("abc", 0), SourceLocation::new(1, 0));
        assert_eq!(SourceLocation::from_offset("abc", 2), SourceLocation::new(1, 2));
    }

    #[test]
    fn test_from_offset_later_lines() {
        let text = "a\nbb\nccc";
        assert_eq!(SourceLocation::from_offset(text, 2), SourceLocation::new(2, 0));
        assert_eq!(SourceLocation::from_offset(text, 7), SourceLocation::new(3, 2));
    }

    #[test]
    fn test_from_offset_clamps() {
        assert_eq!(SourceLocation::from_offset("ab", 99), SourceLocation::new(1, 2));
    }

    #[test]
    fn test_ordering() {
        assert!(SourceLocation::new(1, 9) < SourceLocation::new(2, 0));
    }
}
