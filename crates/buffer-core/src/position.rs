//! Position and range primitives.
//!
//! All coordinates are logical: a zero-based line index plus a zero-based offset counted in
//! characters (Unicode scalar values) within that line. Values are immutable and compared
//! structurally.

use std::cmp::Ordering;
use std::fmt;

/// A location in the document (line and character offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based offset in characters within the line.
    pub offset: usize,
}

impl Position {
    /// The first position of every document.
    pub const DOCUMENT_BEGIN: Position = Position { line: 0, offset: 0 };

    /// Create a new position.
    pub const fn new(line: usize, offset: usize) -> Self {
        Self { line, offset }
    }

    /// Same line, offset 0.
    pub fn to_begin_of_line(self) -> Self {
        Self::new(self.line, 0)
    }

    /// Same line, a different offset.
    pub fn to_offset(self, offset: usize) -> Self {
        Self::new(self.line, offset)
    }

    /// Whether both positions are on the same line.
    pub fn same_line_as(self, other: Position) -> bool {
        self.line == other.line
    }

    /// The one-character range starting at this position.
    pub fn to_single_symbol_range(self) -> Range {
        Range::new(self, self.to_offset(self.offset + 1))
    }

    /// The empty range located at this position.
    pub fn to_empty_range(self) -> Range {
        Range::new(self, self)
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.offset.cmp(&other.offset))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.offset)
    }
}

/// An ordered pair of positions (`begin <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    begin: Position,
    end: Position,
}

impl Range {
    /// Create a range.
    ///
    /// # Panics
    ///
    /// Panics if `begin > end`. Use [`Range::safe_create`] for unordered input.
    pub fn new(begin: Position, end: Position) -> Self {
        assert!(
            begin <= end,
            "range begin must not be after its end ({begin}) ({end})"
        );
        Self { begin, end }
    }

    /// Create a range, returning `None` if `begin > end`.
    pub fn try_new(begin: Position, end: Position) -> Option<Self> {
        (begin <= end).then_some(Self { begin, end })
    }

    /// Create a range from two positions given in any order.
    pub fn safe_create(a: Position, b: Position) -> Self {
        if a <= b {
            Self { begin: a, end: b }
        } else {
            Self { begin: b, end: a }
        }
    }

    /// Range start (inclusive).
    pub fn begin(&self) -> Position {
        self.begin
    }

    /// Range end (exclusive).
    pub fn end(&self) -> Position {
        self.end
    }

    /// `begin == end`.
    pub fn is_point(&self) -> bool {
        self.begin == self.end
    }

    /// Both ends lie on the same line.
    pub fn is_single_line(&self) -> bool {
        self.begin.line == self.end.line
    }

    /// Exactly one character on a single line.
    pub fn is_single_symbol(&self) -> bool {
        self.is_single_line() && self.end.offset.checked_sub(self.begin.offset) == Some(1)
    }

    /// Extend the range so that it includes `point`.
    ///
    /// Only one end moves; a point already inside the range leaves it unchanged.
    pub fn merge(self, point: Position) -> Self {
        if point > self.end {
            return Self::new(self.begin, point);
        }
        if point < self.begin {
            return Self::new(point, self.end);
        }
        self
    }

    /// The overlap of two ranges, or `None` when they are disjoint.
    ///
    /// Touching ranges intersect in an empty range. Multi-line ranges should be cut into
    /// single-line pieces by the caller first.
    pub fn intersect(&self, other: &Range) -> Option<Range> {
        let begin = self.begin.max(other.begin);
        let end = self.end.min(other.end);
        Range::try_new(begin, end)
    }

    /// Whether `point` lies in `[begin, end]`.
    pub fn contains(&self, point: Position) -> bool {
        self.begin <= point && point <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_ordering() {
        assert!(Position::new(0, 10) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(1, 1).cmp(&Position::new(1, 1)), Ordering::Equal);
    }

    #[test]
    fn test_range_predicates() {
        let point = Position::new(3, 2).to_empty_range();
        assert!(point.is_point());
        assert!(point.is_single_line());
        assert!(!point.is_single_symbol());

        let symbol = Position::new(3, 2).to_single_symbol_range();
        assert!(symbol.is_single_symbol());

        let multi = Range::new(Position::new(0, 4), Position::new(1, 5));
        assert!(!multi.is_single_line());
        assert!(!multi.is_single_symbol());
    }

    #[test]
    fn test_safe_create_orders_points() {
        let a = Position::new(4, 1);
        let b = Position::new(2, 9);
        let range = Range::safe_create(a, b);
        assert_eq!(range.begin(), b);
        assert_eq!(range.end(), a);
        assert_eq!(Range::try_new(a, b), None);
    }

    #[test]
    #[should_panic]
    fn test_inverted_range_panics() {
        let _ = Range::new(Position::new(1, 0), Position::new(0, 0));
    }

    #[test]
    fn test_merge_extends_one_end() {
        let range = Range::new(Position::new(1, 2), Position::new(1, 5));
        assert_eq!(
            range.merge(Position::new(1, 8)),
            Range::new(Position::new(1, 2), Position::new(1, 8))
        );
        assert_eq!(
            range.merge(Position::new(0, 0)),
            Range::new(Position::new(0, 0), Position::new(1, 5))
        );
        assert_eq!(range.merge(Position::new(1, 3)), range);
    }

    #[test]
    fn test_intersect() {
        let a = Range::new(Position::new(0, 2), Position::new(0, 6));
        let b = Range::new(Position::new(0, 4), Position::new(0, 9));
        assert_eq!(
            a.intersect(&b),
            Some(Range::new(Position::new(0, 4), Position::new(0, 6)))
        );

        let c = Range::new(Position::new(0, 7), Position::new(0, 9));
        assert_eq!(a.intersect(&c), None);

        let touching = Range::new(Position::new(0, 6), Position::new(0, 8));
        assert!(a.intersect(&touching).is_some_and(|r| r.is_point()));
    }
}
