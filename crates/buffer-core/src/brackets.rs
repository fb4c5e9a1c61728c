//! Bracket matching.
//!
//! The matcher walks bracket segments of one family with a signed nesting level. Lines between
//! the caret line and the line holding the match are skipped in O(1) using the per-line
//! [`BracketBalance`](crate::BracketBalance) aggregates; only the line proven to contain the
//! match has its segments decoded.

use crate::document::Document;
use crate::lexer::{BracketFamily, Segment, SegmentBuffer};
use crate::position::{Position, Range};
use crate::text::char_slice;

/// Both brackets of a matched pair, as single-character ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketPair {
    /// The opening bracket.
    pub open: Range,
    /// The closing bracket.
    pub close: Range,
}

#[derive(Debug, Clone, Copy)]
struct Matched {
    bracket: Position,
    paired: Position,
}

/// Find the bracket pair next to `caret`.
///
/// Returns the range from the start of the earlier bracket to the start of the later one, or
/// `None` when there is no eligible bracket near the caret or it has no partner (unbalanced or
/// not yet parsed text).
pub fn find_pair(document: &Document, caret: Position) -> Option<Range> {
    locate(document, caret).map(|m| Range::safe_create(m.bracket, m.paired))
}

/// Like [`find_pair`], but returns both brackets as single-character ranges.
pub fn find_bracket_pair(document: &Document, caret: Position) -> Option<BracketPair> {
    let m = locate(document, caret)?;
    let (open, close) = if m.bracket < m.paired {
        (m.bracket, m.paired)
    } else {
        (m.paired, m.bracket)
    };
    Some(BracketPair {
        open: open.to_single_symbol_range(),
        close: close.to_single_symbol_range(),
    })
}

/// Position of the partner of the bracket next to `caret`.
pub fn matching_bracket(document: &Document, caret: Position) -> Option<Position> {
    locate(document, caret).map(|m| m.paired)
}

fn locate(document: &Document, caret: Position) -> Option<Matched> {
    let line = document.line(caret.line)?;
    let text = line.text();
    if caret.offset > line.len() {
        return None;
    }
    let description = line.description()?;
    if !description.brackets().has_brackets() {
        return None;
    }
    let segments = description.segments();

    let (index, segment) = nearest_bracket(segments, &text, caret.offset)?;
    let (family, open) = segment.kind.bracket()?;
    let bracket = caret.to_offset(segment.start);

    let mut level = if open { 1 } else { -1 };
    let next = if open {
        Some(index + 1)
    } else {
        index.checked_sub(1)
    };
    if let Some(offset) = walk_segments(segments, family, &mut level, next, open) {
        return Some(Matched {
            bracket,
            paired: caret.to_offset(offset),
        });
    }

    let mut line_index = caret.line;
    loop {
        line_index = if open {
            line_index + 1
        } else {
            line_index.checked_sub(1)?
        };
        let description = document.line(line_index)?.description()?;
        let balance = description.brackets().balance(family);
        if balance.contains_match(level) {
            let segments = description.segments();
            let from = if open {
                Some(0)
            } else {
                segments.len().checked_sub(1)
            };
            let offset = walk_segments(segments, family, &mut level, from, open)?;
            return Some(Matched {
                bracket,
                paired: Position::new(line_index, offset),
            });
        }
        level += balance.cumulative;
    }
}

/// Pick the bracket segment adjacent to `caret` (only whitespace in between).
///
/// The candidates are the first segment starting at or after the caret and the one before it.
/// When both qualify the right one wins only if it is strictly closer.
fn nearest_bracket(segments: &SegmentBuffer, text: &str, caret: usize) -> Option<(usize, Segment)> {
    let right_index = segments.iter().position(|s| s.start >= caret);
    let left_index = match right_index {
        Some(index) => index.checked_sub(1),
        None => segments.len().checked_sub(1),
    };

    let eligible = |index: Option<usize>| -> Option<(usize, Segment)> {
        let index = index?;
        let segment = segments.get(index)?;
        if !segment.kind.is_bracket() {
            return None;
        }
        let between = if segment.start < caret {
            char_slice(text, segment.start + 1, caret)
        } else {
            char_slice(text, caret, segment.start)
        };
        between
            .chars()
            .all(char::is_whitespace)
            .then_some((index, segment))
    };

    match (eligible(left_index), eligible(right_index)) {
        (Some((_, left)), Some(right)) if caret - left.start - 1 > right.1.start - caret => Some(right),
        (Some(left), _) => Some(left),
        (None, right) => right,
    }
}

/// Walk segments of `family` from `from` in one direction, updating `level`.
///
/// Returns the start offset of the segment that brings `level` back to zero.
fn walk_segments(
    segments: &SegmentBuffer,
    family: BracketFamily,
    level: &mut i32,
    from: Option<usize>,
    forward: bool,
) -> Option<usize> {
    let mut index = from?;
    loop {
        let segment = segments.get(index)?;
        if let Some((segment_family, open)) = segment.kind.bracket()
            && segment_family == family
        {
            *level += if open { 1 } else { -1 };
            if *level == 0 {
                return Some(segment.start);
            }
        }
        index = if forward {
            index + 1
        } else {
            index.checked_sub(1)?
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{LineContext, LineDescription, LineTokenizer, SegmentKind};
    use crate::pipeline::ParsingPipeline;
    use std::sync::Arc;

    /// Brackets only; everything else is ignored.
    struct BracketsOnly;

    impl LineTokenizer for BracketsOnly {
        fn tokenize(&self, text: &str, begin: LineContext) -> LineDescription {
            let mut builder = LineDescription::builder(begin);
            for (offset, c) in text.chars().enumerate() {
                if let Some((family, open)) = BracketFamily::classify(c) {
                    builder.push(SegmentKind::Bracket { family, open }, offset, offset);
                } else if c.is_alphanumeric() {
                    builder.push(SegmentKind::Identifier, offset, offset);
                }
            }
            builder.finish()
        }
    }

    fn parsed(lines: &[&str]) -> Document {
        let mut doc = Document::new();
        doc.set_text(lines);
        let pipeline = ParsingPipeline::new(&doc, Arc::new(BracketsOnly));
        pipeline.enqueue(doc.line(0).unwrap());
        pipeline.wait_idle();
        doc
    }

    fn pos(line: usize, offset: usize) -> Position {
        Position::new(line, offset)
    }

    #[test]
    fn test_same_line_innermost_pair() {
        let doc = parsed(&["( a (b) c )"]);
        assert_eq!(find_pair(&doc, pos(0, 4)), Some(Range::new(pos(0, 4), pos(0, 6))));
        assert_eq!(find_pair(&doc, pos(0, 7)), Some(Range::new(pos(0, 4), pos(0, 6))));
        assert_eq!(find_pair(&doc, pos(0, 0)), Some(Range::new(pos(0, 0), pos(0, 10))));
    }

    #[test]
    fn test_caret_away_from_brackets() {
        let doc = parsed(&["( ab (c) d )", "abc"]);
        assert_eq!(find_pair(&doc, pos(0, 3)), None);
        assert_eq!(find_pair(&doc, pos(1, 1)), None);
        assert_eq!(find_pair(&doc, pos(0, 40)), None);
    }

    #[test]
    fn test_whitespace_between_caret_and_bracket() {
        let doc = parsed(&["x (   ) y"]);
        assert_eq!(find_pair(&doc, pos(0, 4)), Some(Range::new(pos(0, 2), pos(0, 6))));
    }

    #[test]
    fn test_right_bracket_wins_only_when_closer() {
        let doc = parsed(&["()"]);
        // Caret between the brackets: equally close, left wins.
        assert_eq!(
            matching_bracket(&doc, pos(0, 1)),
            Some(pos(0, 1)),
            "left bracket's partner"
        );

        let doc = parsed(&["(  )"]);
        assert_eq!(matching_bracket(&doc, pos(0, 3)), Some(pos(0, 0)));
        assert_eq!(matching_bracket(&doc, pos(0, 1)), Some(pos(0, 3)));
    }

    #[test]
    fn test_cross_line_pair_skips_balanced_lines() {
        let doc = parsed(&["{", "  (a) [b]", "  { x }", "}"]);
        assert_eq!(find_pair(&doc, pos(0, 0)), Some(Range::new(pos(0, 0), pos(3, 0))));
        assert_eq!(find_pair(&doc, pos(3, 0)), Some(Range::new(pos(0, 0), pos(3, 0))));
        assert_eq!(
            find_bracket_pair(&doc, pos(3, 1)),
            Some(BracketPair {
                open: pos(0, 0).to_single_symbol_range(),
                close: pos(3, 0).to_single_symbol_range(),
            })
        );
    }

    #[test]
    fn test_cross_line_pair_through_drawdown() {
        // The middle lines close and reopen the same family.
        let doc = parsed(&["f(", ") + (", "x)"]);
        assert_eq!(find_pair(&doc, pos(0, 1)), Some(Range::new(pos(0, 1), pos(1, 0))));
        assert_eq!(find_pair(&doc, pos(2, 1)), Some(Range::new(pos(1, 4), pos(2, 1))));
    }

    #[test]
    fn test_families_do_not_mix() {
        let doc = parsed(&["( ]", ")"]);
        assert_eq!(find_pair(&doc, pos(0, 0)), Some(Range::new(pos(0, 0), pos(1, 0))));
        assert_eq!(find_pair(&doc, pos(0, 2)), None);
    }

    #[test]
    fn test_unbalanced_and_unparsed() {
        let doc = parsed(&["((", ")"]);
        assert_eq!(find_pair(&doc, pos(0, 0)), None);

        let mut doc = Document::new();
        doc.set_text(["(", ")"]);
        assert_eq!(find_pair(&doc, pos(0, 0)), None);
        assert_eq!(find_pair(&doc, pos(5, 0)), None);
    }
}
