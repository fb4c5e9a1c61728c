//! `buffer-core-java` - best-effort Java line tokenizer for `buffer-core`.
//!
//! The tokenizer classifies one line at a time, carrying block-comment and text-block state
//! across line boundaries through [`LineContext`]. It is meant for syntax coloring and bracket
//! matching, not for compiling: anything it does not recognize (operators, stray characters)
//! simply produces no segment.
//!
//! ```rust
//! use buffer_core::{LineContext, LineTokenizer, SegmentKind};
//! use buffer_core_java::JavaTokenizer;
//!
//! let tokenizer = JavaTokenizer::new().unwrap();
//! let description = tokenizer.tokenize("int x = 0x1F; /* note", LineContext::Plain);
//!
//! let kinds: Vec<SegmentKind> = description.segments().iter().map(|s| s.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         SegmentKind::Keyword,
//!         SegmentKind::Identifier,
//!         SegmentKind::Numeric,
//!         SegmentKind::Comment,
//!     ]
//! );
//! assert_eq!(description.end_context(), LineContext::InBlockComment);
//! ```

use buffer_core::{
    BracketFamily, DescriptionBuilder, LineContext, LineDescription, LineTokenizer, SegmentKind,
};
use regex::Regex;

/// Reserved words, literals and the contextual keywords commonly colored as keywords.
///
/// Sorted, so lookups can binary-search.
pub const KEYWORDS: &[&str] = &[
    "abstract",
    "assert",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "default",
    "do",
    "double",
    "else",
    "enum",
    "exports",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "goto",
    "if",
    "implements",
    "import",
    "instanceof",
    "int",
    "interface",
    "long",
    "module",
    "native",
    "new",
    "null",
    "package",
    "permits",
    "private",
    "protected",
    "public",
    "record",
    "requires",
    "return",
    "sealed",
    "short",
    "static",
    "strictfp",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "var",
    "void",
    "volatile",
    "while",
    "yield",
];

/// Whether `word` is in [`KEYWORDS`].
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.binary_search(&word).is_ok()
}

// Hex (`0x1F`, `0xFF_FFL`) or decimal with optional fraction, exponent and type suffix.
const NUMERIC_PATTERN: &str = r"^(?:0[xX][0-9a-fA-F](?:[0-9a-fA-F_]*[0-9a-fA-F])?[lL]?|[0-9](?:[0-9_]*[0-9])?(?:\.[0-9](?:[0-9_]*[0-9])?)?(?:[eE][+-]?[0-9]+)?[lLfFdD]?)";

/// Java tokenizer implementing [`LineTokenizer`].
#[derive(Debug, Clone)]
pub struct JavaTokenizer {
    numeric: Regex,
}

impl JavaTokenizer {
    /// Create a tokenizer.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            numeric: Regex::new(NUMERIC_PATTERN)?,
        })
    }
}

impl LineTokenizer for JavaTokenizer {
    fn tokenize(&self, text: &str, begin: LineContext) -> LineDescription {
        Scanner::new(text, self).run(begin)
    }
}

struct Scanner<'a> {
    text: &'a str,
    /// `(byte offset, char)` for every character.
    chars: Vec<(usize, char)>,
    tokenizer: &'a JavaTokenizer,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str, tokenizer: &'a JavaTokenizer) -> Self {
        Self {
            text,
            chars: text.char_indices().collect(),
            tokenizer,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    fn at(&self, index: usize) -> Option<char> {
        self.chars.get(index).map(|&(_, c)| c)
    }

    fn starts_with(&self, index: usize, pattern: &str) -> bool {
        let mut i = index;
        for expected in pattern.chars() {
            if self.at(i) != Some(expected) {
                return false;
            }
            i += 1;
        }
        true
    }

    /// Index of the `*` of the first `*/` at or after `from`.
    fn find_comment_close(&self, from: usize) -> Option<usize> {
        (from..self.len()).find(|&i| self.starts_with(i, "*/"))
    }

    /// Index of the first unescaped `"""` at or after `from`.
    fn find_text_block_close(&self, from: usize) -> Option<usize> {
        let mut i = from;
        while i < self.len() {
            if self.at(i) == Some('\\') {
                i += 2;
                continue;
            }
            if self.starts_with(i, "\"\"\"") {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    /// Index of the closing `quote` of a single-line literal opened at `open`.
    fn find_quote_close(&self, open: usize, quote: char) -> Option<usize> {
        let mut i = open + 1;
        while let Some(c) = self.at(i) {
            match c {
                '\\' => i += 2,
                c if c == quote => return Some(i),
                _ => i += 1,
            }
        }
        None
    }

    fn run(self, begin: LineContext) -> LineDescription {
        let mut builder = LineDescription::builder(begin);
        let last = self.len().saturating_sub(1);

        let mut i = match begin {
            LineContext::Plain => 0,
            LineContext::InBlockComment => match self.find_comment_close(0) {
                Some(close) => {
                    builder.push(SegmentKind::Comment, 0, close + 1);
                    builder.set_end_context(LineContext::Plain);
                    close + 2
                }
                None => return self.finish_open(builder, SegmentKind::Comment, 0),
            },
            LineContext::InTextLiteral => match self.find_text_block_close(0) {
                Some(close) => {
                    builder.push(SegmentKind::Literal, 0, close + 2);
                    builder.set_end_context(LineContext::Plain);
                    close + 3
                }
                None => return self.finish_open(builder, SegmentKind::Literal, 0),
            },
        };

        while let Some(c) = self.at(i) {
            if c.is_whitespace() {
                i += 1;
                continue;
            }

            if self.starts_with(i, "//") {
                builder.push(SegmentKind::Comment, i, last);
                break;
            }

            if self.starts_with(i, "/*") {
                match self.find_comment_close(i + 2) {
                    Some(close) => {
                        builder.push(SegmentKind::Comment, i, close + 1);
                        i = close + 2;
                        continue;
                    }
                    None => {
                        builder.set_end_context(LineContext::InBlockComment);
                        return self.finish_open(builder, SegmentKind::Comment, i);
                    }
                }
            }

            if self.starts_with(i, "\"\"\"") {
                match self.find_text_block_close(i + 3) {
                    Some(close) => {
                        builder.push(SegmentKind::Literal, i, close + 2);
                        i = close + 3;
                        continue;
                    }
                    None => {
                        builder.set_end_context(LineContext::InTextLiteral);
                        return self.finish_open(builder, SegmentKind::Literal, i);
                    }
                }
            }

            if c == '"' || c == '\'' {
                let end = self.find_quote_close(i, c).unwrap_or(last);
                builder.push(SegmentKind::Literal, i, end);
                i = end + 1;
                continue;
            }

            if c.is_alphabetic() || c == '_' || c == '$' {
                let start = i;
                while self
                    .at(i + 1)
                    .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
                {
                    i += 1;
                }
                let word = &self.text[self.chars[start].0..self.byte_end(i)];
                let kind = if is_keyword(word) {
                    SegmentKind::Keyword
                } else {
                    SegmentKind::Identifier
                };
                builder.push(kind, start, i);
                i += 1;
                continue;
            }

            if c.is_ascii_digit() {
                let len = self
                    .tokenizer
                    .numeric
                    .find(&self.text[self.chars[i].0..])
                    .map_or(1, |m| m.as_str().chars().count());
                builder.push(SegmentKind::Numeric, i, i + len - 1);
                i += len;
                continue;
            }

            if let Some((family, open)) = BracketFamily::classify(c) {
                builder.push(SegmentKind::Bracket { family, open }, i, i);
            }
            i += 1;
        }

        builder.finish()
    }

    /// Byte offset just past the character at `index`.
    fn byte_end(&self, index: usize) -> usize {
        self.chars
            .get(index + 1)
            .map_or(self.text.len(), |&(byte, _)| byte)
    }

    /// Emit a construct that runs from `start` to the end of the line without closing.
    fn finish_open(
        &self,
        mut builder: DescriptionBuilder,
        kind: SegmentKind,
        start: usize,
    ) -> LineDescription {
        if start < self.len() {
            builder.push(kind, start, self.len() - 1);
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buffer_core::Segment;

    fn tokenize(text: &str, begin: LineContext) -> LineDescription {
        JavaTokenizer::new().unwrap().tokenize(text, begin)
    }

    fn segments(text: &str) -> Vec<Segment> {
        tokenize(text, LineContext::Plain).segments().to_vec()
    }

    fn seg(kind: SegmentKind, start: usize, end: usize) -> Segment {
        Segment::new(kind, start, end)
    }

    fn bracket(c: char) -> SegmentKind {
        let (family, open) = BracketFamily::classify(c).unwrap();
        SegmentKind::Bracket { family, open }
    }

    #[test]
    fn test_keyword_table_is_sorted() {
        assert!(KEYWORDS.windows(2).all(|w| w[0] < w[1]));
        assert!(is_keyword("while"));
        assert!(!is_keyword("While"));
    }

    #[test]
    fn test_keywords_identifiers_brackets() {
        assert_eq!(
            segments("public void run() {"),
            vec![
                seg(SegmentKind::Keyword, 0, 5),
                seg(SegmentKind::Keyword, 7, 10),
                seg(SegmentKind::Identifier, 12, 14),
                seg(bracket('('), 15, 15),
                seg(bracket(')'), 16, 16),
                seg(bracket('{'), 18, 18),
            ]
        );
    }

    #[test]
    fn test_numeric_literals() {
        for (text, len) in [
            ("42", 2),
            ("0x1F", 4),
            ("0xFF_FFL", 8),
            ("3.14", 4),
            ("1e10", 4),
            ("2.5E-3f", 7),
            ("1_000_000", 9),
            ("10L", 3),
            ("7d", 2),
        ] {
            assert_eq!(
                segments(text),
                vec![seg(SegmentKind::Numeric, 0, len - 1)],
                "{text}"
            );
        }

        // A trailing dot or underscore is not part of the number.
        assert_eq!(segments("1."), vec![seg(SegmentKind::Numeric, 0, 0)]);
        assert_eq!(
            segments("1_x"),
            vec![
                seg(SegmentKind::Numeric, 0, 0),
                seg(SegmentKind::Identifier, 1, 2)
            ]
        );
    }

    #[test]
    fn test_line_comment_runs_to_end() {
        assert_eq!(
            segments("x; // (not a bracket)"),
            vec![
                seg(SegmentKind::Identifier, 0, 0),
                seg(SegmentKind::Comment, 3, 20)
            ]
        );
    }

    #[test]
    fn test_block_comment_open_and_close() {
        let open = tokenize("a /* b", LineContext::Plain);
        assert_eq!(open.end_context(), LineContext::InBlockComment);
        assert_eq!(
            open.segments().to_vec(),
            vec![
                seg(SegmentKind::Identifier, 0, 0),
                seg(SegmentKind::Comment, 2, 5)
            ]
        );

        let inline = tokenize("a /* b */ c", LineContext::Plain);
        assert_eq!(inline.end_context(), LineContext::Plain);
        assert_eq!(inline.segments().len(), 3);

        let inside = tokenize("still (comment)", LineContext::InBlockComment);
        assert_eq!(inside.end_context(), LineContext::InBlockComment);
        assert_eq!(inside.segments().to_vec(), vec![seg(SegmentKind::Comment, 0, 14)]);
        assert!(!inside.brackets().has_brackets());

        let closing = tokenize("end */ int", LineContext::InBlockComment);
        assert_eq!(closing.end_context(), LineContext::Plain);
        assert_eq!(
            closing.segments().to_vec(),
            vec![
                seg(SegmentKind::Comment, 0, 5),
                seg(SegmentKind::Keyword, 7, 9)
            ]
        );

        let empty = tokenize("", LineContext::InBlockComment);
        assert!(empty.segments().is_empty());
        assert_eq!(empty.end_context(), LineContext::InBlockComment);
    }

    #[test]
    fn test_text_blocks() {
        let open = tokenize("String s = \"\"\"", LineContext::Plain);
        assert_eq!(open.end_context(), LineContext::InTextLiteral);
        assert_eq!(open.segments().get(2), Some(seg(SegmentKind::Literal, 11, 13)));

        let body = tokenize("  {not code} \\\"\"\"", LineContext::InTextLiteral);
        assert_eq!(body.end_context(), LineContext::InTextLiteral);
        assert!(!body.brackets().has_brackets());

        let close = tokenize("  end\"\"\";", LineContext::InTextLiteral);
        assert_eq!(close.end_context(), LineContext::Plain);
        assert_eq!(close.segments().to_vec(), vec![seg(SegmentKind::Literal, 0, 7)]);
    }

    #[test]
    fn test_string_and_char_literals() {
        assert_eq!(
            segments(r#"s = "a \"(\" b"; c = '\''"#),
            vec![
                seg(SegmentKind::Identifier, 0, 0),
                seg(SegmentKind::Literal, 4, 14),
                seg(SegmentKind::Identifier, 17, 17),
                seg(SegmentKind::Literal, 21, 24),
            ]
        );
        // Unterminated literals stop at the end of the line and do not carry over.
        let open = tokenize("\"abc", LineContext::Plain);
        assert_eq!(open.segments().to_vec(), vec![seg(SegmentKind::Literal, 0, 3)]);
        assert_eq!(open.end_context(), LineContext::Plain);
    }

    #[test]
    fn test_literal_start_wins_over_brackets() {
        let description = tokenize("f(\")\")", LineContext::Plain);
        let balance = description.brackets().balance(BracketFamily::Round);
        assert_eq!(balance.cumulative, 0);
        assert_eq!(balance.drawdown, 0);
    }

    #[test]
    fn test_unicode_offsets_are_chars() {
        assert_eq!(
            segments("été (x)"),
            vec![
                seg(SegmentKind::Identifier, 0, 2),
                seg(bracket('('), 4, 4),
                seg(SegmentKind::Identifier, 5, 5),
                seg(bracket(')'), 6, 6),
            ]
        );
    }

    #[test]
    fn test_bracket_aggregates() {
        let description = tokenize("} else { foo(a[0]) }", LineContext::Plain);
        let curly = description.brackets().balance(BracketFamily::Curly);
        assert_eq!(curly.cumulative, -1);
        assert_eq!(curly.drawdown, -1);
        let square = description.brackets().balance(BracketFamily::Square);
        assert_eq!((square.cumulative, square.drawdown), (0, 0));
    }
}
