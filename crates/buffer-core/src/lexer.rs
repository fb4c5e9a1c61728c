//! Lexical data model and the tokenizer seam.
//!
//! A [`LineTokenizer`] turns one line of text plus the context inherited from the previous line
//! into a [`LineDescription`]: classified segments, the context handed to the next line, and
//! per-family bracket aggregates used by the bracket matcher to skip whole lines.
//!
//! Language-specific scanners live in separate crates (e.g. `buffer-core-java`) and plug into
//! the [`ParsingPipeline`](crate::ParsingPipeline) through this trait.

/// Lexical mode carried across a line boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineContext {
    /// Ordinary code.
    #[default]
    Plain,
    /// Inside an unterminated `/* ... */` block comment.
    InBlockComment,
    /// Inside an unterminated `"""` text literal.
    InTextLiteral,
}

/// The three bracket families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BracketFamily {
    /// `(` and `)`
    Round,
    /// `[` and `]`
    Square,
    /// `{` and `}`
    Curly,
}

impl BracketFamily {
    /// All families, in code order.
    pub const ALL: [BracketFamily; 3] = [
        BracketFamily::Round,
        BracketFamily::Square,
        BracketFamily::Curly,
    ];

    fn index(self) -> usize {
        match self {
            BracketFamily::Round => 0,
            BracketFamily::Square => 1,
            BracketFamily::Curly => 2,
        }
    }

    /// Classify a bracket character as `(family, is_open)`.
    pub fn classify(c: char) -> Option<(BracketFamily, bool)> {
        match c {
            '(' => Some((BracketFamily::Round, true)),
            ')' => Some((BracketFamily::Round, false)),
            '[' => Some((BracketFamily::Square, true)),
            ']' => Some((BracketFamily::Square, false)),
            '{' => Some((BracketFamily::Curly, true)),
            '}' => Some((BracketFamily::Curly, false)),
            _ => None,
        }
    }
}

/// Classification of a segment.
///
/// The six bracket classifications (three families, open or close) are disjoint from the
/// identifier/keyword/numeric/literal/comment classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// A reserved word.
    Keyword,
    /// Any other word.
    Identifier,
    /// A numeric literal.
    Numeric,
    /// A string, character or text-block literal.
    Literal,
    /// A line or block comment.
    Comment,
    /// One bracket character.
    Bracket {
        /// Bracket family.
        family: BracketFamily,
        /// `true` for `(`, `[`, `{`.
        open: bool,
    },
}

const CODE_KEYWORD: u8 = 254;
const CODE_IDENTIFIER: u8 = 253;
const CODE_NUMERIC: u8 = 252;
const CODE_LITERAL: u8 = 251;
const CODE_COMMENT: u8 = 250;

impl SegmentKind {
    /// One-byte code used by [`SegmentBuffer`]. Brackets use `0..=5`.
    pub fn code(self) -> u8 {
        match self {
            SegmentKind::Keyword => CODE_KEYWORD,
            SegmentKind::Identifier => CODE_IDENTIFIER,
            SegmentKind::Numeric => CODE_NUMERIC,
            SegmentKind::Literal => CODE_LITERAL,
            SegmentKind::Comment => CODE_COMMENT,
            SegmentKind::Bracket { family, open } => {
                ((family.index() as u8) << 1) | u8::from(!open)
            }
        }
    }

    /// Inverse of [`SegmentKind::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            CODE_KEYWORD => Some(SegmentKind::Keyword),
            CODE_IDENTIFIER => Some(SegmentKind::Identifier),
            CODE_NUMERIC => Some(SegmentKind::Numeric),
            CODE_LITERAL => Some(SegmentKind::Literal),
            CODE_COMMENT => Some(SegmentKind::Comment),
            0..=5 => Some(SegmentKind::Bracket {
                family: BracketFamily::ALL[usize::from(code >> 1)],
                open: code & 1 == 0,
            }),
            _ => None,
        }
    }

    /// Whether this is one of the six bracket kinds.
    pub fn is_bracket(self) -> bool {
        matches!(self, SegmentKind::Bracket { .. })
    }

    /// Bracket family and direction, if this is a bracket.
    pub fn bracket(self) -> Option<(BracketFamily, bool)> {
        match self {
            SegmentKind::Bracket { family, open } => Some((family, open)),
            _ => None,
        }
    }
}

/// A classified sub-range `[start, end]` of a line (`end` inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Classification.
    pub kind: SegmentKind,
    /// Offset of the first character.
    pub start: usize,
    /// Offset of the last character.
    pub end: usize,
}

impl Segment {
    /// Create a segment.
    pub fn new(kind: SegmentKind, start: usize, end: usize) -> Self {
        Self { kind, start, end }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OffsetWidth {
    One = 1,
    Two = 2,
    Four = 4,
}

impl OffsetWidth {
    fn for_max(max: usize) -> Self {
        if max <= usize::from(u8::MAX) {
            OffsetWidth::One
        } else if max <= usize::from(u16::MAX) {
            OffsetWidth::Two
        } else {
            OffsetWidth::Four
        }
    }

    fn record_len(self) -> usize {
        1 + 2 * self as usize
    }
}

/// Compact segment storage.
///
/// Each record is one kind byte followed by two big-endian offsets of 1, 2 or 4 bytes, the
/// narrowest width that can hold the largest offset in the line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentBuffer {
    width: OffsetWidth,
    bytes: Box<[u8]>,
}

impl Default for SegmentBuffer {
    fn default() -> Self {
        Self {
            width: OffsetWidth::One,
            bytes: Box::default(),
        }
    }
}

impl SegmentBuffer {
    /// Encode segments (in line order).
    ///
    /// # Panics
    ///
    /// Panics if an offset does not fit in 32 bits.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let max = segments.iter().map(|s| s.end.max(s.start)).max().unwrap_or(0);
        let width = OffsetWidth::for_max(max);
        let mut bytes = Vec::with_capacity(segments.len() * width.record_len());
        for segment in segments {
            bytes.push(segment.kind.code());
            for offset in [segment.start, segment.end] {
                match width {
                    OffsetWidth::One => bytes.push(offset as u8),
                    OffsetWidth::Two => bytes.extend_from_slice(&(offset as u16).to_be_bytes()),
                    OffsetWidth::Four => {
                        let offset = u32::try_from(offset).expect("line offset exceeds u32");
                        bytes.extend_from_slice(&offset.to_be_bytes());
                    }
                }
            }
        }
        Self {
            width,
            bytes: bytes.into_boxed_slice(),
        }
    }

    /// Number of stored segments.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.width.record_len()
    }

    /// Returns `true` if no segment is stored.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes used per offset (1, 2 or 4).
    pub fn offset_width(&self) -> usize {
        self.width as usize
    }

    /// Decode the segment at `index`.
    pub fn get(&self, index: usize) -> Option<Segment> {
        let record_len = self.width.record_len();
        let record = self
            .bytes
            .get(index * record_len..(index + 1) * record_len)?;
        let kind = SegmentKind::from_code(record[0])?;
        let w = self.width as usize;
        let start = read_offset(&record[1..1 + w]);
        let end = read_offset(&record[1 + w..1 + 2 * w]);
        Some(Segment { kind, start, end })
    }

    /// Iterate over all segments in line order.
    pub fn iter(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    /// Decode everything into a vector.
    pub fn to_vec(&self) -> Vec<Segment> {
        self.iter().collect()
    }
}

fn read_offset(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b))
}

/// Running nesting balance of one bracket family across a line scanned in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BracketBalance {
    /// Opens minus closes over the whole line.
    pub cumulative: i32,
    /// The most negative running balance reached (never positive).
    pub drawdown: i32,
}

impl BracketBalance {
    fn register(&mut self, open: bool) {
        if open {
            self.cumulative += 1;
        } else {
            self.cumulative -= 1;
            self.drawdown = self.drawdown.min(self.cumulative);
        }
    }

    /// Whether a walk entering this line with nesting `level` reaches zero inside it.
    ///
    /// A positive level is a forward walk (looking for a closer, scanning left to right); a
    /// negative level is a backward walk (looking for an opener, scanning right to left).
    pub fn contains_match(&self, level: i32) -> bool {
        if level > 0 {
            level <= -self.drawdown
        } else {
            level >= self.drawdown - self.cumulative
        }
    }
}

/// Bracket balances for all three families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BracketAggregates {
    balances: [BracketBalance; 3],
    any: bool,
}

impl BracketAggregates {
    /// Account for one bracket.
    pub fn register(&mut self, family: BracketFamily, open: bool) {
        self.any = true;
        self.balances[family.index()].register(open);
    }

    /// Balance of one family.
    pub fn balance(&self, family: BracketFamily) -> BracketBalance {
        self.balances[family.index()]
    }

    /// Whether the line holds any bracket at all.
    pub fn has_brackets(&self) -> bool {
        self.any
    }
}

/// The parsed description of a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDescription {
    begin: LineContext,
    end: LineContext,
    segments: SegmentBuffer,
    brackets: BracketAggregates,
}

impl LineDescription {
    /// Start building a description for a line that begins in `begin`.
    pub fn builder(begin: LineContext) -> DescriptionBuilder {
        DescriptionBuilder {
            begin,
            end: begin,
            segments: Vec::new(),
            brackets: BracketAggregates::default(),
        }
    }

    /// The begin context this description was computed against.
    pub fn begin_context(&self) -> LineContext {
        self.begin
    }

    /// The context handed to the next line.
    pub fn end_context(&self) -> LineContext {
        self.end
    }

    /// Compact segment storage.
    pub fn segments(&self) -> &SegmentBuffer {
        &self.segments
    }

    /// Bracket aggregates.
    pub fn brackets(&self) -> &BracketAggregates {
        &self.brackets
    }
}

/// Incremental constructor for [`LineDescription`].
#[derive(Debug)]
pub struct DescriptionBuilder {
    begin: LineContext,
    end: LineContext,
    segments: Vec<Segment>,
    brackets: BracketAggregates,
}

impl DescriptionBuilder {
    /// Append a segment; brackets update the aggregates.
    pub fn push(&mut self, kind: SegmentKind, start: usize, end: usize) {
        if let Some((family, open)) = kind.bracket() {
            self.brackets.register(family, open);
        }
        self.segments.push(Segment::new(kind, start, end));
    }

    /// Set the context handed to the next line (defaults to the begin context).
    pub fn set_end_context(&mut self, context: LineContext) {
        self.end = context;
    }

    /// Currently pending end context.
    pub fn end_context(&self) -> LineContext {
        self.end
    }

    /// Finish and compact.
    pub fn finish(self) -> LineDescription {
        LineDescription {
            begin: self.begin,
            end: self.end,
            segments: SegmentBuffer::from_segments(&self.segments),
            brackets: self.brackets,
        }
    }
}

/// A pure line scanner.
///
/// Implementations must be deterministic: the same text and begin context always produce the
/// same description. They run on the pipeline's worker thread.
pub trait LineTokenizer: Send + Sync {
    /// Tokenize `text`, which starts in lexical mode `begin`.
    fn tokenize(&self, text: &str, begin: LineContext) -> LineDescription;
}
