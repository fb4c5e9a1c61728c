//! The line store.
//!
//! A [`Document`] is an ordered, index-addressable vector of [`Line`] records and is never
//! empty. The foreground owns it and performs every mutation through `&mut self`; the parsing
//! worker shares the line vector (read-only) so it can hand a line's end context to its
//! successor.
//!
//! # Example
//!
//! ```rust
//! use buffer_core::{Document, Position};
//!
//! let mut doc = Document::new();
//! doc.set_text(["int x = 1;", "// done"]);
//!
//! let edit = doc
//!     .replace_content(Position::new(0, 4).to_empty_range(), "y, ")
//!     .unwrap();
//! assert_eq!(doc.get_text(edit.inserted_range).unwrap(), "y, ");
//! assert_eq!(doc.full_text(), "int y, x = 1;\n// done");
//! ```

use crate::config::{BufferConfig, DEFAULT_TAB_WIDTH};
use crate::error::DocumentError;
use crate::lexer::LineContext;
use crate::line::{Line, LineChange, LineChangeKind, LineObserver};
use crate::position::{Position, Range};
use crate::text::{char_slice, expand_tabs, split_lines_preserve_trailing};
use std::io::{BufRead, Write};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// The result of [`Document::replace_content`]: what was inserted where, and what was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    /// Range now occupied by the inserted text.
    pub inserted_range: Range,
    /// Text that occupied the replaced range, verbatim.
    pub removed_text: String,
}

impl EditResult {
    /// Create an edit result.
    pub fn new(inserted_range: Range, removed_text: impl Into<String>) -> Self {
        Self {
            inserted_range,
            removed_text: removed_text.into(),
        }
    }
}

/// Line vector and observer shared with the parsing worker.
#[derive(Default)]
pub(crate) struct LineStore {
    lines: RwLock<Vec<Arc<Line>>>,
    observer: RwLock<Option<LineObserver>>,
}

impl LineStore {
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Line>>> {
        self.lines.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Arc<Line>>> {
        self.lines.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_observer(&self, observer: Option<LineObserver>) {
        *self.observer.write().unwrap_or_else(PoisonError::into_inner) = observer;
    }

    /// Deliver notifications. Must be called without the line lock held.
    pub(crate) fn notify(&self, changes: &[LineChange]) {
        if changes.is_empty() {
            return;
        }
        let observer = self
            .observer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(observer) = observer {
            for change in changes {
                observer(change);
            }
        }
    }
}

/// An editable multi-line document.
pub struct Document {
    store: Arc<LineStore>,
    max_offset: usize,
    tab_width: usize,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("line_count", &self.line_count())
            .field("max_offset", &self.max_offset)
            .field("tab_width", &self.tab_width)
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding a single empty line.
    pub fn new() -> Self {
        Self::with_tab_width(DEFAULT_TAB_WIDTH)
    }

    /// Create an empty document using the tab width from `config`.
    pub fn with_config(config: &BufferConfig) -> Self {
        Self::with_tab_width(config.tab_width)
    }

    /// Create an empty document that expands tabs to `tab_width` spaces.
    pub fn with_tab_width(tab_width: usize) -> Self {
        let mut doc = Self {
            store: Arc::default(),
            max_offset: 0,
            tab_width,
        };
        doc.set_text(std::iter::empty::<&str>());
        doc
    }

    pub(crate) fn store(&self) -> &Arc<LineStore> {
        &self.store
    }

    /// Install (or remove) the observer notified about lexical-state changes of lines.
    pub fn set_observer(&self, observer: Option<LineObserver>) {
        self.store.set_observer(observer);
    }

    /// Number of lines (always at least 1).
    pub fn line_count(&self) -> usize {
        self.store.read().len()
    }

    /// Longest line length seen since the last bulk load.
    pub fn max_offset(&self) -> usize {
        self.max_offset
    }

    /// `(max_offset, line_count)`: the size of the text grid.
    pub fn text_dimension(&self) -> (usize, usize) {
        (self.max_offset, self.line_count())
    }

    /// Tab width used when expanding input.
    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// The line at `index`.
    pub fn line(&self, index: usize) -> Option<Arc<Line>> {
        self.store.read().get(index).cloned()
    }

    /// Range covering the whole line at `index`.
    pub fn line_range(&self, index: usize) -> Option<Range> {
        let len = self.store.read().get(index)?.len();
        Some(Range::new(Position::new(index, 0), Position::new(index, len)))
    }

    /// End of the line containing `position`.
    pub fn end_of_line(&self, position: Position) -> Option<Position> {
        self.line_range(position.line).map(|range| range.end())
    }

    /// End of the last line.
    pub fn document_end(&self) -> Position {
        let lines = self.store.read();
        let last = lines.len() - 1;
        Position::new(last, lines[last].len())
    }

    /// Texts of all lines, in order.
    pub fn line_texts(&self) -> Vec<Arc<str>> {
        self.store.read().iter().map(|line| line.text()).collect()
    }

    /// The whole document, lines joined with `\n`.
    pub fn full_text(&self) -> String {
        self.line_texts().join("\n")
    }

    fn check_position(lines: &[Arc<Line>], position: Position) -> Result<(), DocumentError> {
        let line = lines
            .get(position.line)
            .ok_or(DocumentError::LineOutOfBounds {
                line: position.line,
                line_count: lines.len(),
            })?;
        let line_len = line.len();
        if position.offset > line_len {
            return Err(DocumentError::OffsetOutOfBounds { position, line_len });
        }
        Ok(())
    }

    fn check_range(lines: &[Arc<Line>], range: Range) -> Result<(), DocumentError> {
        Self::check_position(lines, range.begin())?;
        Self::check_position(lines, range.end())
    }

    /// Text addressed by `range`; lines are joined with `\n`.
    pub fn get_text(&self, range: Range) -> Result<String, DocumentError> {
        let lines = self.store.read();
        Self::check_range(&lines, range)?;
        Ok(Self::collect_text(&lines, range))
    }

    fn collect_text(lines: &[Arc<Line>], range: Range) -> String {
        if range.is_point() {
            return String::new();
        }
        let (begin, end) = (range.begin(), range.end());
        if range.is_single_line() {
            let text = lines[begin.line].text();
            return char_slice(&text, begin.offset, end.offset).to_string();
        }

        let mut out = String::new();
        for (index, line) in lines
            .iter()
            .enumerate()
            .take(end.line + 1)
            .skip(begin.line)
        {
            let text = line.text();
            let len = line.len();
            let Some(piece) = Range::new(Position::new(index, 0), Position::new(index, len))
                .intersect(&range)
            else {
                continue;
            };
            if index > begin.line {
                out.push('\n');
            }
            out.push_str(char_slice(&text, piece.begin().offset, piece.end().offset));
        }
        out
    }

    /// Replace the content of `range` with `text`.
    ///
    /// `text` is split on `\n` (a trailing `\r` on each piece is dropped) and tabs are
    /// expanded. Returns the range the new text occupies and the removed text. On error the
    /// document is left unchanged.
    pub fn replace_content(&mut self, range: Range, text: &str) -> Result<EditResult, DocumentError> {
        let pieces: Vec<String> = split_lines_preserve_trailing(text)
            .into_iter()
            .map(|piece| expand_tabs(piece, self.tab_width))
            .collect();

        let mut lines = self.store.write();
        Self::check_range(&lines, range)?;
        let removed_text = Self::collect_text(&lines, range);

        let (begin, end) = (range.begin(), range.end());
        let first = lines[begin.line].clone();
        let first_text = first.text();
        let last_text = lines[end.line].text();
        let head = char_slice(&first_text, 0, begin.offset);
        let tail = char_slice(&last_text, end.offset, lines[end.line].len());

        let last_piece = pieces.len() - 1;
        let last_piece_len = pieces[last_piece].chars().count();
        let inserted_end = if last_piece == 0 {
            Position::new(begin.line, begin.offset + last_piece_len)
        } else {
            Position::new(begin.line + last_piece, last_piece_len)
        };

        let mut new_lines = Vec::with_capacity(last_piece);
        if last_piece == 0 {
            first.set_text(format!("{head}{}{tail}", pieces[0]));
        } else {
            first.set_text(format!("{head}{}", pieces[0]));
            for (i, piece) in pieces.iter().enumerate().skip(1) {
                let content = if i == last_piece {
                    format!("{piece}{tail}")
                } else {
                    piece.clone()
                };
                new_lines.push(Arc::new(Line::new(content, begin.line + i)));
            }
        }

        self.max_offset = std::iter::once(&first)
            .chain(new_lines.iter())
            .map(|line| line.len())
            .fold(self.max_offset, usize::max);

        let old_count = lines.len();
        if end.line > begin.line || !new_lines.is_empty() {
            for removed in lines.splice(begin.line + 1..=end.line, new_lines) {
                removed.detach();
            }
        }
        if lines.len() != old_count {
            Self::reindex(&lines, begin.line + 1);
        }
        drop(lines);

        let changes: Vec<LineChange> = (begin.line..=inserted_end.line)
            .map(|line| LineChange {
                line,
                kind: LineChangeKind::Invalidated,
            })
            .collect();
        self.store.notify(&changes);

        Ok(EditResult::new(Range::new(begin, inserted_end), removed_text))
    }

    fn reindex(lines: &[Arc<Line>], from: usize) {
        for (index, line) in lines.iter().enumerate().skip(from) {
            line.set_index(index);
        }
    }

    /// Replace the whole document with `lines` (an empty input yields one empty line).
    ///
    /// Tabs are expanded; `max_offset` is recomputed. The first line starts in plain context;
    /// every other line's context is unknown until the pipeline reaches it.
    pub fn set_text<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut new_lines: Vec<Arc<Line>> = lines
            .into_iter()
            .enumerate()
            .map(|(index, text)| Arc::new(Line::new(expand_tabs(text.as_ref(), self.tab_width), index)))
            .collect();
        if new_lines.is_empty() {
            new_lines.push(Arc::new(Line::new(String::new(), 0)));
        }
        let _ = new_lines[0].compare_and_set_begin_context(None, LineContext::Plain);

        self.max_offset = new_lines.iter().map(|line| line.len()).max().unwrap_or(0);
        debug!(
            line_count = new_lines.len(),
            max_offset = self.max_offset,
            "document text replaced"
        );
        let mut lines = self.store.write();
        for old in std::mem::replace(&mut *lines, new_lines) {
            old.detach();
        }
    }

    /// Reset to a single empty line.
    pub fn clear(&mut self) {
        self.set_text(std::iter::empty::<&str>());
    }

    /// Replace the document with line-oriented text read from `reader`.
    ///
    /// Lines may end in `\n` or `\r\n`; a final terminator does not produce an extra line.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<(), DocumentError> {
        let lines = reader.lines().collect::<Result<Vec<String>, _>>()?;
        self.set_text(lines);
        Ok(())
    }

    /// Write every line followed by `\n`.
    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), DocumentError> {
        for text in self.line_texts() {
            writer.write_all(text.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }
}
