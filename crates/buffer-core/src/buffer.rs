//! The editing facade.
//!
//! [`TextBuffer`] wires the components together the way a text component uses them:
//!
//! ```text
//! edit → Document::replace_content → EditResult ─┬→ UndoRedoManager::record
//!                                                 └→ ParsingPipeline::enqueue(first affected line)
//! worker → LineDescription per line → observer (repaint) / bracket matcher
//! ```

use crate::brackets::{self, BracketPair};
use crate::config::BufferConfig;
use crate::document::{Document, EditResult};
use crate::error::DocumentError;
use crate::history::UndoRedoManager;
use crate::lexer::LineTokenizer;
use crate::line::LineChange;
use crate::navigator::{NavigateBy, NavigateTo, Navigator};
use crate::pipeline::ParsingPipeline;
use crate::position::{Position, Range};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// A document with background tokenization, bracket matching and undo/redo.
///
/// # Example
///
/// ```rust
/// use buffer_core::{LineContext, LineDescription, LineTokenizer, Position, TextBuffer};
/// use std::sync::Arc;
///
/// struct Plain;
///
/// impl LineTokenizer for Plain {
///     fn tokenize(&self, _text: &str, begin: LineContext) -> LineDescription {
///         LineDescription::builder(begin).finish()
///     }
/// }
///
/// let mut buffer = TextBuffer::new(Arc::new(Plain));
/// buffer.set_text(["Hello"]);
/// buffer
///     .replace_content(Position::new(0, 5).to_empty_range(), ", world")
///     .unwrap();
/// assert_eq!(buffer.document().full_text(), "Hello, world");
///
/// buffer.undo().unwrap();
/// assert_eq!(buffer.document().full_text(), "Hello");
///
/// buffer.wait_for_parsing();
/// assert!(buffer.document().line(0).unwrap().description().is_some());
/// ```
pub struct TextBuffer {
    document: Document,
    pipeline: ParsingPipeline,
    history: UndoRedoManager,
    navigator: Navigator,
    config: BufferConfig,
}

impl std::fmt::Debug for TextBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextBuffer")
            .field("document", &self.document)
            .field("pipeline", &self.pipeline)
            .field("history", &self.history)
            .field("config", &self.config)
            .finish()
    }
}

impl TextBuffer {
    /// Create an empty buffer with the default configuration.
    pub fn new(tokenizer: Arc<dyn LineTokenizer>) -> Self {
        Self::with_config(tokenizer, BufferConfig::default())
    }

    /// Create an empty buffer.
    pub fn with_config(tokenizer: Arc<dyn LineTokenizer>, config: BufferConfig) -> Self {
        let document = Document::with_config(&config);
        let pipeline = ParsingPipeline::new(&document, tokenizer);
        let buffer = Self {
            document,
            pipeline,
            history: UndoRedoManager::new(&config),
            navigator: Navigator::default(),
            config,
        };
        buffer.schedule(0);
        buffer
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The undo/redo history.
    pub fn history(&self) -> &UndoRedoManager {
        &self.history
    }

    /// Active configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Caret navigator.
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Mutable caret navigator (e.g. to update the page height).
    pub fn navigator_mut(&mut self) -> &mut Navigator {
        &mut self.navigator
    }

    /// Schedule the line at `index` for tokenization.
    fn schedule(&self, index: usize) {
        let Some(line) = self.document.line(index) else {
            return;
        };
        if line.begin_context().is_some() {
            self.pipeline.enqueue(line);
        } else {
            self.pipeline.enqueue_with_assumption(line);
        }
    }

    /// Replace `range` with `text`, record the edit and reschedule tokenization.
    pub fn replace_content(&mut self, range: Range, text: &str) -> Result<EditResult, DocumentError> {
        let edit = self.document.replace_content(range, text)?;
        self.schedule(range.begin().line);
        self.history.record(edit.clone());
        Ok(edit)
    }

    /// Delete `range`, or the character before it when it is a point (joining lines at a line
    /// start). Returns `None` when there is nothing to delete.
    pub fn delete_backward(&mut self, range: Range) -> Result<Option<EditResult>, DocumentError> {
        let range = if range.is_point() {
            let begin = self.navigator.left(&self.document, range.begin());
            Range::safe_create(begin, range.begin())
        } else {
            range
        };
        self.delete(range)
    }

    /// Delete `range`, or the character after it when it is a point (joining lines at a line
    /// end). Returns `None` when there is nothing to delete.
    pub fn delete_forward(&mut self, range: Range) -> Result<Option<EditResult>, DocumentError> {
        let range = if range.is_point() {
            let end = self.navigator.right(&self.document, range.end());
            Range::safe_create(range.end(), end)
        } else {
            range
        };
        self.delete(range)
    }

    fn delete(&mut self, range: Range) -> Result<Option<EditResult>, DocumentError> {
        if range.is_point() {
            return Ok(None);
        }
        self.replace_content(range, "").map(Some)
    }

    /// Undo the most recent edit (or coalesced run).
    pub fn undo(&mut self) -> Result<Option<EditResult>, DocumentError> {
        let applied = self.history.undo(&mut self.document)?;
        if let Some(edit) = &applied {
            self.schedule(edit.inserted_range.begin().line);
        }
        Ok(applied)
    }

    /// Redo the most recently undone edit.
    pub fn redo(&mut self) -> Result<Option<EditResult>, DocumentError> {
        let applied = self.history.redo(&mut self.document)?;
        if let Some(edit) = &applied {
            self.schedule(edit.inserted_range.begin().line);
        }
        Ok(applied)
    }

    /// Replace the whole text. History is cleared and the document is reparsed from the top.
    pub fn set_text<I>(&mut self, lines: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        self.document.set_text(lines);
        self.history.clear();
        self.schedule(0);
    }

    /// Load line-oriented text. History is cleared and the document is reparsed from the top.
    pub fn read<R: BufRead>(&mut self, reader: R) -> Result<(), DocumentError> {
        self.document.read(reader)?;
        self.history.clear();
        self.schedule(0);
        Ok(())
    }

    /// Write the text, each line followed by `\n`.
    pub fn write<W: Write>(&self, writer: W) -> Result<(), DocumentError> {
        self.document.write(writer)
    }

    /// Reset to a single empty line and forget the history.
    pub fn clear(&mut self) {
        self.document.clear();
        self.history.clear();
        self.schedule(0);
    }

    /// Text addressed by `range`.
    pub fn get_text(&self, range: Range) -> Result<String, DocumentError> {
        self.document.get_text(range)
    }

    /// See [`brackets::find_pair`].
    pub fn find_pair(&self, caret: Position) -> Option<Range> {
        brackets::find_pair(&self.document, caret)
    }

    /// See [`brackets::find_bracket_pair`].
    pub fn find_bracket_pair(&self, caret: Position) -> Option<BracketPair> {
        brackets::find_bracket_pair(&self.document, caret)
    }

    /// Where a "go to matching bracket" command moves the caret.
    pub fn matching_bracket_target(&self, caret: Position) -> Option<Position> {
        brackets::matching_bracket(&self.document, caret)
    }

    /// Move `caret` one step; see [`Navigator::change_position`].
    pub fn move_caret(
        &self,
        caret: Position,
        direction: NavigateTo,
        scope: NavigateBy,
        saved_offset: Option<usize>,
    ) -> Position {
        self.navigator
            .change_position(&self.document, caret, direction, scope, saved_offset)
    }

    /// Register the observer notified whenever a line's lexical state changes.
    ///
    /// The observer runs on the foreground for edits and on the worker thread for parse
    /// results; it replaces any previous observer.
    pub fn subscribe<F>(&self, observer: F)
    where
        F: Fn(&LineChange) + Send + Sync + 'static,
    {
        self.document.set_observer(Some(Arc::new(observer)));
    }

    /// Remove the observer.
    pub fn unsubscribe(&self) {
        self.document.set_observer(None);
    }

    /// Number of lines waiting for the tokenizer.
    pub fn pending_lines(&self) -> usize {
        self.pipeline.pending()
    }

    /// Block until every scheduled line has been tokenized.
    pub fn wait_for_parsing(&self) {
        self.pipeline.wait_idle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{BracketFamily, LineContext, LineDescription, SegmentKind};
    use crate::line::LineChangeKind;
    use std::sync::Mutex;

    struct Words;

    impl LineTokenizer for Words {
        fn tokenize(&self, text: &str, begin: LineContext) -> LineDescription {
            let mut builder = LineDescription::builder(begin);
            let mut start = None;
            for (offset, c) in text.chars().chain(std::iter::once(' ')).enumerate() {
                match (start, c.is_alphanumeric()) {
                    (None, true) => start = Some(offset),
                    (Some(s), false) => {
                        builder.push(SegmentKind::Identifier, s, offset - 1);
                        start = None;
                    }
                    _ => {}
                }
                if let Some((family, open)) = BracketFamily::classify(c) {
                    builder.push(SegmentKind::Bracket { family, open }, offset, offset);
                }
            }
            builder.finish()
        }
    }

    fn buffer(lines: &[&str]) -> TextBuffer {
        let mut buffer = TextBuffer::new(Arc::new(Words));
        buffer.set_text(lines);
        buffer.wait_for_parsing();
        buffer
    }

    #[test]
    fn test_edits_are_reparsed() {
        let mut buffer = buffer(&["one two", "three"]);
        buffer
            .replace_content(Position::new(1, 5).to_empty_range(), " four")
            .unwrap();
        buffer.wait_for_parsing();
        let line = buffer.document().line(1).unwrap();
        assert_eq!(line.description().unwrap().segments().len(), 2);
    }

    #[test]
    fn test_delete_backward_and_forward() {
        let mut buffer = buffer(&["ab", "cd"]);
        let joined = buffer
            .delete_backward(Position::new(1, 0).to_empty_range())
            .unwrap()
            .unwrap();
        assert_eq!(joined.removed_text, "\n");
        assert_eq!(buffer.document().full_text(), "abcd");

        buffer
            .delete_forward(Position::new(0, 0).to_empty_range())
            .unwrap();
        assert_eq!(buffer.document().full_text(), "bcd");

        assert_eq!(
            buffer
                .delete_backward(Position::DOCUMENT_BEGIN.to_empty_range())
                .unwrap(),
            None
        );
        assert_eq!(
            buffer
                .delete_forward(Position::new(0, 3).to_empty_range())
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_undo_redo_restore_text_and_parse() {
        let mut buffer = buffer(&["alpha"]);
        buffer
            .replace_content(Position::new(0, 5).to_empty_range(), "\nbeta")
            .unwrap();
        buffer.undo().unwrap();
        assert_eq!(buffer.document().full_text(), "alpha");
        buffer.redo().unwrap();
        buffer.wait_for_parsing();
        assert_eq!(buffer.document().full_text(), "alpha\nbeta");
        assert!(buffer.document().line(1).unwrap().description().is_some());
    }

    #[test]
    fn test_set_text_clears_history() {
        let mut buffer = buffer(&["x"]);
        buffer
            .replace_content(Position::DOCUMENT_BEGIN.to_empty_range(), "y")
            .unwrap();
        assert!(buffer.history().can_undo());
        buffer.set_text(["fresh"]);
        assert!(!buffer.history().can_undo());
        assert_eq!(buffer.undo().unwrap(), None);

        buffer.clear();
        assert_eq!(buffer.document().full_text(), "");
    }

    #[test]
    fn test_matching_bracket_target() {
        let buffer = buffer(&["f(a) {", "}"]);
        assert_eq!(buffer.matching_bracket_target(Position::new(0, 1)), Some(Position::new(0, 3)));
        assert_eq!(buffer.matching_bracket_target(Position::new(1, 0)), Some(Position::new(0, 5)));
        assert_eq!(
            buffer.find_pair(Position::new(0, 5)),
            Some(Range::new(Position::new(0, 5), Position::new(1, 0)))
        );
    }

    #[test]
    fn test_subscribe_reports_parsed_lines() {
        let mut buffer = buffer(&["a"]);
        let parsed = Arc::new(Mutex::new(Vec::new()));
        let sink = parsed.clone();
        buffer.subscribe(move |change| {
            if change.kind == LineChangeKind::Parsed {
                sink.lock().unwrap().push(change.line);
            }
        });
        buffer
            .replace_content(Position::new(0, 1).to_empty_range(), "\nb")
            .unwrap();
        buffer.wait_for_parsing();
        assert_eq!(*parsed.lock().unwrap(), vec![0, 1]);

        buffer.unsubscribe();
    }

    #[test]
    fn test_read_write_round_trip() {
        let mut buffer = buffer(&[]);
        buffer.read("one\r\ntwo\n".as_bytes()).unwrap();
        let mut out = Vec::new();
        buffer.write(&mut out).unwrap();
        assert_eq!(out, b"one\ntwo\n");
    }
}
