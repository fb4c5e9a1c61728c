//! Line records.
//!
//! A [`Line`] is shared between the foreground (which owns the document and edits text) and the
//! parsing worker (which only writes lexical state). Text and lexical state live behind one
//! mutex together with a revision counter; every text edit and every begin-context change bumps
//! the revision and drops the cached description, so a description computed against an older
//! revision can never be stored.

use crate::lexer::{LineContext, LineDescription};
use crate::position::{Position, Range};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What happened to a line's lexical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChangeKind {
    /// The description was dropped (text edit or begin-context change).
    Invalidated,
    /// A fresh description was stored.
    Parsed,
}

/// Notification sent to the line observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineChange {
    /// Index of the line at the time of the notification.
    pub line: usize,
    /// What happened.
    pub kind: LineChangeKind,
}

/// Callback invoked for every [`LineChange`]. Called from both the foreground and the worker
/// thread, never with a lock held.
pub type LineObserver = Arc<dyn Fn(&LineChange) + Send + Sync>;

#[derive(Debug)]
struct LineState {
    text: Arc<str>,
    len: usize,
    revision: u64,
    begin: Option<LineContext>,
    description: Option<Arc<LineDescription>>,
    detached: bool,
}

impl LineState {
    fn valid_description(&self) -> Option<&Arc<LineDescription>> {
        let description = self.description.as_ref()?;
        (Some(description.begin_context()) == self.begin).then_some(description)
    }

    fn invalidate(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.description = None;
    }
}

/// What the worker reads before tokenizing a line outside the lock.
#[derive(Debug, Clone)]
pub(crate) struct LineSnapshot {
    pub text: Arc<str>,
    pub revision: u64,
    pub begin: Option<LineContext>,
    pub parsed: bool,
    pub detached: bool,
}

/// A single line of the document.
#[derive(Debug)]
pub struct Line {
    index: AtomicUsize,
    state: Mutex<LineState>,
}

impl Line {
    pub(crate) fn new(text: String, index: usize) -> Self {
        let len = text.chars().count();
        Self {
            index: AtomicUsize::new(index),
            state: Mutex::new(LineState {
                text: text.into(),
                len,
                revision: 0,
                begin: None,
                description: None,
                detached: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached index of this line in its document.
    pub fn index(&self) -> usize {
        self.index.load(Ordering::Acquire)
    }

    pub(crate) fn set_index(&self, index: usize) {
        self.index.store(index, Ordering::Release);
    }

    /// Current text (without line terminator).
    pub fn text(&self) -> Arc<str> {
        self.lock().text.clone()
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.lock().len
    }

    /// Returns `true` if the line has no characters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whole-line range (`[line:0, line:len)`).
    pub fn range(&self) -> Range {
        let index = self.index();
        Range::new(Position::new(index, 0), Position::new(index, self.len()))
    }

    /// Begin context, or `None` while it is not yet known.
    pub fn begin_context(&self) -> Option<LineContext> {
        self.lock().begin
    }

    /// End context from the current description, if one is available.
    pub fn end_context(&self) -> Option<LineContext> {
        self.lock()
            .valid_description()
            .map(|description| description.end_context())
    }

    /// The parsed description, if it is valid for the current begin context.
    pub fn description(&self) -> Option<Arc<LineDescription>> {
        self.lock().valid_description().cloned()
    }

    /// Monotonic counter bumped by every change that invalidates lexical state.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    pub(crate) fn snapshot(&self) -> LineSnapshot {
        let state = self.lock();
        LineSnapshot {
            text: state.text.clone(),
            revision: state.revision,
            begin: state.begin,
            parsed: state.valid_description().is_some(),
            detached: state.detached,
        }
    }

    /// Mark a line that was removed from its document. Pending descriptions are refused.
    pub(crate) fn detach(&self) {
        let mut state = self.lock();
        state.detached = true;
        state.invalidate();
    }

    /// Returns `true` once the line has been removed from its document.
    pub fn is_detached(&self) -> bool {
        self.lock().detached
    }

    /// Replace the text. The begin context is kept; the description is dropped.
    pub(crate) fn set_text(&self, text: String) {
        let mut state = self.lock();
        state.len = text.chars().count();
        state.text = text.into();
        state.invalidate();
    }

    /// Store a description computed from the snapshot taken at `revision`.
    ///
    /// Returns `false` (and stores nothing) if the line changed in the meantime.
    pub(crate) fn store_description(&self, revision: u64, description: LineDescription) -> bool {
        let mut state = self.lock();
        if state.revision != revision || state.begin != Some(description.begin_context()) {
            return false;
        }
        state.description = Some(Arc::new(description));
        true
    }

    /// Set the begin context if it still equals `expected`.
    ///
    /// `Ok(true)` means the context changed (and the description was dropped), `Ok(false)` that
    /// it already had that value. `Err(observed)` reports the value found instead of `expected`.
    pub(crate) fn compare_and_set_begin_context(
        &self,
        expected: Option<LineContext>,
        context: LineContext,
    ) -> Result<bool, Option<LineContext>> {
        let mut state = self.lock();
        if state.begin != expected {
            return Err(state.begin);
        }
        if state.begin == Some(context) {
            return Ok(false);
        }
        state.begin = Some(context);
        state.invalidate();
        Ok(true)
    }
}
