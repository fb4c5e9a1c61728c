//! Undo/redo history with run coalescing.
//!
//! Every applied edit is recorded as an [`EditResult`]. Undoing an entry means replacing its
//! inserted range with its removed text, which itself produces the inverse [`EditResult`] for
//! the redo stack (and vice versa).
//!
//! Consecutive single-character edits are merged into one entry while they arrive within the
//! coalescing window of each other:
//!
//! - typing: single-character insertions where each one starts where the previous one ended;
//! - forward delete: single-character deletions at the same point;
//! - backspace: single-character deletions one offset to the left on the same line.
//!
//! Deleting a line break never coalesces.

use crate::config::{BufferConfig, DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_UNDO};
use crate::document::{Document, EditResult};
use crate::error::DocumentError;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone)]
struct UndoEntry {
    /// What undo will revert (the fusion of the whole run).
    joined: EditResult,
    /// The most recent raw edit of the run.
    last: EditResult,
    /// When the run was last extended; `None` for entries restored by redo.
    modified_at: Option<Instant>,
}

impl UndoEntry {
    fn new(item: EditResult, modified_at: Option<Instant>) -> Self {
        Self {
            joined: item.clone(),
            last: item,
            modified_at,
        }
    }

    fn try_join(&mut self, item: &EditResult, now: Instant, window: Duration) -> bool {
        let Some(modified_at) = self.modified_at else {
            return false;
        };
        if now.duration_since(modified_at) > window {
            return false;
        }
        if !(self.try_join_typing(item) || self.try_join_deletion(item)) {
            return false;
        }
        self.last = item.clone();
        self.modified_at = Some(now);
        true
    }

    fn try_join_typing(&mut self, item: &EditResult) -> bool {
        if !is_single_symbol_insertion(&self.last) || !is_single_symbol_insertion(item) {
            return false;
        }
        if self.last.inserted_range.end() != item.inserted_range.begin() {
            return false;
        }
        self.joined = EditResult::new(
            self.joined.inserted_range.merge(item.inserted_range.end()),
            String::new(),
        );
        true
    }

    fn try_join_deletion(&mut self, item: &EditResult) -> bool {
        if !is_single_symbol_deletion(&self.last) || !is_single_symbol_deletion(item) {
            return false;
        }
        let last = self.last.inserted_range;
        let new = item.inserted_range;
        if last == new {
            self.joined.removed_text.push_str(&item.removed_text);
            return true;
        }
        if !last.begin().same_line_as(new.begin())
            || last.begin().offset.checked_sub(new.begin().offset) != Some(1)
        {
            return false;
        }
        self.joined = EditResult::new(new, format!("{}{}", item.removed_text, self.joined.removed_text));
        true
    }
}

fn is_single_symbol_insertion(item: &EditResult) -> bool {
    item.removed_text.is_empty() && item.inserted_range.is_single_symbol()
}

fn is_single_symbol_deletion(item: &EditResult) -> bool {
    let mut chars = item.removed_text.chars();
    let single = matches!((chars.next(), chars.next()), (Some(c), None) if c != '\n');
    single && item.inserted_range.is_point()
}

/// Bounded undo/redo stacks of [`EditResult`]s.
#[derive(Debug, Clone)]
pub struct UndoRedoManager {
    undo_stack: VecDeque<UndoEntry>,
    redo_stack: Vec<EditResult>,
    max_undo: usize,
    coalesce_window: Duration,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_UNDO, DEFAULT_COALESCE_WINDOW)
    }
}

impl UndoRedoManager {
    /// Create a manager using the limits from `config`.
    pub fn new(config: &BufferConfig) -> Self {
        Self::with_limits(config.max_undo, config.coalesce_window)
    }

    /// Create a manager keeping at most `max_undo` entries and merging edits that arrive within
    /// `coalesce_window` of each other.
    pub fn with_limits(max_undo: usize, coalesce_window: Duration) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            coalesce_window,
        }
    }

    /// Record an edit the user just performed.
    pub fn record(&mut self, item: EditResult) {
        self.record_at(item, Instant::now());
    }

    /// Record an edit performed at `now`.
    ///
    /// Clears the redo stack, then either extends the most recent run or starts a new entry.
    pub fn record_at(&mut self, item: EditResult, now: Instant) {
        self.redo_stack.clear();

        if let Some(top) = self.undo_stack.back_mut()
            && top.try_join(&item, now, self.coalesce_window)
        {
            trace!(range = %top.joined.inserted_range, "edit coalesced");
            return;
        }
        self.push_undo(UndoEntry::new(item, Some(now)));
    }

    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push_back(entry);
        while self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
        }
    }

    /// Revert the most recent entry.
    ///
    /// Returns the edit that was applied to `document` (now on the redo stack), or `None` if
    /// there is nothing to undo. If the document rejects the edit, the entry stays on the undo
    /// stack.
    pub fn undo(&mut self, document: &mut Document) -> Result<Option<EditResult>, DocumentError> {
        let Some(entry) = self.undo_stack.pop_back() else {
            return Ok(None);
        };
        let applied = match document
            .replace_content(entry.joined.inserted_range, &entry.joined.removed_text)
        {
            Ok(applied) => applied,
            Err(err) => {
                self.undo_stack.push_back(entry);
                return Err(err);
            }
        };
        self.redo_stack.push(applied.clone());
        Ok(Some(applied))
    }

    /// Re-apply the most recently undone entry.
    ///
    /// Returns the edit that was applied to `document` (now on the undo stack), or `None` if
    /// there is nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> Result<Option<EditResult>, DocumentError> {
        let Some(item) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let applied = match document.replace_content(item.inserted_range, &item.removed_text) {
            Ok(applied) => applied,
            Err(err) => {
                self.redo_stack.push(item);
                return Err(err);
            }
        };
        self.push_undo(UndoEntry::new(applied.clone(), None));
        Ok(Some(applied))
    }

    /// Drop both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Whether there is anything to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether there is anything to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undo entries.
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of redo entries.
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }
}
