//! Buffer configuration.

use std::time::Duration;

/// Default number of spaces a tab expands to.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Default window within which consecutive single-character edits are merged.
pub const DEFAULT_COALESCE_WINDOW: Duration = Duration::from_millis(300);

/// Default bound on the undo stack.
pub const DEFAULT_MAX_UNDO: usize = 1000;

/// Options shared by the line store and the history manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of spaces inserted in place of each `'\t'` on input.
    pub tab_width: usize,
    /// Time since the last merged edit after which a new undo entry is started.
    pub coalesce_window: Duration,
    /// Maximum number of undo entries kept; the oldest entries are dropped first.
    pub max_undo: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            coalesce_window: DEFAULT_COALESCE_WINDOW,
            max_undo: DEFAULT_MAX_UNDO,
        }
    }
}

impl BufferConfig {
    /// Override the tab width.
    pub fn with_tab_width(mut self, tab_width: usize) -> Self {
        self.tab_width = tab_width;
        self
    }

    /// Override the coalescing window.
    pub fn with_coalesce_window(mut self, window: Duration) -> Self {
        self.coalesce_window = window;
        self
    }

    /// Override the undo bound.
    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo;
        self
    }
}
