//! Caret navigation.
//!
//! Unlike the line store, the navigator never fails: every result is clamped to a position
//! that exists in the document.

use crate::document::Document;
use crate::position::Position;

/// Default number of lines moved by a page step.
pub const DEFAULT_PAGE_HEIGHT: usize = 30;

/// Granularity of a caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigateBy {
    /// One character left/right, one line up/down.
    Symbol,
    /// Line begin/end left/right, one page up/down.
    Page,
    /// Document begin/end.
    Document,
}

/// Direction of a caret movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigateTo {
    /// Towards the beginning of the line.
    Left,
    /// Towards the end of the line.
    Right,
    /// Towards the first line.
    Up,
    /// Towards the last line.
    Down,
}

/// Computes caret targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    page_height: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_HEIGHT)
    }
}

impl Navigator {
    /// Create a navigator whose page steps move `page_height` lines.
    pub fn new(page_height: usize) -> Self {
        Self {
            page_height: page_height.max(1),
        }
    }

    /// Lines moved by a page step.
    pub fn page_height(&self) -> usize {
        self.page_height
    }

    /// Set the number of lines moved by a page step (at least 1).
    pub fn set_page_height(&mut self, page_height: usize) {
        self.page_height = page_height.max(1);
    }

    /// Clamp `position` to the nearest existing position.
    pub fn clamp(document: &Document, position: Position) -> Position {
        let line = position.line.min(document.line_count() - 1);
        let len = document.line(line).map_or(0, |l| l.len());
        Position::new(line, position.offset.min(len))
    }

    /// Move `position` one step.
    ///
    /// `saved_offset` is the column a vertical movement tries to keep (the offset the caret had
    /// before a run of up/down moves through shorter lines).
    pub fn change_position(
        &self,
        document: &Document,
        position: Position,
        direction: NavigateTo,
        scope: NavigateBy,
        saved_offset: Option<usize>,
    ) -> Position {
        let position = Self::clamp(document, position);
        match scope {
            NavigateBy::Symbol => self.by_symbol(document, position, direction, saved_offset),
            NavigateBy::Page => self.by_page(document, position, direction, saved_offset),
            NavigateBy::Document => match direction {
                NavigateTo::Left | NavigateTo::Up => Position::DOCUMENT_BEGIN,
                NavigateTo::Right | NavigateTo::Down => document.document_end(),
            },
        }
    }

    /// One character to the left, wrapping to the end of the previous line.
    pub fn left(&self, document: &Document, position: Position) -> Position {
        self.change_position(document, position, NavigateTo::Left, NavigateBy::Symbol, None)
    }

    /// One character to the right, wrapping to the beginning of the next line.
    pub fn right(&self, document: &Document, position: Position) -> Position {
        self.change_position(document, position, NavigateTo::Right, NavigateBy::Symbol, None)
    }

    fn by_symbol(
        &self,
        document: &Document,
        position: Position,
        direction: NavigateTo,
        saved_offset: Option<usize>,
    ) -> Position {
        let last_line = document.line_count() - 1;
        let target = match direction {
            NavigateTo::Left => {
                if position.offset > 0 {
                    return position.to_offset(position.offset - 1);
                }
                if position.line == 0 {
                    return position;
                }
                return eol(document, position.line - 1);
            }
            NavigateTo::Right => {
                if position != eol(document, position.line) {
                    return position.to_offset(position.offset + 1);
                }
                if position.line == last_line {
                    return position;
                }
                return Position::new(position.line + 1, 0);
            }
            NavigateTo::Up => {
                if position.line == 0 {
                    return Position::DOCUMENT_BEGIN;
                }
                Position::new(position.line - 1, position.offset)
            }
            NavigateTo::Down => {
                if position.line == last_line {
                    return document.document_end();
                }
                Position::new(position.line + 1, position.offset)
            }
        };
        adjust(document, target, saved_offset)
    }

    fn by_page(
        &self,
        document: &Document,
        position: Position,
        direction: NavigateTo,
        saved_offset: Option<usize>,
    ) -> Position {
        let last_line = document.line_count() - 1;
        let target = match direction {
            NavigateTo::Left => return position.to_begin_of_line(),
            NavigateTo::Right => return eol(document, position.line),
            NavigateTo::Up => {
                if position.line == 0 {
                    return Position::DOCUMENT_BEGIN;
                }
                Position::new(position.line.saturating_sub(self.page_height), position.offset)
            }
            NavigateTo::Down => {
                if position.line == last_line {
                    return document.document_end();
                }
                Position::new((position.line + self.page_height).min(last_line), position.offset)
            }
        };
        adjust(document, target, saved_offset)
    }
}

fn eol(document: &Document, line: usize) -> Position {
    document
        .end_of_line(Position::new(line, 0))
        .unwrap_or_else(|| document.document_end())
}

fn adjust(document: &Document, target: Position, saved_offset: Option<usize>) -> Position {
    let target = match saved_offset {
        Some(saved) if target.offset < saved => target.to_offset(saved),
        _ => target,
    };
    target.min(eol(document, target.line))
}
