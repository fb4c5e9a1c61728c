use thiserror::Error;

use crate::position::Position;

#[derive(Debug, Error)]
/// Errors produced by the line store.
///
/// Each variant describes a request that addresses text which does not exist. The store never
/// clamps such requests; clamping is the navigator's job.
pub enum DocumentError {
    #[error("line {line} is out of bounds (document has {line_count} lines)")]
    /// A line index past the last line.
    LineOutOfBounds {
        /// Requested line index.
        line: usize,
        /// Current number of lines.
        line_count: usize,
    },

    #[error("offset {} is beyond the end of line {} (length {line_len})", .position.offset, .position.line)]
    /// An offset past the end of its line.
    OffsetOutOfBounds {
        /// Requested position.
        position: Position,
        /// Length of the addressed line in characters.
        line_len: usize,
    },

    #[error("I/O error: {0}")]
    /// Reading or writing line-oriented text failed.
    Io(#[from] std::io::Error),
}
