#![warn(missing_docs)]
//! Buffer Core - headless text-buffer engine for code editors
//!
//! # Overview
//!
//! `buffer-core` stores an editable multi-line document, keeps a per-line lexical description
//! up to date on a background worker, matches brackets across arbitrarily long spans, and
//! maintains an undo/redo history that coalesces typing runs. Rendering, input mapping and
//! file dialogs are left to the host.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  TextBuffer facade                          │  ← Public API
//! ├──────────────────────┬──────────────────────┤
//! │  UndoRedoManager     │  Bracket matcher     │  ← Editing services
//! ├──────────────────────┴──────────────────────┤
//! │  ParsingPipeline (one worker thread)        │  ← Incremental tokenization
//! ├─────────────────────────────────────────────┤
//! │  LineTokenizer seam (LineDescription)       │  ← Language plug-in
//! ├─────────────────────────────────────────────┤
//! │  Document (Vec of shared Line records)      │  ← Line store
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use buffer_core::{
//!     BracketFamily, LineContext, LineDescription, LineTokenizer, Position, Range, SegmentKind,
//!     TextBuffer,
//! };
//! use std::sync::Arc;
//!
//! /// Recognizes brackets only.
//! struct Brackets;
//!
//! impl LineTokenizer for Brackets {
//!     fn tokenize(&self, text: &str, begin: LineContext) -> LineDescription {
//!         let mut builder = LineDescription::builder(begin);
//!         for (offset, c) in text.chars().enumerate() {
//!             if let Some((family, open)) = BracketFamily::classify(c) {
//!                 builder.push(SegmentKind::Bracket { family, open }, offset, offset);
//!             }
//!         }
//!         builder.finish()
//!     }
//! }
//!
//! let mut buffer = TextBuffer::new(Arc::new(Brackets));
//! buffer.set_text(["fn main() {", "    run();", "}"]);
//! buffer.wait_for_parsing();
//!
//! assert_eq!(
//!     buffer.find_pair(Position::new(0, 10)),
//!     Some(Range::new(Position::new(0, 10), Position::new(2, 0)))
//! );
//! ```
//!
//! # Module Description
//!
//! - [`position`] - Positions and ranges
//! - [`document`] - Line store and edits
//! - [`line`] - Shared line records and change notifications
//! - [`lexer`] - Segments, contexts, bracket aggregates and the tokenizer trait
//! - [`pipeline`] - Background incremental tokenization
//! - [`brackets`] - Bracket matching
//! - [`history`] - Undo/redo with coalescing
//! - [`navigator`] - Caret movement
//! - [`buffer`] - The `TextBuffer` facade
//!
//! # Coordinates
//!
//! Offsets count Unicode scalar values (`char`s) within a line. Lines never contain `\n`;
//! `\r\n` input is normalized and tabs are expanded to spaces when text enters the document.

pub mod brackets;
pub mod buffer;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod lexer;
pub mod line;
pub mod navigator;
pub mod pipeline;
pub mod position;
mod text;

pub use brackets::{BracketPair, find_bracket_pair, find_pair, matching_bracket};
pub use buffer::TextBuffer;
pub use config::{BufferConfig, DEFAULT_COALESCE_WINDOW, DEFAULT_MAX_UNDO, DEFAULT_TAB_WIDTH};
pub use document::{Document, EditResult};
pub use error::DocumentError;
pub use history::UndoRedoManager;
pub use lexer::{
    BracketAggregates, BracketBalance, BracketFamily, DescriptionBuilder, LineContext,
    LineDescription, LineTokenizer, Segment, SegmentBuffer, SegmentKind,
};
pub use line::{Line, LineChange, LineChangeKind, LineObserver};
pub use navigator::{DEFAULT_PAGE_HEIGHT, NavigateBy, NavigateTo, Navigator};
pub use pipeline::ParsingPipeline;
pub use position::{Position, Range};
