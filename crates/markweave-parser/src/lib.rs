//! Markweave Parser
//!
//! A Markdown engine in the hoedown tradition: a reference pre-pass, a
//! block parser and a span parser that drive a pluggable [`Renderer`].
//!
//! # Overview
//!
//! Rendering goes through three stages:
//! - [`refs::collect`] lifts link reference and footnote definitions out
//!   of the input and normalizes tabs and line endings.
//! - The block parser splits the text into headers, paragraphs, lists,
//!   quotes, code, tables and raw HTML, recursing into containers up to
//!   the nesting bound.
//! - The span parser handles emphasis, links, code spans, autolinks and
//!   the other inline constructs inside each block.
//!
//! Renderers only implement the operations they care about and declare
//! them through [`Renderer::capabilities`]; the engine falls back to
//! literal text for the rest.
//!
//! # Example
//!
//! ```
//! use markweave_core::Extensions;
//! use markweave_parser::{Capabilities, Context, Document, Renderer};
//!
//! /// Keeps only the text of emphasized spans.
//! struct Shout;
//!
//! impl Renderer for Shout {
//!     type Node = Vec<u8>;
//!
//!     fn capabilities(&self) -> Capabilities {
//!         Capabilities::PARAGRAPH | Capabilities::EMPHASIS
//!     }
//!
//!     fn paragraph(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
//!         ob.extend_from_slice(content);
//!     }
//!
//!     fn emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
//!         ob.extend(content.iter().map(u8::to_ascii_uppercase));
//!         true
//!     }
//!
//!     fn normal_text(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
//!         ob.extend_from_slice(text);
//!     }
//! }
//!
//! let doc = Document::with_defaults(&Shout, Extensions::empty());
//! let mut out = Vec::new();
//! doc.render(&mut out, b"say *hello* **there**");
//! assert_eq!(out, b"say HELLO **there**");
//! ```

pub mod autolink;
mod block;
pub mod chars;
pub mod document;
mod inline;
pub mod refs;
pub mod render;

pub use chars::{ActiveChar, ActiveChars};
pub use document::{Document, DEFAULT_MAX_NESTING};
pub use markweave_core::{
    Alignment, AutolinkType, BlockKind, Error, Extensions, ListFlags, Result, SpanKind, TableFlags,
};
pub use render::{Capabilities, Context, Renderer};
