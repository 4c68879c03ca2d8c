//! Markweave Core
//!
//! This crate provides the types shared by every markweave crate:
//! the node kinds reported to renderers, the extension and metadata
//! flag sets, and the workspace error type.
//!
//! # Overview
//!
//! The core crate contains:
//! - [`BlockKind`], [`SpanKind`] - Node kinds for the renderer node lifecycle
//! - [`AutolinkType`], [`Alignment`] - Metadata passed alongside nodes
//! - [`Extensions`], [`ListFlags`], [`TableFlags`] - Flag sets
//! - [`Error`] - Error types

pub mod enums;
pub mod error;
pub mod flags;

pub use enums::{Alignment, AutolinkType, BlockKind, SpanKind};
pub use error::{Error, Result};
pub use flags::{Extensions, ListFlags, TableFlags};
