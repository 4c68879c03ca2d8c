//! Node kinds and metadata enums.
//!
//! Block and span constructs live in two separate tag spaces. They are
//! reported to renderers when the engine asks for a fresh node handle
//! and again when that handle is released.

use serde::{Deserialize, Serialize};

/// Kind of a block-level node.
///
/// The document itself has no kind: the caller's output handle plays
/// that part and is never allocated or released by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// A paragraph of inline content
    Paragraph,
    /// The list of rendered footnote definitions
    FootnoteList,
    /// A table
    Table,
    /// The body rows of a table
    TableBody,
    /// Reserved for code blocks; code text is passed raw and never
    /// gets a node of its own
    BlockCode,
    /// Block quote (> prefix)
    Blockquote,
    /// Ordered or unordered list
    List,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockKind::Paragraph => write!(f, "paragraph"),
            BlockKind::FootnoteList => write!(f, "footnote_list"),
            BlockKind::Table => write!(f, "table"),
            BlockKind::TableBody => write!(f, "table_body"),
            BlockKind::BlockCode => write!(f, "blockcode"),
            BlockKind::Blockquote => write!(f, "blockquote"),
            BlockKind::List => write!(f, "list"),
        }
    }
}

/// Kind of a span-level node.
///
/// Some entries (list items, table rows and cells, headers) are
/// structurally block-like but carry inline content, so their content
/// nodes are allocated from the span space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpanKind {
    /// Setext header (underlined with = or -)
    Header,
    /// Single emphasis
    Emph1,
    /// Double emphasis
    Emph2,
    /// Triple emphasis
    Emph3,
    /// "Quoted" text
    Quote,
    /// Link text
    Link,
    /// Superscript
    Superscript,
    /// List item content
    ListItem,
    /// ATX header (# prefix)
    AtxHeader,
    /// Table header row group
    TableHeader,
    /// Table row
    TableRow,
    /// Table cell
    TableCell,
    /// Footnote definition content
    FootnoteDef,
    /// ~~Strikethrough~~
    Strikethrough,
    /// Underline
    Underline,
    /// ==Highlight==
    Highlight,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpanKind::Header => write!(f, "header"),
            SpanKind::Emph1 => write!(f, "emph1"),
            SpanKind::Emph2 => write!(f, "emph2"),
            SpanKind::Emph3 => write!(f, "emph3"),
            SpanKind::Quote => write!(f, "quote"),
            SpanKind::Link => write!(f, "link"),
            SpanKind::Superscript => write!(f, "superscript"),
            SpanKind::ListItem => write!(f, "listitem"),
            SpanKind::AtxHeader => write!(f, "atxheader"),
            SpanKind::TableHeader => write!(f, "table_header"),
            SpanKind::TableRow => write!(f, "table_row"),
            SpanKind::TableCell => write!(f, "table_cell"),
            SpanKind::FootnoteDef => write!(f, "footnote_def"),
            SpanKind::Strikethrough => write!(f, "strikethrough"),
            SpanKind::Underline => write!(f, "underline"),
            SpanKind::Highlight => write!(f, "highlight"),
        }
    }
}

/// Type of an autolink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AutolinkType {
    /// URL with an explicit scheme (http, https, ftp, mailto, ...)
    Normal,
    /// E-mail address without an explicit mailto:
    Email,
}

impl std::fmt::Display for AutolinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutolinkType::Normal => write!(f, "normal"),
            AutolinkType::Email => write!(f, "email"),
        }
    }
}

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alignment {
    /// No alignment requested
    #[default]
    None,
    /// :---
    Left,
    /// ---:
    Right,
    /// :---:
    Center,
}

impl std::fmt::Display for Alignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Alignment::None => write!(f, "none"),
            Alignment::Left => write!(f, "left"),
            Alignment::Right => write!(f, "right"),
            Alignment::Center => write!(f, "center"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_kind_display() {
        assert_eq!(BlockKind::Paragraph.to_string(), "paragraph");
        assert_eq!(BlockKind::FootnoteList.to_string(), "footnote_list");
        assert_eq!(BlockKind::TableBody.to_string(), "table_body");
        assert_eq!(BlockKind::Blockquote.to_string(), "blockquote");
    }

    #[test]
    fn test_span_kind_display() {
        assert_eq!(SpanKind::Emph1.to_string(), "emph1");
        assert_eq!(SpanKind::AtxHeader.to_string(), "atxheader");
        assert_eq!(SpanKind::TableCell.to_string(), "table_cell");
        assert_eq!(SpanKind::FootnoteDef.to_string(), "footnote_def");
    }

    #[test]
    fn test_autolink_display() {
        assert_eq!(AutolinkType::Normal.to_string(), "normal");
        assert_eq!(AutolinkType::Email.to_string(), "email");
    }

    #[test]
    fn test_alignment_default() {
        assert_eq!(Alignment::default(), Alignment::None);
        assert_eq!(Alignment::Center.to_string(), "center");
    }
}
