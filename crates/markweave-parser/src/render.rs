//! Renderer capability interface.
//!
//! A [`Renderer`] receives one call per parsed construct. Every
//! operation is optional: the renderer lists the ones it implements in
//! [`Renderer::capabilities`], and the engine never calls the others.
//!
//! - A missing **block** operation drops the node and all of its children.
//! - A missing **span** operation, or one that returns `false`, makes the
//!   engine copy the span's source bytes through [`Renderer::normal_text`].
//!
//! The output handle is the associated [`Renderer::Node`] type. Simple
//! renderers use a byte buffer; renderers that build their own object
//! graph hand out references into it from [`Renderer::block_new`] and
//! [`Renderer::span_new`] and get them back in the matching free call.

use bitflags::bitflags;
use markweave_core::{AutolinkType, BlockKind, Extensions, ListFlags, SpanKind, TableFlags};

bitflags! {
    /// Operations a renderer implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u64 {
        // Block level
        const BLOCKCODE = 1 << 0;
        const BLOCKQUOTE = 1 << 1;
        const HEADER = 1 << 2;
        const HRULE = 1 << 3;
        const LIST = 1 << 4;
        const LISTITEM = 1 << 5;
        const PARAGRAPH = 1 << 6;
        const TABLE = 1 << 7;
        const TABLE_HEADER = 1 << 8;
        const TABLE_BODY = 1 << 9;
        const TABLE_ROW = 1 << 10;
        const TABLE_CELL = 1 << 11;
        const FOOTNOTES = 1 << 12;
        const FOOTNOTE_DEF = 1 << 13;
        const BLOCKHTML = 1 << 14;

        // Span level
        const AUTOLINK = 1 << 16;
        const CODESPAN = 1 << 17;
        const DOUBLE_EMPHASIS = 1 << 18;
        const EMPHASIS = 1 << 19;
        const UNDERLINE = 1 << 20;
        const HIGHLIGHT = 1 << 21;
        const QUOTE = 1 << 22;
        const IMAGE = 1 << 23;
        const LINEBREAK = 1 << 24;
        const LINK = 1 << 25;
        const TRIPLE_EMPHASIS = 1 << 26;
        const STRIKETHROUGH = 1 << 27;
        const SUPERSCRIPT = 1 << 28;
        const FOOTNOTE_REF = 1 << 29;
        const MATH = 1 << 30;
        const RAW_HTML = 1 << 31;

        // Low level and document
        const ENTITY = 1 << 32;
        const DOC_HEADER = 1 << 33;
        const DOC_FOOTER = 1 << 34;

        const BLOCK = (1 << 15) - 1;
        const SPAN = ((1 << 32) - 1) & !Self::BLOCK.bits() & !(1 << 15);
        const ANY_EMPHASIS = Self::EMPHASIS.bits()
            | Self::DOUBLE_EMPHASIS.bits()
            | Self::TRIPLE_EMPHASIS.bits();
    }
}

/// Shared context handed to every renderer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    /// Extensions in effect for this render
    pub extensions: Extensions,
    /// Nesting depth of the construct being emitted
    pub depth: usize,
    /// Whether this is an inline-only render
    pub inline_render: bool,
}

/// Rendering callbacks.
///
/// Only [`Renderer::normal_text`] is required; it is the one way the
/// engine can put bytes into an opaque node. Everything else has a
/// default that does nothing (block operations) or reports "not handled"
/// (span operations).
#[allow(unused_variables)]
pub trait Renderer {
    /// Output or node handle.
    type Node: Default;

    /// Operations this renderer implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    // -- block level ------------------------------------------------------

    /// Code block. `lang` is the first word of a fence's info string.
    fn blockcode(&self, ob: &mut Self::Node, text: &[u8], lang: Option<&[u8]>, ctx: &Context) {}

    fn blockquote(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    /// ATX or setext header, `level` in 1..=6.
    fn header(&self, ob: &mut Self::Node, content: &Self::Node, level: usize, ctx: &Context) {}

    fn hrule(&self, ob: &mut Self::Node, ctx: &Context) {}

    /// List. `start` is the number of the first item (1 for bullet lists).
    fn list(
        &self,
        ob: &mut Self::Node,
        content: &Self::Node,
        flags: ListFlags,
        start: u32,
        ctx: &Context,
    ) {
    }

    fn listitem(&self, ob: &mut Self::Node, content: &Self::Node, flags: ListFlags, ctx: &Context) {}

    fn paragraph(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    fn table(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    fn table_header(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    fn table_body(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    fn table_row(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    fn table_cell(&self, ob: &mut Self::Node, content: &Self::Node, flags: TableFlags, ctx: &Context) {}

    /// The footnote list, emitted once after the last top-level block.
    fn footnotes(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) {}

    /// One footnote definition; `num` is its first-use number.
    fn footnote_def(&self, ob: &mut Self::Node, content: &Self::Node, num: usize, ctx: &Context) {}

    fn blockhtml(&self, ob: &mut Self::Node, text: &[u8], ctx: &Context) {}

    // -- span level -------------------------------------------------------

    fn autolink(&self, ob: &mut Self::Node, link: &[u8], kind: AutolinkType, ctx: &Context) -> bool {
        false
    }

    fn codespan(&self, ob: &mut Self::Node, text: &[u8], ctx: &Context) -> bool {
        false
    }

    fn double_emphasis(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn emphasis(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn underline(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn highlight(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn quote(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    /// Image. `alt` is the raw bracket text.
    fn image(
        &self,
        ob: &mut Self::Node,
        link: &[u8],
        title: Option<&[u8]>,
        alt: &[u8],
        ctx: &Context,
    ) -> bool {
        false
    }

    fn linebreak(&self, ob: &mut Self::Node, ctx: &Context) -> bool {
        false
    }

    fn link(
        &self,
        ob: &mut Self::Node,
        content: &Self::Node,
        link: &[u8],
        title: Option<&[u8]>,
        ctx: &Context,
    ) -> bool {
        false
    }

    fn triple_emphasis(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn strikethrough(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn superscript(&self, ob: &mut Self::Node, content: &Self::Node, ctx: &Context) -> bool {
        false
    }

    fn footnote_ref(&self, ob: &mut Self::Node, num: usize, ctx: &Context) -> bool {
        false
    }

    /// Math span. `display` selects display mode over inline mode.
    fn math(&self, ob: &mut Self::Node, text: &[u8], display: bool, ctx: &Context) -> bool {
        false
    }

    fn raw_html(&self, ob: &mut Self::Node, text: &[u8], ctx: &Context) -> bool {
        false
    }

    // -- low level --------------------------------------------------------

    /// Character entity such as `&amp;` or `&#x2014;`.
    fn entity(&self, ob: &mut Self::Node, text: &[u8], ctx: &Context) {
        self.normal_text(ob, text, ctx)
    }

    /// Literal text.
    fn normal_text(&self, ob: &mut Self::Node, text: &[u8], ctx: &Context);

    // -- document ---------------------------------------------------------

    fn doc_header(&self, ob: &mut Self::Node, inline_render: bool, ctx: &Context) {}

    fn doc_footer(&self, ob: &mut Self::Node, inline_render: bool, ctx: &Context) {}

    // -- node lifecycle ---------------------------------------------------

    /// Fresh node for the content of a block construct.
    fn block_new(&self, kind: BlockKind, ctx: &Context) -> Self::Node {
        Self::Node::default()
    }

    /// Fresh node for the content of a span construct.
    fn span_new(&self, kind: SpanKind, ctx: &Context) -> Self::Node {
        Self::Node::default()
    }

    fn block_free(&self, node: Self::Node, kind: BlockKind, ctx: &Context) {}

    fn span_free(&self, node: Self::Node, kind: SpanKind, ctx: &Context) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Renderer for Plain {
        type Node = Vec<u8>;

        fn capabilities(&self) -> Capabilities {
            Capabilities::PARAGRAPH
        }

        fn normal_text(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
            ob.extend_from_slice(text);
        }
    }

    fn ctx() -> Context {
        Context {
            extensions: Extensions::empty(),
            depth: 0,
            inline_render: false,
        }
    }

    #[test]
    fn test_capability_groups() {
        assert!(Capabilities::BLOCK.contains(Capabilities::BLOCKHTML));
        assert!(!Capabilities::BLOCK.contains(Capabilities::AUTOLINK));
        assert!(Capabilities::SPAN.contains(Capabilities::AUTOLINK | Capabilities::RAW_HTML));
        assert!(!Capabilities::SPAN.contains(Capabilities::ENTITY));
        assert!(Capabilities::ANY_EMPHASIS.contains(Capabilities::TRIPLE_EMPHASIS));
    }

    #[test]
    fn test_defaults() {
        let r = Plain;
        let mut ob = Vec::new();
        let content = r.span_new(SpanKind::Emph1, &ctx());
        assert!(!r.emphasis(&mut ob, &content, &ctx()));
        r.entity(&mut ob, b"&amp;", &ctx());
        assert_eq!(ob, b"&amp;");
    }
}
