//! The parsing engine.
//!
//! A [`Document`] binds a renderer, an extension set and a nesting bound.
//! It is immutable once built: every call to [`Document::render`] or
//! [`Document::render_inline`] creates its own [`Parser`] holding the
//! reference tables and footnote numbering for that call only.

use markweave_core::{BlockKind, Error, Extensions, Result, SpanKind};

use crate::block::BlockRun;
use crate::chars::ActiveChars;
use crate::inline::SpanRun;
use crate::refs::{self, FootnoteUsage, Footnotes, LinkRefs};
use crate::render::{Capabilities, Context, Renderer};

/// Nesting bound used by [`Document::with_defaults`].
pub const DEFAULT_MAX_NESTING: usize = 16;

/// A configured Markdown engine.
///
/// # Example
///
/// ```
/// use markweave_core::Extensions;
/// use markweave_parser::{Context, Document, Renderer};
///
/// struct Text;
///
/// impl Renderer for Text {
///     type Node = Vec<u8>;
///
///     fn paragraph(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
///         ob.extend_from_slice(content);
///         ob.push(b'\n');
///     }
///
///     fn normal_text(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
///         ob.extend_from_slice(text);
///     }
/// }
///
/// let doc = Document::new(&Text, Extensions::empty(), 16).unwrap();
/// let mut out = Vec::new();
/// doc.render(&mut out, b"Hello\n\nworld");
/// assert_eq!(out, b"Hello\nworld\n");
/// ```
#[derive(Debug)]
pub struct Document<'r, R: Renderer> {
    renderer: &'r R,
    extensions: Extensions,
    max_nesting: usize,
    caps: Capabilities,
    chars: ActiveChars,
}

impl<'r, R: Renderer> Document<'r, R> {
    /// Build an engine. Fails when `max_nesting` is 0.
    pub fn new(renderer: &'r R, extensions: Extensions, max_nesting: usize) -> Result<Self> {
        if max_nesting == 0 {
            return Err(Error::InvalidNesting);
        }
        let caps = renderer.capabilities();
        log::debug!(
            "document: extensions {:?}, max nesting {}, capabilities {:?}",
            extensions.names(),
            max_nesting,
            caps
        );
        Ok(Self {
            renderer,
            extensions,
            max_nesting,
            caps,
            chars: ActiveChars::new(extensions, caps),
        })
    }

    /// Build an engine with [`DEFAULT_MAX_NESTING`].
    pub fn with_defaults(renderer: &'r R, extensions: Extensions) -> Self {
        let caps = renderer.capabilities();
        Self {
            renderer,
            extensions,
            max_nesting: DEFAULT_MAX_NESTING,
            caps,
            chars: ActiveChars::new(extensions, caps),
        }
    }

    pub fn extensions(&self) -> Extensions {
        self.extensions
    }

    pub fn max_nesting(&self) -> usize {
        self.max_nesting
    }

    pub fn renderer(&self) -> &'r R {
        self.renderer
    }

    /// Render a complete document into `ob`.
    pub fn render(&self, ob: &mut R::Node, input: &[u8]) {
        let collected = refs::collect(refs::strip_bom(input), self.extensions);
        log::debug!(
            "render: {} bytes, {} link refs, {} footnotes",
            collected.text.len(),
            collected.links.len(),
            collected.footnotes.len()
        );

        let mut parser = Parser::new(self, &collected.links, &collected.footnotes, false);
        parser.doc_header(ob);
        parser.parse_block(ob, &collected.text, 0);
        parser.render_footnotes(ob);
        parser.doc_footer(ob);
    }

    /// Render `input` as a single run of inline content, without block
    /// structure, reference definitions or a footnote list.
    pub fn render_inline(&self, ob: &mut R::Node, input: &[u8]) {
        let text = refs::normalize_newlines(refs::strip_bom(input));
        let links = LinkRefs::default();
        let footnotes = Footnotes::default();

        let mut parser = Parser::new(self, &links, &footnotes, true);
        parser.doc_header(ob);
        parser.parse_inline(ob, &text, 0);
        parser.doc_footer(ob);
    }
}

/// Parse state for one render call.
pub(crate) struct Parser<'p, R: Renderer> {
    pub(crate) r: &'p R,
    pub(crate) caps: Capabilities,
    pub(crate) chars: &'p ActiveChars,
    pub(crate) extensions: Extensions,
    pub(crate) max_nesting: usize,
    pub(crate) inline_render: bool,
    pub(crate) links: &'p LinkRefs<'p>,
    pub(crate) footnotes: &'p Footnotes,
    pub(crate) usage: FootnoteUsage,
    /// Set while parsing link text; suppresses bare autolinks
    pub(crate) in_link_body: bool,
    /// One entry per block sequence being parsed, innermost last
    pub(crate) blocks: Vec<BlockRun>,
    /// One entry per span run being parsed, innermost last
    pub(crate) runs: Vec<SpanRun>,
}

impl<'p, R: Renderer> Parser<'p, R> {
    fn new(
        doc: &'p Document<'_, R>,
        links: &'p LinkRefs<'p>,
        footnotes: &'p Footnotes,
        inline_render: bool,
    ) -> Self {
        Self {
            r: doc.renderer,
            caps: doc.caps,
            chars: &doc.chars,
            extensions: doc.extensions,
            max_nesting: doc.max_nesting,
            inline_render,
            links,
            footnotes,
            usage: FootnoteUsage::default(),
            in_link_body: false,
            blocks: Vec::new(),
            runs: Vec::new(),
        }
    }

    pub(crate) fn ctx(&self, depth: usize) -> Context {
        Context {
            extensions: self.extensions,
            depth,
            inline_render: self.inline_render,
        }
    }

    #[inline]
    pub(crate) fn has(&self, cap: Capabilities) -> bool {
        self.caps.contains(cap)
    }

    pub(crate) fn text(&self, ob: &mut R::Node, text: &[u8], depth: usize) {
        self.r.normal_text(ob, text, &self.ctx(depth));
    }

    pub(crate) fn new_block(&self, kind: BlockKind, depth: usize) -> R::Node {
        self.r.block_new(kind, &self.ctx(depth))
    }

    pub(crate) fn free_block(&self, node: R::Node, kind: BlockKind, depth: usize) {
        self.r.block_free(node, kind, &self.ctx(depth));
    }

    pub(crate) fn new_span(&self, kind: SpanKind, depth: usize) -> R::Node {
        self.r.span_new(kind, &self.ctx(depth))
    }

    pub(crate) fn free_span(&self, node: R::Node, kind: SpanKind, depth: usize) {
        self.r.span_free(node, kind, &self.ctx(depth));
    }

    fn doc_header(&self, ob: &mut R::Node) {
        if self.has(Capabilities::DOC_HEADER) {
            self.r.doc_header(ob, self.inline_render, &self.ctx(0));
        }
    }

    fn doc_footer(&self, ob: &mut R::Node) {
        if self.has(Capabilities::DOC_FOOTER) {
            self.r.doc_footer(ob, self.inline_render, &self.ctx(0));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_core::{AutolinkType, ListFlags, TableFlags};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    /// Writes a compact bracketed trace of every call.
    #[derive(Default)]
    struct Trace {
        caps: Option<Capabilities>,
        frees: RefCell<usize>,
        news: RefCell<usize>,
    }

    fn put(ob: &mut Vec<u8>, s: &str) {
        ob.extend_from_slice(s.as_bytes());
    }

    fn wrap(ob: &mut Vec<u8>, tag: &str, content: &[u8]) {
        put(ob, &format!("{}(", tag));
        ob.extend_from_slice(content);
        put(ob, ")");
    }

    impl Renderer for Trace {
        type Node = Vec<u8>;

        fn capabilities(&self) -> Capabilities {
            self.caps.unwrap_or(Capabilities::all())
        }

        fn blockcode(&self, ob: &mut Vec<u8>, text: &[u8], lang: Option<&[u8]>, _ctx: &Context) {
            let lang = lang.map(|l| String::from_utf8_lossy(l).into_owned());
            wrap(ob, &format!("code[{}]", lang.unwrap_or_default()), text);
        }

        fn blockquote(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "quote", content);
        }

        fn header(&self, ob: &mut Vec<u8>, content: &Vec<u8>, level: usize, _ctx: &Context) {
            wrap(ob, &format!("h{}", level), content);
        }

        fn hrule(&self, ob: &mut Vec<u8>, _ctx: &Context) {
            put(ob, "hr");
        }

        fn list(&self, ob: &mut Vec<u8>, content: &Vec<u8>, flags: ListFlags, start: u32, _ctx: &Context) {
            let tag = if flags.contains(ListFlags::ORDERED) {
                format!("ol{}", start)
            } else {
                "ul".to_string()
            };
            wrap(ob, &tag, content);
        }

        fn listitem(&self, ob: &mut Vec<u8>, content: &Vec<u8>, flags: ListFlags, _ctx: &Context) {
            let tag = if flags.contains(ListFlags::BLOCK) { "LI" } else { "li" };
            wrap(ob, tag, content);
        }

        fn paragraph(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "p", content);
        }

        fn table(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "table", content);
        }

        fn table_header(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "thead", content);
        }

        fn table_body(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "tbody", content);
        }

        fn table_row(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "tr", content);
        }

        fn table_cell(&self, ob: &mut Vec<u8>, content: &Vec<u8>, flags: TableFlags, _ctx: &Context) {
            let tag = if flags.is_header() { "th" } else { "td" };
            wrap(ob, &format!("{}:{}", tag, flags.alignment()), content);
        }

        fn footnotes(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
            wrap(ob, "notes", content);
        }

        fn footnote_def(&self, ob: &mut Vec<u8>, content: &Vec<u8>, num: usize, _ctx: &Context) {
            wrap(ob, &format!("fn{}", num), content);
        }

        fn blockhtml(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
            wrap(ob, "html", text);
        }

        fn autolink(&self, ob: &mut Vec<u8>, link: &[u8], kind: AutolinkType, _ctx: &Context) -> bool {
            wrap(ob, &format!("auto:{}", kind), link);
            true
        }

        fn codespan(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) -> bool {
            wrap(ob, "code", text);
            true
        }

        fn double_emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
            wrap(ob, "strong", content);
            true
        }

        fn emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
            wrap(ob, "em", content);
            true
        }

        fn triple_emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
            wrap(ob, "em3", content);
            true
        }

        fn linebreak(&self, ob: &mut Vec<u8>, _ctx: &Context) -> bool {
            put(ob, "br");
            true
        }

        fn link(
            &self,
            ob: &mut Vec<u8>,
            content: &Vec<u8>,
            link: &[u8],
            title: Option<&[u8]>,
            _ctx: &Context,
        ) -> bool {
            put(ob, "a[");
            ob.extend_from_slice(link);
            if let Some(title) = title {
                put(ob, "|");
                ob.extend_from_slice(title);
            }
            wrap(ob, "]", content);
            true
        }

        fn image(
            &self,
            ob: &mut Vec<u8>,
            link: &[u8],
            _title: Option<&[u8]>,
            alt: &[u8],
            _ctx: &Context,
        ) -> bool {
            put(ob, "img[");
            ob.extend_from_slice(link);
            wrap(ob, "]", alt);
            true
        }

        fn footnote_ref(&self, ob: &mut Vec<u8>, num: usize, _ctx: &Context) -> bool {
            put(ob, &format!("ref{}", num));
            true
        }

        fn math(&self, ob: &mut Vec<u8>, text: &[u8], display: bool, _ctx: &Context) -> bool {
            wrap(ob, if display { "dmath" } else { "math" }, text);
            true
        }

        fn strikethrough(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
            wrap(ob, "del", content);
            true
        }

        fn raw_html(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) -> bool {
            wrap(ob, "raw", text);
            true
        }

        fn normal_text(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
            ob.extend_from_slice(text);
        }

        fn block_new(&self, _kind: BlockKind, _ctx: &Context) -> Vec<u8> {
            *self.news.borrow_mut() += 1;
            Vec::new()
        }

        fn span_new(&self, _kind: SpanKind, _ctx: &Context) -> Vec<u8> {
            *self.news.borrow_mut() += 1;
            Vec::new()
        }

        fn block_free(&self, _node: Vec<u8>, _kind: BlockKind, _ctx: &Context) {
            *self.frees.borrow_mut() += 1;
        }

        fn span_free(&self, _node: Vec<u8>, _kind: SpanKind, _ctx: &Context) {
            *self.frees.borrow_mut() += 1;
        }
    }

    fn render_with(ext: Extensions, input: &str) -> String {
        let trace = Trace::default();
        let doc = Document::new(&trace, ext, DEFAULT_MAX_NESTING).unwrap();
        let mut out = Vec::new();
        doc.render(&mut out, input.as_bytes());
        String::from_utf8(out).unwrap()
    }

    fn render(input: &str) -> String {
        render_with(Extensions::empty(), input)
    }

    #[test]
    fn test_zero_nesting_rejected() {
        let trace = Trace::default();
        assert!(matches!(
            Document::new(&trace, Extensions::empty(), 0),
            Err(Error::InvalidNesting)
        ));
        let doc = Document::with_defaults(&trace, Extensions::TABLES);
        assert_eq!(doc.max_nesting(), DEFAULT_MAX_NESTING);
        assert_eq!(doc.extensions(), Extensions::TABLES);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
        assert_eq!(render("\n\n  \n"), "");
    }

    #[test]
    fn test_paragraphs() {
        assert_eq!(render("a\nb\n\nc"), "p(a\nb)p(c)");
    }

    #[test]
    fn test_headers() {
        assert_eq!(render("# One #\n## Two"), "h1(One)h2(Two)");
        assert_eq!(render("Title\n====="), "h1(Title)");
        assert_eq!(render("a\nTitle\n---"), "p(a)h2(Title)");
        assert_eq!(render("# C#"), "h1(C#)");
    }

    #[test]
    fn test_hrule_and_code() {
        assert_eq!(render("* * *"), "hr");
        assert_eq!(render("    let x;\n\n    y\n"), "code[](let x;\n\ny\n)");
    }

    #[test]
    fn test_fenced_code() {
        assert_eq!(
            render_with(Extensions::FENCED_CODE, "```rust\nfn main() {}\n```\nafter"),
            "code[rust](fn main() {}\n)p(after)"
        );
        assert_eq!(
            render_with(Extensions::FENCED_CODE, "~~~\nunterminated"),
            "code[](unterminated\n)"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(render("> a\n> b\n\nc"), "quote(p(a\nb))p(c)");
        assert_eq!(render("> a\nlazy"), "quote(p(a\nlazy))");
    }

    #[test]
    fn test_lists() {
        assert_eq!(render("- a\n- b"), "ul(li(a)li(b))");
        assert_eq!(render("3. a\n4. b"), "ol3(li(a)li(b))");
        assert_eq!(render("- a\n\n- b"), "ul(LI(p(a))LI(p(b)))");
        assert_eq!(render("- a\n  - b\n- c"), "ul(li(aul(li(b)))li(c))");
    }

    #[test]
    fn test_list_interrupts_paragraph() {
        assert_eq!(render("text\n- item"), "p(text)ul(li(item))");
    }

    #[test]
    fn test_table() {
        let out = render_with(Extensions::TABLES, "a | b\n:--|--:\n1 | 2\n");
        assert_eq!(
            out,
            "table(thead(tr(th:left(a)th:right(b)))tbody(tr(td:left(1)td:right(2))))"
        );
    }

    #[test]
    fn test_table_needs_extension() {
        assert_eq!(render("a | b\n--|--\n"), "p(a | b\n--|--)");
    }

    #[test]
    fn test_emphasis() {
        assert_eq!(render("*a* **b** ***c***"), "p(em(a) strong(b) em3(c))");
        assert_eq!(render("***a**b*"), "p(em(strong(a)b))");
        assert_eq!(render("***a*b**"), "p(strong(em(a)b))");
        assert_eq!(render("*a **b** c*"), "p(em(a strong(b) c))");
        assert_eq!(render("* not"), "ul(li(not))");
        assert_eq!(render("a * b"), "p(a * b)");
    }

    #[test]
    fn test_intra_emphasis() {
        assert_eq!(
            render_with(Extensions::NO_INTRA_EMPHASIS, "snake_case_name and _x_"),
            "p(snake_case_name and em(x))"
        );
        assert_eq!(render("snake_case_name"), "p(snakeem(case)name)");
    }

    #[test]
    fn test_links() {
        assert_eq!(
            render("[a](http://x.y \"T\")"),
            "p(a[http://x.y|T](a))"
        );
        assert_eq!(render("[a]\n\n[a]: /u"), "p(a[/u](a))");
        assert_eq!(render("[t][ref]\n\n[REF]: /r 'x'"), "p(a[/r|x](t))");
        assert_eq!(render("[missing]"), "p([missing])");
        assert_eq!(render("![alt *x*](/i.png)"), "p(img[/i.png](alt *x*))");
        assert_eq!(render("[a(b)](/p(q))"), "p(a[/p(q)](a(b)))");
    }

    #[test]
    fn test_autolinks() {
        let ext = Extensions::AUTOLINK;
        assert_eq!(
            render_with(ext, "see http://example.com."),
            "p(see auto:normal(http://example.com).)"
        );
        assert_eq!(
            render_with(ext, "mail me@example.com"),
            "p(mail auto:email(me@example.com))"
        );
        assert_eq!(
            render_with(ext, "at www.example.com"),
            "p(at a[http://www.example.com](www.example.com))"
        );
        assert_eq!(
            render_with(ext, "[http://a.com](http://b.com)"),
            "p(a[http://b.com](http://a.com))"
        );
        assert_eq!(render("<http://a.b>"), "p(auto:normal(http://a.b))");
        assert_eq!(render("<b>x</b>"), "p(raw(<b>)xraw(</b>))");
    }

    #[test]
    fn test_codespan_and_escapes() {
        assert_eq!(render("`` a`b ``"), "p(code(a`b))");
        assert_eq!(render("\\*x\\*"), "p(*x*)");
        assert_eq!(render("\\q"), "p(\\q)");
    }

    #[test]
    fn test_linebreak() {
        assert_eq!(render("a  \nb"), "p(abrb)");
        assert_eq!(render("a \nb"), "p(a \nb)");
    }

    #[test]
    fn test_footnotes_numbered_by_first_use() {
        let out = render_with(
            Extensions::FOOTNOTES,
            "x[^b] y[^a] z[^b]\n\n[^a]: A\n[^b]: B\n[^c]: C\n",
        );
        assert_eq!(out, "p(xref1 yref2 zref1)notes(fn1(p(B))fn2(p(A)))");
    }

    #[test]
    fn test_unknown_footnote_is_literal() {
        assert_eq!(render_with(Extensions::FOOTNOTES, "x[^nope]"), "p(x[^nope])");
    }

    #[test]
    fn test_math() {
        let ext = Extensions::MATH;
        assert_eq!(render_with(ext, "$$x^2$$"), "p(dmath(x^2))");
        assert_eq!(render_with(ext, "a $$x$$ b"), "p(a math(x) b)");
        assert_eq!(render_with(ext, "a $x$"), "p(a $x$)");
        assert_eq!(
            render_with(ext | Extensions::MATH_EXPLICIT, "a $x$"),
            "p(a math(x))"
        );
        assert_eq!(render_with(ext, "\\\\[y\\\\]"), "p(dmath(y))");
    }

    #[test]
    fn test_strikethrough_needs_extension() {
        assert_eq!(render("~~x~~"), "p(~~x~~)");
        assert_eq!(render_with(Extensions::STRIKETHROUGH, "~~x~~"), "p(del(x))");
    }

    #[test]
    fn test_html_block() {
        assert_eq!(render("<div>\n*x*\n</div>\n\npara"), "html(<div>\n*x*\n</div>)p(para)");
    }

    #[test]
    fn test_nesting_bound_flattens_quotes() {
        let trace = Trace::default();
        let doc = Document::new(&trace, Extensions::empty(), 2).unwrap();
        let mut out = Vec::new();
        doc.render(&mut out, b"> > > text");
        assert_eq!(String::from_utf8(out).unwrap(), "quote(quote(p(> text)))");
    }

    #[test]
    fn test_missing_span_capability_copies_source() {
        let trace = Trace {
            caps: Some(Capabilities::all() - Capabilities::EMPHASIS),
            ..Default::default()
        };
        let doc = Document::with_defaults(&trace, Extensions::empty());
        let mut out = Vec::new();
        doc.render(&mut out, b"*a* **b**");
        assert_eq!(String::from_utf8(out).unwrap(), "p(*a* strong(b))");
    }

    #[test]
    fn test_missing_block_capability_drops_subtree() {
        let trace = Trace {
            caps: Some(Capabilities::all() - Capabilities::BLOCKQUOTE),
            ..Default::default()
        };
        let doc = Document::with_defaults(&trace, Extensions::empty());
        let mut out = Vec::new();
        doc.render(&mut out, b"> gone\n\nkept");
        assert_eq!(String::from_utf8(out).unwrap(), "p(kept)");
    }

    #[test]
    fn test_every_node_is_freed() {
        let trace = Trace::default();
        let doc = Document::with_defaults(&trace, Extensions::TABLES | Extensions::FOOTNOTES);
        let mut out = Vec::new();
        doc.render(
            &mut out,
            b"# h *e*\n\n> - [l](/u) **b**\n\na|b\n-|-\n1|2\n\nn[^1]\n\n[^1]: note\n",
        );
        assert!(*trace.news.borrow() > 0);
        assert_eq!(*trace.news.borrow(), *trace.frees.borrow());
    }

    #[test]
    fn test_render_inline() {
        let trace = Trace::default();
        let doc = Document::with_defaults(&trace, Extensions::empty());
        let mut out = Vec::new();
        doc.render_inline(&mut out, b"# not a header *x*\r\n[a]: /u");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# not a header em(x)\n[a]: /u"
        );
    }
}
