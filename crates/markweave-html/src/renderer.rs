//! The HTML renderer.

use bitflags::bitflags;
use markweave_core::{Alignment, AutolinkType, ListFlags, TableFlags};
use markweave_parser::autolink::is_safe_link;
use markweave_parser::{Context, Renderer};

use crate::escape::{escape_href, escape_html};

bitflags! {
    /// Output switches for [`HtmlRenderer`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HtmlFlags: u32 {
        /// Drop raw HTML blocks and tags.
        const SKIP_HTML = 1 << 0;
        /// Escape raw HTML instead of passing it through.
        const ESCAPE = 1 << 1;
        /// Newlines inside paragraphs become line breaks.
        const HARD_WRAP = 1 << 2;
        /// Close void elements XHTML style.
        const USE_XHTML = 1 << 3;
    }
}

/// Whether `link` may become an `href` or `src`.
///
/// Links with a recognized safe scheme pass, as do links with no scheme
/// at all. Anything else that names a scheme is refused.
pub fn is_link_allowed(link: &[u8]) -> bool {
    if is_safe_link(link) {
        return true;
    }
    match link.iter().position(|c| b":/?#".contains(c)) {
        Some(i) => link[i] != b':',
        None => true,
    }
}

fn put(ob: &mut Vec<u8>, s: &str) {
    ob.extend_from_slice(s.as_bytes());
}

/// Start a new block on its own line.
fn block_sep(ob: &mut Vec<u8>) {
    if !ob.is_empty() {
        ob.push(b'\n');
    }
}

fn trim_trailing_newlines(text: &[u8]) -> &[u8] {
    let end = text.iter().rposition(|&c| c != b'\n').map_or(0, |i| i + 1);
    &text[..end]
}

/// Renders Markdown to HTML into a byte buffer.
#[derive(Debug, Clone, Copy)]
pub struct HtmlRenderer {
    flags: HtmlFlags,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new(HtmlFlags::empty())
    }
}

impl HtmlRenderer {
    pub fn new(flags: HtmlFlags) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> HtmlFlags {
        self.flags
    }

    fn close_void(&self, ob: &mut Vec<u8>) {
        if self.flags.contains(HtmlFlags::USE_XHTML) {
            put(ob, "/>");
        } else {
            ob.push(b'>');
        }
    }

    fn void_tag(&self, ob: &mut Vec<u8>, tag: &str) {
        ob.push(b'<');
        put(ob, tag);
        self.close_void(ob);
    }

    fn wrap(&self, ob: &mut Vec<u8>, tag: &str, content: &[u8]) {
        ob.push(b'<');
        put(ob, tag);
        ob.push(b'>');
        ob.extend_from_slice(content);
        put(ob, "</");
        put(ob, tag);
        ob.push(b'>');
    }

    fn allowed(&self, link: &[u8]) -> bool {
        let ok = is_link_allowed(link);
        if !ok {
            log::debug!("refusing link {:?}", String::from_utf8_lossy(link));
        }
        ok
    }
}

impl Renderer for HtmlRenderer {
    type Node = Vec<u8>;

    fn blockcode(&self, ob: &mut Vec<u8>, text: &[u8], lang: Option<&[u8]>, _ctx: &Context) {
        block_sep(ob);
        match lang {
            Some(lang) => {
                put(ob, "<pre><code class=\"language-");
                escape_html(ob, lang);
                put(ob, "\">");
            }
            None => put(ob, "<pre><code>"),
        }
        escape_html(ob, text);
        put(ob, "</code></pre>\n");
    }

    fn blockquote(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        block_sep(ob);
        put(ob, "<blockquote>\n");
        ob.extend_from_slice(content);
        put(ob, "</blockquote>\n");
    }

    fn header(&self, ob: &mut Vec<u8>, content: &Vec<u8>, level: usize, _ctx: &Context) {
        block_sep(ob);
        self.wrap(ob, &format!("h{}", level), content);
        ob.push(b'\n');
    }

    fn hrule(&self, ob: &mut Vec<u8>, _ctx: &Context) {
        block_sep(ob);
        self.void_tag(ob, "hr");
        ob.push(b'\n');
    }

    fn list(
        &self,
        ob: &mut Vec<u8>,
        content: &Vec<u8>,
        flags: ListFlags,
        start: u32,
        _ctx: &Context,
    ) {
        block_sep(ob);
        let tag = if flags.contains(ListFlags::ORDERED) {
            if start != 1 {
                put(ob, &format!("<ol start=\"{}\">\n", start));
            } else {
                put(ob, "<ol>\n");
            }
            "ol"
        } else {
            put(ob, "<ul>\n");
            "ul"
        };
        ob.extend_from_slice(content);
        put(ob, &format!("</{}>\n", tag));
    }

    fn listitem(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _flags: ListFlags, _ctx: &Context) {
        self.wrap(ob, "li", trim_trailing_newlines(content));
        ob.push(b'\n');
    }

    fn paragraph(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        block_sep(ob);
        put(ob, "<p>");
        if self.flags.contains(HtmlFlags::HARD_WRAP) {
            let mut lines = content.split(|&c| c == b'\n').peekable();
            while let Some(line) = lines.next() {
                ob.extend_from_slice(line);
                if lines.peek().is_some() {
                    self.void_tag(ob, "br");
                    ob.push(b'\n');
                }
            }
        } else {
            ob.extend_from_slice(content);
        }
        put(ob, "</p>\n");
    }

    fn table(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        block_sep(ob);
        put(ob, "<table>\n");
        ob.extend_from_slice(content);
        put(ob, "</table>\n");
    }

    fn table_header(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        put(ob, "<thead>\n");
        ob.extend_from_slice(content);
        put(ob, "</thead>\n");
    }

    fn table_body(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        put(ob, "<tbody>\n");
        ob.extend_from_slice(content);
        put(ob, "</tbody>\n");
    }

    fn table_row(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        put(ob, "<tr>\n");
        ob.extend_from_slice(content);
        put(ob, "</tr>\n");
    }

    fn table_cell(&self, ob: &mut Vec<u8>, content: &Vec<u8>, flags: TableFlags, _ctx: &Context) {
        let tag = if flags.contains(TableFlags::HEADER) {
            "th"
        } else {
            "td"
        };
        put(ob, "<");
        put(ob, tag);
        match flags.alignment() {
            Alignment::Left => put(ob, " style=\"text-align: left\""),
            Alignment::Right => put(ob, " style=\"text-align: right\""),
            Alignment::Center => put(ob, " style=\"text-align: center\""),
            Alignment::None => {}
        }
        ob.push(b'>');
        ob.extend_from_slice(content);
        put(ob, &format!("</{}>\n", tag));
    }

    fn footnotes(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) {
        block_sep(ob);
        put(ob, "<div class=\"footnotes\">\n");
        self.void_tag(ob, "hr");
        put(ob, "\n<ol>\n");
        ob.extend_from_slice(content);
        put(ob, "</ol>\n</div>\n");
    }

    fn footnote_def(&self, ob: &mut Vec<u8>, content: &Vec<u8>, num: usize, _ctx: &Context) {
        let backref = format!("&nbsp;<a href=\"#fnref{}\">&#8617;</a>", num);
        // The back reference goes inside the last paragraph when there is one
        let at = content
            .windows(4)
            .rposition(|w| w == b"</p>")
            .unwrap_or(content.len());

        put(ob, &format!("<li id=\"fn{}\">\n", num));
        ob.extend_from_slice(&content[..at]);
        put(ob, &backref);
        ob.extend_from_slice(&content[at..]);
        put(ob, "</li>\n");
    }

    fn blockhtml(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
        if self.flags.contains(HtmlFlags::SKIP_HTML) {
            return;
        }
        block_sep(ob);
        if self.flags.contains(HtmlFlags::ESCAPE) {
            escape_html(ob, text);
        } else {
            ob.extend_from_slice(text);
        }
        ob.push(b'\n');
    }

    fn autolink(&self, ob: &mut Vec<u8>, link: &[u8], kind: AutolinkType, _ctx: &Context) -> bool {
        if kind == AutolinkType::Normal && !self.allowed(link) {
            return false;
        }
        let shown = link.strip_prefix(b"mailto:").unwrap_or(link);

        put(ob, "<a href=\"");
        if kind == AutolinkType::Email {
            put(ob, "mailto:");
            escape_href(ob, shown);
        } else {
            escape_href(ob, link);
        }
        put(ob, "\">");
        escape_html(ob, shown);
        put(ob, "</a>");
        true
    }

    fn codespan(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) -> bool {
        put(ob, "<code>");
        escape_html(ob, text);
        put(ob, "</code>");
        true
    }

    fn double_emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "strong", content);
        true
    }

    fn emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "em", content);
        true
    }

    fn underline(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "u", content);
        true
    }

    fn highlight(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "mark", content);
        true
    }

    fn quote(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "q", content);
        true
    }

    fn image(
        &self,
        ob: &mut Vec<u8>,
        link: &[u8],
        title: Option<&[u8]>,
        alt: &[u8],
        _ctx: &Context,
    ) -> bool {
        if !self.allowed(link) {
            return false;
        }
        put(ob, "<img src=\"");
        escape_href(ob, link);
        put(ob, "\" alt=\"");
        escape_html(ob, alt);
        ob.push(b'"');
        if let Some(title) = title {
            put(ob, " title=\"");
            escape_html(ob, title);
            ob.push(b'"');
        }
        self.close_void(ob);
        true
    }

    fn linebreak(&self, ob: &mut Vec<u8>, _ctx: &Context) -> bool {
        self.void_tag(ob, "br");
        ob.push(b'\n');
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
        if !self.allowed(link) {
            return false;
        }
        put(ob, "<a href=\"");
        escape_href(ob, link);
        ob.push(b'"');
        if let Some(title) = title {
            put(ob, " title=\"");
            escape_html(ob, title);
            ob.push(b'"');
        }
        ob.push(b'>');
        ob.extend_from_slice(content);
        put(ob, "</a>");
        true
    }

    fn triple_emphasis(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        put(ob, "<strong><em>");
        ob.extend_from_slice(content);
        put(ob, "</em></strong>");
        true
    }

    fn strikethrough(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "del", content);
        true
    }

    fn superscript(&self, ob: &mut Vec<u8>, content: &Vec<u8>, _ctx: &Context) -> bool {
        self.wrap(ob, "sup", content);
        true
    }

    fn footnote_ref(&self, ob: &mut Vec<u8>, num: usize, _ctx: &Context) -> bool {
        put(
            ob,
            &format!("<sup id=\"fnref{0}\"><a href=\"#fn{0}\">{0}</a></sup>", num),
        );
        true
    }

    fn math(&self, ob: &mut Vec<u8>, text: &[u8], display: bool, _ctx: &Context) -> bool {
        let (open, close) = if display { ("\\[", "\\]") } else { ("\\(", "\\)") };
        put(ob, open);
        escape_html(ob, text);
        put(ob, close);
        true
    }

    fn raw_html(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) -> bool {
        if self.flags.contains(HtmlFlags::ESCAPE) {
            escape_html(ob, text);
        } else if !self.flags.contains(HtmlFlags::SKIP_HTML) {
            ob.extend_from_slice(text);
        }
        true
    }

    fn entity(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
        ob.extend_from_slice(text);
    }

    fn normal_text(&self, ob: &mut Vec<u8>, text: &[u8], _ctx: &Context) {
        escape_html(ob, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markweave_core::Extensions;
    use pretty_assertions::assert_eq;

    fn ctx() -> Context {
        Context {
            extensions: Extensions::empty(),
            depth: 0,
            inline_render: false,
        }
    }

    fn out(ob: &[u8]) -> &str {
        std::str::from_utf8(ob).unwrap()
    }

    #[test]
    fn test_is_link_allowed() {
        assert!(is_link_allowed(b"https://example.com"));
        assert!(is_link_allowed(b"page.html"));
        assert!(is_link_allowed(b"../up?x=a:b"));
        assert!(is_link_allowed(b""));
        assert!(!is_link_allowed(b"javascript:alert(1)"));
        assert!(!is_link_allowed(b"vbscript:x"));
        assert!(!is_link_allowed(b"http://"));
    }

    #[test]
    fn test_block_separation() {
        let r = HtmlRenderer::default();
        let mut ob = Vec::new();
        r.hrule(&mut ob, &ctx());
        r.paragraph(&mut ob, &b"x".to_vec(), &ctx());
        assert_eq!(out(&ob), "<hr>\n\n<p>x</p>\n");
    }

    #[test]
    fn test_xhtml_void_tags() {
        let r = HtmlRenderer::new(HtmlFlags::USE_XHTML);
        let mut ob = Vec::new();
        r.linebreak(&mut ob, &ctx());
        r.image(&mut ob, b"a.png", Some(b"T"), b"alt", &ctx());
        assert_eq!(out(&ob), "<br/>\n<img src=\"a.png\" alt=\"alt\" title=\"T\"/>");
    }

    #[test]
    fn test_hard_wrap() {
        let r = HtmlRenderer::new(HtmlFlags::HARD_WRAP);
        let mut ob = Vec::new();
        r.paragraph(&mut ob, &b"a\nb".to_vec(), &ctx());
        assert_eq!(out(&ob), "<p>a<br>\nb</p>\n");
    }

    #[test]
    fn test_refuses_unsafe_link() {
        let r = HtmlRenderer::default();
        let mut ob = Vec::new();
        assert!(!r.link(&mut ob, &b"x".to_vec(), b"javascript:void(0)", None, &ctx()));
        assert!(!r.image(&mut ob, b"data:image/png,xx", None, b"", &ctx()));
        assert!(!r.autolink(&mut ob, b"file://etc/passwd", AutolinkType::Normal, &ctx()));
        assert!(ob.is_empty());
    }

    #[test]
    fn test_email_autolink() {
        let r = HtmlRenderer::default();
        let mut ob = Vec::new();
        assert!(r.autolink(&mut ob, b"me@example.com", AutolinkType::Email, &ctx()));
        assert_eq!(
            out(&ob),
            "<a href=\"mailto:me@example.com\">me@example.com</a>"
        );
    }

    #[test]
    fn test_table_cell_alignment() {
        let r = HtmlRenderer::default();
        let mut ob = Vec::new();
        let c = b"c".to_vec();
        r.table_cell(&mut ob, &c, TableFlags::ALIGN_CENTER | TableFlags::HEADER, &ctx());
        r.table_cell(&mut ob, &c, TableFlags::empty(), &ctx());
        assert_eq!(
            out(&ob),
            "<th style=\"text-align: center\">c</th>\n<td>c</td>\n"
        );
    }

    #[test]
    fn test_footnote_backref() {
        let r = HtmlRenderer::default();
        let mut ob = Vec::new();
        r.footnote_def(&mut ob, &b"<p>note</p>\n".to_vec(), 2, &ctx());
        assert_eq!(
            out(&ob),
            "<li id=\"fn2\">\n<p>note&nbsp;<a href=\"#fnref2\">&#8617;</a></p>\n</li>\n"
        );
    }

    #[test]
    fn test_raw_html_flags() {
        let tag = b"<b>";
        let mut ob = Vec::new();
        assert!(HtmlRenderer::new(HtmlFlags::SKIP_HTML).raw_html(&mut ob, tag, &ctx()));
        assert!(ob.is_empty());
        assert!(HtmlRenderer::new(HtmlFlags::ESCAPE).raw_html(&mut ob, tag, &ctx()));
        assert_eq!(out(&ob), "&lt;b&gt;");
    }
}
