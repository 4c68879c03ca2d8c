//! Markweave HTML
//!
//! This crate provides an HTML [`Renderer`](markweave_parser::Renderer)
//! for the markweave engine.
//!
//! # Example
//!
//! ```
//! use markweave_core::Extensions;
//! use markweave_html::render_html;
//!
//! let html = render_html(b"Hello *world*", Extensions::empty());
//! assert_eq!(html, "<p>Hello <em>world</em></p>\n");
//! ```

pub mod escape;
pub mod renderer;

pub use escape::{escape_href, escape_html};
pub use renderer::{is_link_allowed, HtmlFlags, HtmlRenderer};

use markweave_core::Extensions;
use markweave_parser::Document;

/// Render `input` to an HTML string with default flags and nesting.
pub fn render_html(input: &[u8], extensions: Extensions) -> String {
    let renderer = HtmlRenderer::default();
    let doc = Document::with_defaults(&renderer, extensions);
    let mut ob = Vec::new();
    doc.render(&mut ob, input);
    String::from_utf8_lossy(&ob).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn html(input: &str, extensions: Extensions) -> String {
        render_html(input.as_bytes(), extensions)
    }

    fn html_with(input: &str, extensions: Extensions, flags: HtmlFlags) -> String {
        let renderer = HtmlRenderer::new(flags);
        let doc = Document::with_defaults(&renderer, extensions);
        let mut ob = Vec::new();
        doc.render(&mut ob, input.as_bytes());
        String::from_utf8(ob).unwrap()
    }

    #[test]
    fn test_header_and_paragraph() {
        assert_eq!(
            html("# Title\n\nSome text", Extensions::empty()),
            "<h1>Title</h1>\n\n<p>Some text</p>\n"
        );
    }

    #[test]
    fn test_fenced_code_escapes() {
        assert_eq!(
            html("```rust\nlet x = 1 < 2;\n```\n", Extensions::FENCED_CODE),
            "<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>\n"
        );
    }

    #[test]
    fn test_lists() {
        assert_eq!(
            html("- a\n- b\n", Extensions::empty()),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>\n"
        );
        assert_eq!(
            html("3. x\n4. y\n", Extensions::empty()),
            "<ol start=\"3\">\n<li>x</li>\n<li>y</li>\n</ol>\n"
        );
    }

    #[test]
    fn test_links() {
        assert_eq!(
            html("[x](http://a.com \"T\")", Extensions::empty()),
            "<p><a href=\"http://a.com\" title=\"T\">x</a></p>\n"
        );
        assert_eq!(
            html("[x](page.html)", Extensions::empty()),
            "<p><a href=\"page.html\">x</a></p>\n"
        );
        assert_eq!(
            html("[x](javascript:alert(1))", Extensions::empty()),
            "<p>[x](javascript:alert(1))</p>\n"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            html("| a | b |\n|:--|--:|\n| 1 | 2 |\n", Extensions::TABLES),
            "<table>\n<thead>\n<tr>\n\
             <th style=\"text-align: left\">a</th>\n\
             <th style=\"text-align: right\">b</th>\n\
             </tr>\n</thead>\n<tbody>\n<tr>\n\
             <td style=\"text-align: left\">1</td>\n\
             <td style=\"text-align: right\">2</td>\n\
             </tr>\n</tbody>\n</table>\n"
        );
    }

    #[test]
    fn test_footnotes() {
        assert_eq!(
            html("a[^1]\n\n[^1]: note\n", Extensions::FOOTNOTES),
            "<p>a<sup id=\"fnref1\"><a href=\"#fn1\">1</a></sup></p>\n\n\
             <div class=\"footnotes\">\n<hr>\n<ol>\n\
             <li id=\"fn1\">\n<p>note&nbsp;<a href=\"#fnref1\">&#8617;</a></p>\n</li>\n\
             </ol>\n</div>\n"
        );
    }

    #[test]
    fn test_span_extensions() {
        let ext = Extensions::STRIKETHROUGH | Extensions::HIGHLIGHT | Extensions::SUPERSCRIPT;
        assert_eq!(
            html("~~a~~ ==b== c^2", ext),
            "<p><del>a</del> <mark>b</mark> c<sup>2</sup></p>\n"
        );
    }

    #[test]
    fn test_display_math() {
        assert_eq!(html("$$x^2$$", Extensions::MATH), "<p>\\[x^2\\]</p>\n");
    }

    #[test]
    fn test_html_block_flags() {
        let input = "<div>\nhi\n</div>\n";
        assert_eq!(
            html_with(input, Extensions::empty(), HtmlFlags::empty()),
            "<div>\nhi\n</div>\n"
        );
        assert_eq!(html_with(input, Extensions::empty(), HtmlFlags::SKIP_HTML), "");
        assert_eq!(
            html_with(input, Extensions::empty(), HtmlFlags::ESCAPE),
            "&lt;div&gt;\nhi\n&lt;/div&gt;\n"
        );
    }

    #[test]
    fn test_xhtml_rule() {
        assert_eq!(
            html_with("---\n", Extensions::empty(), HtmlFlags::USE_XHTML),
            "<hr/>\n"
        );
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(
            html("1 < 2 & \"ok\"", Extensions::empty()),
            "<p>1 &lt; 2 &amp; &quot;ok&quot;</p>\n"
        );
    }
}
