//! Property-based tests for markweave.
//!
//! These tests use proptest to generate random inputs and verify
//! that the engine terminates, never panics and respects its bounds.

use proptest::prelude::*;

use markweave_core::Extensions;
use markweave_html::{render_html, HtmlRenderer};
use markweave_parser::Document;

/// Generate a random markdown-like string.
fn markdown_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x20-\x7E\n\t]{0,400}").unwrap()
}

/// Generate text dense in markup characters.
fn markup_soup() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[-*_`\[\]()<>!#>|:~=^$\\&@w. a1\n]{0,300}").unwrap()
}

/// Generate a list item's text.
fn item_text() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[a-z][a-zA-Z0-9 ,.]{0,60}").unwrap()
}

/// Generate a list, possibly nested, whose first item is not indented.
fn list() -> impl Strategy<Value = String> {
    prop::collection::vec((0..3usize, item_text()), 1..10).prop_map(|items| {
        items
            .iter()
            .enumerate()
            .map(|(n, (indent, item))| {
                let indent = if n == 0 { 0 } else { *indent };
                format!("{}- {}", "  ".repeat(indent), item)
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}

/// Generate an arbitrary extension set.
fn extensions() -> impl Strategy<Value = Extensions> {
    any::<u32>().prop_map(Extensions::from_bits_truncate)
}

// =============================================================================
// Engine Property Tests
// =============================================================================

proptest! {
    /// Rendering terminates without panicking on any input.
    #[test]
    fn render_never_panics(input in markdown_string(), ext in extensions()) {
        let _ = render_html(input.as_bytes(), ext);
    }

    /// Markup-heavy input is handled under every nesting limit.
    #[test]
    fn render_handles_markup_soup(input in markup_soup(), ext in extensions(), max in 1..20usize) {
        let renderer = HtmlRenderer::default();
        let doc = Document::new(&renderer, ext, max).unwrap();
        let mut out = Vec::new();
        doc.render(&mut out, input.as_bytes());
        let mut inline = Vec::new();
        doc.render_inline(&mut inline, input.as_bytes());
    }

    /// Arbitrary bytes, including invalid UTF-8, are accepted.
    #[test]
    fn render_accepts_any_bytes(input in prop::collection::vec(any::<u8>(), 0..300)) {
        let _ = render_html(&input, Extensions::all());
    }

    /// Valid UTF-8 in means valid UTF-8 out.
    #[test]
    fn render_produces_valid_utf8(input in markdown_string()) {
        let renderer = HtmlRenderer::default();
        let doc = Document::with_defaults(&renderer, Extensions::all());
        let mut out = Vec::new();
        doc.render(&mut out, input.as_bytes());
        prop_assert!(std::str::from_utf8(&out).is_ok());
    }

    /// Rendering is deterministic.
    #[test]
    fn render_is_deterministic(input in markup_soup()) {
        let first = render_html(input.as_bytes(), Extensions::all());
        let second = render_html(input.as_bytes(), Extensions::all());
        prop_assert_eq!(first, second);
    }

    /// A list that starts at the margin renders as a list.
    #[test]
    fn render_handles_lists(list in list()) {
        let html = render_html(list.as_bytes(), Extensions::empty());
        prop_assert!(html.starts_with("<ul>"));
    }

    /// Plain words pass through untouched apart from the paragraph.
    #[test]
    fn plain_text_is_kept(words in prop::collection::vec("[a-z]{1,10}", 1..20)) {
        let text = words.join(" ");
        let html = render_html(text.as_bytes(), Extensions::all());
        prop_assert_eq!(html, format!("<p>{}</p>\n", text));
    }
}
