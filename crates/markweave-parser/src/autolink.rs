//! Bare link scanners for the autolink extension.
//!
//! Each scanner is called with the whole span text and the position of
//! the active byte that triggered it. `max_rewind` bounds how far back the
//! scanner may reach into text that has not been emitted yet; a match
//! reports how many of those bytes it took back (`rewind`) and how many
//! bytes from `pos` on it consumed (`end`).

use regex::bytes::Regex;
use std::sync::LazyLock;

/// Schemes accepted for links, each followed by at least one alphanumeric.
static SAFE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:https?://|ftp://|mailto:|/|#)[a-z0-9]").unwrap());

/// A bare link found by a scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutolinkMatch {
    /// Bytes before `pos` that belong to the link
    pub rewind: usize,
    /// Bytes from `pos` on that belong to the link
    pub end: usize,
}

impl AutolinkMatch {
    /// The link bytes within `data`.
    pub fn link<'a>(&self, data: &'a [u8], pos: usize) -> &'a [u8] {
        &data[pos - self.rewind..pos + self.end]
    }
}

/// Whether `link` uses a scheme that is safe to emit as a hyperlink.
///
/// # Example
///
/// ```
/// use markweave_parser::autolink::is_safe_link;
/// assert!(is_safe_link(b"https://example.com"));
/// assert!(is_safe_link(b"/relative"));
/// assert!(!is_safe_link(b"javascript:alert(1)"));
/// ```
pub fn is_safe_link(link: &[u8]) -> bool {
    SAFE_LINK_RE.is_match(link)
}

/// Trim trailing punctuation that is more likely prose than link.
fn trim_delim(data: &[u8], mut link_end: usize) -> usize {
    if let Some(lt) = data[..link_end].iter().position(|&c| c == b'<') {
        link_end = lt;
    }

    while link_end > 0 {
        let c = data[link_end - 1];
        if b"?!.,:".contains(&c) {
            link_end -= 1;
        } else if c == b';' {
            // Drop a trailing entity such as &quot; as a unit
            let mut start = link_end - 1;
            while start > 0 && data[start - 1].is_ascii_alphabetic() {
                start -= 1;
            }
            if start > 0 && start < link_end - 1 && data[start - 1] == b'&' {
                link_end = start - 1;
            } else {
                link_end -= 1;
            }
        } else {
            break;
        }
    }

    if link_end == 0 {
        return 0;
    }

    let close = data[link_end - 1];
    let open = match close {
        b'"' => b'"',
        b'\'' => b'\'',
        b')' => b'(',
        b']' => b'[',
        b'}' => b'{',
        _ => return link_end,
    };

    let span = &data[..link_end];
    if open == close {
        if span.iter().filter(|&&c| c == close).count() % 2 == 1 {
            link_end -= 1;
        }
    } else {
        let opening = span.iter().filter(|&&c| c == open).count();
        let closing = span.iter().filter(|&&c| c == close).count();
        if opening != closing {
            link_end -= 1;
        }
    }
    link_end
}

/// Length of a plausible domain at the start of `data`, or 0.
fn check_domain(data: &[u8], allow_short: bool) -> usize {
    if data.is_empty() || !data[0].is_ascii_alphanumeric() {
        return 0;
    }

    let mut dots = 0;
    let mut i = 1;
    while i + 1 < data.len() {
        match data[i] {
            b'.' | b':' => dots += 1,
            c if c.is_ascii_alphanumeric() || c == b'-' => {}
            _ => break,
        }
        i += 1;
    }

    if allow_short || dots > 0 {
        i
    } else {
        0
    }
}

/// `www.` link starting at `pos`.
pub fn scan_www(data: &[u8], pos: usize, max_rewind: usize) -> Option<AutolinkMatch> {
    if max_rewind > 0 {
        let prev = data[pos - 1];
        if !prev.is_ascii_punctuation() && !prev.is_ascii_whitespace() {
            return None;
        }
    }

    let rest = &data[pos..];
    if !rest.starts_with(b"www.") {
        return None;
    }

    let mut end = check_domain(rest, false);
    if end == 0 {
        return None;
    }
    while end < rest.len() && !rest[end].is_ascii_whitespace() {
        end += 1;
    }

    match trim_delim(rest, end) {
        0 => None,
        end => Some(AutolinkMatch { rewind: 0, end }),
    }
}

/// E-mail address around the `@` at `pos`.
pub fn scan_email(data: &[u8], pos: usize, max_rewind: usize) -> Option<AutolinkMatch> {
    let rewind = data[pos - max_rewind..pos]
        .iter()
        .rev()
        .take_while(|&&c| c.is_ascii_alphanumeric() || b".+-_".contains(&c))
        .count();
    if rewind == 0 {
        return None;
    }

    let rest = &data[pos..];
    let mut ats = 0;
    let mut dots = 0;
    let mut end = 0;
    while end < rest.len() {
        match rest[end] {
            c if c.is_ascii_alphanumeric() => {}
            b'@' => {
                ats += 1;
                if ats > 1 {
                    return None;
                }
            }
            b'.' if end + 1 < rest.len() => dots += 1,
            b'-' | b'_' => {}
            _ => break,
        }
        end += 1;
    }

    if end < 2 || ats != 1 || dots == 0 || !rest[end - 1].is_ascii_alphabetic() {
        return None;
    }

    match trim_delim(rest, end) {
        0 => None,
        end => Some(AutolinkMatch { rewind, end }),
    }
}

/// `scheme://` link around the `:` at `pos`.
pub fn scan_url(data: &[u8], pos: usize, max_rewind: usize) -> Option<AutolinkMatch> {
    let rest = &data[pos..];
    if rest.len() < 4 || rest[1] != b'/' || rest[2] != b'/' {
        return None;
    }

    let rewind = data[pos - max_rewind..pos]
        .iter()
        .rev()
        .take_while(|c| c.is_ascii_alphabetic())
        .count();
    if !is_safe_link(&data[pos - rewind..]) {
        return None;
    }

    let domain = check_domain(&rest[3..], false);
    if domain == 0 {
        return None;
    }
    let mut end = 3 + domain;
    while end < rest.len() && !rest[end].is_ascii_whitespace() {
        end += 1;
    }

    match trim_delim(rest, end) {
        0 => None,
        end => Some(AutolinkMatch { rewind, end }),
    }
}
