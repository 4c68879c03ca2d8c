//! Reference collection pre-pass.
//!
//! Before block parsing, one forward pass over the input lifts out link
//! reference definitions (`[label]: dest "title"`) and, with the
//! footnotes extension, footnote definitions (`[^label]: text`). Every
//! other line is copied to the working text with tabs expanded to
//! 4-column stops and line endings normalized to `\n`.

use std::collections::HashMap;

use markweave_core::Extensions;

/// A link reference definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRef<'a> {
    /// Raw destination, still backslash-escaped
    pub dest: &'a [u8],
    pub title: Option<&'a [u8]>,
}

/// Link reference definitions keyed by normalized label.
#[derive(Debug, Clone, Default)]
pub struct LinkRefs<'a> {
    map: HashMap<Vec<u8>, LinkRef<'a>>,
}

impl<'a> LinkRefs<'a> {
    /// Adds a definition unless the label is already defined.
    pub fn insert(&mut self, label: &[u8], def: LinkRef<'a>) {
        self.map.entry(normalize_label(label)).or_insert(def);
    }

    pub fn get(&self, label: &[u8]) -> Option<&LinkRef<'a>> {
        self.map.get(&normalize_label(label))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// One footnote definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
    pub label: Vec<u8>,
    /// Definition body, de-indented and ready for block parsing
    pub content: Vec<u8>,
}

/// Footnote definitions in source order.
#[derive(Debug, Clone, Default)]
pub struct Footnotes {
    defs: Vec<Footnote>,
    index: HashMap<Vec<u8>, usize>,
}

impl Footnotes {
    /// Adds a definition unless the label is already defined.
    pub fn insert(&mut self, label: &[u8], content: Vec<u8>) {
        let key = normalize_label(label);
        if self.index.contains_key(&key) {
            return;
        }
        self.index.insert(key, self.defs.len());
        self.defs.push(Footnote {
            label: label.to_vec(),
            content,
        });
    }

    /// Index of the definition for `label`.
    pub fn find(&self, label: &[u8]) -> Option<usize> {
        self.index.get(&normalize_label(label)).copied()
    }

    pub fn get(&self, idx: usize) -> Option<&Footnote> {
        self.defs.get(idx)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// Footnote numbering for one render call.
///
/// Numbers are handed out in order of first reference, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct FootnoteUsage {
    numbers: HashMap<usize, usize>,
    order: Vec<usize>,
}

impl FootnoteUsage {
    /// Number for the footnote at `idx`, assigning the next one on first use.
    pub fn number(&mut self, idx: usize) -> usize {
        if let Some(&num) = self.numbers.get(&idx) {
            return num;
        }
        self.order.push(idx);
        let num = self.order.len();
        self.numbers.insert(idx, num);
        num
    }

    /// Footnote indices in first-use order.
    pub fn used(&self) -> &[usize] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Output of the pre-pass.
#[derive(Debug, Clone, Default)]
pub struct Collected<'a> {
    /// Input with definitions removed, tabs expanded, `\n` line endings
    /// and a trailing newline
    pub text: Vec<u8>,
    pub links: LinkRefs<'a>,
    pub footnotes: Footnotes,
}

/// Normalize a reference label: collapse whitespace, trim, fold case.
///
/// # Example
///
/// ```
/// use markweave_parser::refs::normalize_label;
/// assert_eq!(normalize_label(b"  Foo \n  Bar "), b"foo bar".to_vec());
/// ```
pub fn normalize_label(label: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(label.len());
    for word in label
        .split(|c| c.is_ascii_whitespace())
        .filter(|w| !w.is_empty())
    {
        if !out.is_empty() {
            out.push(b' ');
        }
        out.extend_from_slice(word);
    }
    match std::str::from_utf8(&out) {
        Ok(s) => s.to_lowercase().into_bytes(),
        Err(_) => out.to_ascii_lowercase(),
    }
}

/// Strip a leading UTF-8 byte order mark.
pub fn strip_bom(input: &[u8]) -> &[u8] {
    input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input)
}

/// Copy `line` into `out`, expanding tabs to the next multiple of four
/// columns. UTF-8 continuation bytes do not advance the column.
pub fn expand_tabs(out: &mut Vec<u8>, line: &[u8]) {
    let mut col = 0;
    for &c in line {
        if c == b'\t' {
            loop {
                out.push(b' ');
                col += 1;
                if col % 4 == 0 {
                    break;
                }
            }
        } else {
            if c & 0xC0 != 0x80 {
                col += 1;
            }
            out.push(c);
        }
    }
}

/// Rewrite `\r\n` and lone `\r` line endings as `\n`.
pub fn normalize_newlines(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\r' {
            out.push(b'\n');
            if input.get(i + 1) == Some(&b'\n') {
                i += 1;
            }
        } else {
            out.push(input[i]);
        }
        i += 1;
    }
    out
}

/// Run the pre-pass over `input` (BOM already stripped).
pub fn collect(input: &[u8], extensions: Extensions) -> Collected<'_> {
    let mut collected = Collected {
        text: Vec::with_capacity(input.len() + input.len() / 8 + 1),
        ..Default::default()
    };
    let len = input.len();
    let mut beg = 0;

    while beg < len {
        if extensions.contains(Extensions::FOOTNOTES) {
            if let Some((label, content, end)) = parse_footnote_def(input, beg) {
                collected.footnotes.insert(label, content);
                beg = end;
                continue;
            }
        }
        if let Some((label, def, end)) = parse_link_ref(input, beg) {
            collected.links.insert(label, def);
            beg = end;
            continue;
        }

        let mut end = beg;
        while end < len && !is_newline(input[end]) {
            end += 1;
        }
        if end > beg {
            expand_tabs(&mut collected.text, &input[beg..end]);
        }
        while end < len && is_newline(input[end]) {
            // \r\n counts once
            if input[end] == b'\n' || input.get(end + 1) != Some(&b'\n') {
                collected.text.push(b'\n');
            }
            end += 1;
        }
        beg = end;
    }

    if collected.text.last().is_some_and(|&c| c != b'\n') {
        collected.text.push(b'\n');
    }

    log::trace!(
        "collected {} link refs, {} footnotes",
        collected.links.len(),
        collected.footnotes.len()
    );
    collected
}

#[inline]
fn is_newline(c: u8) -> bool {
    c == b'\n' || c == b'\r'
}

/// Length of the line terminator at `i` (0 if none).
fn newline_len(data: &[u8], i: usize) -> usize {
    match (data.get(i), data.get(i + 1)) {
        (Some(b'\r'), Some(b'\n')) => 2,
        (Some(b'\n'), _) | (Some(b'\r'), _) => 1,
        _ => 0,
    }
}

fn skip_spaces(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && data[i] == b' ' {
        i += 1;
    }
    i
}

/// Position after up to three spaces of indentation, or `None` for four.
fn skip_indent(data: &[u8], beg: usize) -> Option<usize> {
    let spaces = data[beg..].iter().take(4).take_while(|&&c| c == b' ').count();
    (spaces < 4).then_some(beg + spaces)
}

/// `[label]:` at `beg`; returns the label and the position after the colon.
fn parse_label(data: &[u8], beg: usize) -> Option<(&[u8], usize)> {
    let mut i = skip_indent(data, beg)?;
    if data.get(i) != Some(&b'[') {
        return None;
    }
    i += 1;
    let start = i;
    while i < data.len() && !is_newline(data[i]) && data[i] != b']' {
        i += 1;
    }
    if i == start || data.get(i) != Some(&b']') || data.get(i + 1) != Some(&b':') {
        return None;
    }
    Some((&data[start..i], i + 2))
}

/// A link reference definition at `beg`.
///
/// The returned end position is the definition's last line terminator,
/// which is left for the caller to copy.
fn parse_link_ref(data: &[u8], beg: usize) -> Option<(&[u8], LinkRef<'_>, usize)> {
    let len = data.len();
    let (label, mut i) = parse_label(data, beg)?;

    i = skip_spaces(data, i);
    i += newline_len(data, i);
    i = skip_spaces(data, i);
    if i >= len {
        return None;
    }

    let angled = data[i] == b'<';
    if angled {
        i += 1;
    }
    let dest_start = i;
    while i < len && data[i] != b' ' && !is_newline(data[i]) {
        i += 1;
    }
    let dest_end = if angled && i > dest_start && data[i - 1] == b'>' {
        i - 1
    } else {
        i
    };
    if dest_end == dest_start {
        return None;
    }

    i = skip_spaces(data, i);
    let mut line_end = None;
    let mut t = i;
    if i >= len || is_newline(data[i]) {
        line_end = Some(i);
        t = skip_spaces(data, i + newline_len(data, i));
    } else if !matches!(data[i], b'"' | b'\'' | b'(') {
        return None;
    }

    let mut title = None;
    if t < len && matches!(data[t], b'"' | b'\'' | b'(') {
        let close = if data[t] == b'(' { b')' } else { data[t] };
        let title_start = t + 1;
        let mut eol = title_start;
        while eol < len && !is_newline(data[eol]) {
            eol += 1;
        }
        let mut k = eol;
        while k > title_start && data[k - 1] == b' ' {
            k -= 1;
        }
        if k > title_start && data[k - 1] == close {
            title = Some(&data[title_start..k - 1]);
            line_end = Some(eol);
        }
    }

    let def = LinkRef {
        dest: &data[dest_start..dest_end],
        title,
    };
    Some((label, def, line_end?))
}

/// A footnote definition at `beg`.
///
/// Returns the label (without the caret), the de-indented body and the
/// position of the last body line's terminator.
fn parse_footnote_def(data: &[u8], beg: usize) -> Option<(&[u8], Vec<u8>, usize)> {
    let (label, after_colon) = parse_label(data, beg)?;
    let label = label.strip_prefix(b"^").filter(|l| !l.is_empty())?;

    let len = data.len();
    let mut content = Vec::new();
    let mut start = after_colon;
    let mut end = after_colon;
    let mut first = true;
    let mut pending_blank = false;

    while start < len || first {
        let mut eol = start;
        while eol < len && !is_newline(data[eol]) {
            eol += 1;
        }
        let line = &data[start..eol];

        if first {
            expand_tabs(&mut content, &line[skip_spaces(line, 0)..]);
            content.push(b'\n');
            end = eol;
            first = false;
        } else if line.iter().all(|&c| c == b' ' || c == b'\t') {
            pending_blank = true;
        } else {
            let indent = line.iter().take(4).take_while(|&&c| c == b' ').count();
            if indent == 0 {
                break;
            }
            if pending_blank {
                content.push(b'\n');
                pending_blank = false;
            }
            expand_tabs(&mut content, &line[indent..]);
            content.push(b'\n');
            end = eol;
        }

        if eol >= len {
            break;
        }
        start = eol + newline_len(data, eol);
    }

    Some((label, content, end))
}
