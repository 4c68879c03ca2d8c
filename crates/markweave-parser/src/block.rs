//! Block-level parsing.
//!
//! [`Parser::parse_block`] classifies the text at the cursor, one block
//! at a time, in a fixed order: blank line, ATX header, fenced code,
//! indented code, block quote, list, table, horizontal rule, block HTML,
//! and finally paragraph. Container blocks strip their prefixes into a
//! working buffer and recurse one level deeper.

use std::sync::LazyLock;

use markweave_core::{BlockKind, Extensions, ListFlags, SpanKind, TableFlags};
use regex::bytes::Regex;

use crate::document::Parser;
use crate::inline::find_emph_char;
use crate::render::{Capabilities, Renderer};

static HRULE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})[ \t]*((?-u:.)*)$").unwrap());

static SETEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:=+|-+)[ \t]*$").unwrap());

static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z][A-Za-z0-9]*)[\s/>]").unwrap());

/// Tags that open a block of raw HTML.
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "canvas",
    "dd",
    "del",
    "details",
    "div",
    "dl",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hgroup",
    "iframe",
    "ins",
    "main",
    "math",
    "nav",
    "noscript",
    "ol",
    "p",
    "pre",
    "script",
    "section",
    "style",
    "table",
    "ul",
    "video",
];

// -- line helpers ----------------------------------------------------------

/// Index just past the line starting at `i`.
fn line_end(data: &[u8], i: usize) -> usize {
    data[i..]
        .iter()
        .position(|&c| c == b'\n')
        .map_or(data.len(), |p| i + p + 1)
}

/// The first line of `data`, without its newline.
fn first_line(data: &[u8]) -> &[u8] {
    let end = data.iter().position(|&c| c == b'\n').unwrap_or(data.len());
    &data[..end]
}

fn leading_spaces(data: &[u8], max: usize) -> usize {
    data.iter().take(max).take_while(|&&c| c == b' ').count()
}

fn trim(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|c| !c.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|c| !c.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &data[start..end]
}

fn trim_newlines(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|&c| c != b'\n')
        .map_or(0, |p| p + 1);
    &data[..end]
}

/// Length of the blank line at the start of `data`, or 0.
fn is_empty(data: &[u8]) -> usize {
    for (i, &c) in data.iter().enumerate() {
        match c {
            b'\n' => return i + 1,
            b' ' | b'\t' => {}
            _ => return 0,
        }
    }
    data.len()
}

/// Index past the end of the line if only whitespace follows `i` on it.
fn rest_of_line_blank(data: &[u8], i: usize) -> Option<usize> {
    let rest = &data[i..];
    if rest.is_empty() {
        return Some(i);
    }
    match is_empty(rest) {
        0 => None,
        n => Some(i + n),
    }
}

// -- block predicates ------------------------------------------------------

fn is_hrule(data: &[u8]) -> bool {
    HRULE_RE.is_match(first_line(data))
}

/// Setext underline level: 1 for `=`, 2 for `-`.
fn setext_level(data: &[u8]) -> Option<usize> {
    let line = first_line(data);
    if !SETEXT_RE.is_match(line) {
        return None;
    }
    Some(if line[0] == b'=' { 1 } else { 2 })
}

/// Whether the line after the first one is a setext underline.
fn is_next_headerline(data: &[u8]) -> bool {
    let next = line_end(data, 0);
    next < data.len() && setext_level(&data[next..]).is_some()
}

fn is_atxheader(data: &[u8], extensions: Extensions) -> bool {
    if data.first() != Some(&b'#') {
        return false;
    }
    if extensions.contains(Extensions::SPACE_HEADERS) {
        let level = data.iter().take(6).take_while(|&&c| c == b'#').count();
        return matches!(data.get(level), Some(b' ') | Some(b'\t'));
    }
    true
}

/// Opening fence: marker byte, marker width and language.
fn is_codefence(data: &[u8]) -> Option<(u8, usize, Option<&[u8]>)> {
    let caps = FENCE_RE.captures(first_line(data))?;
    let marker = caps.get(1)?.as_bytes();
    let info = trim(caps.get(2).map_or(&[][..], |m| m.as_bytes()));
    if marker[0] == b'`' && info.contains(&b'`') {
        return None;
    }
    Some((marker[0], marker.len(), fence_lang(info)))
}

/// First word of a fence info string; `{.lang}` braces are unwrapped.
fn fence_lang(info: &[u8]) -> Option<&[u8]> {
    let info = match info.strip_prefix(b"{") {
        Some(rest) => {
            let rest = rest.strip_suffix(b"}").unwrap_or(rest);
            let rest = trim(rest);
            rest.strip_prefix(b".").unwrap_or(rest)
        }
        None => info,
    };
    let word = info
        .split(|c| c.is_ascii_whitespace())
        .next()
        .filter(|w| !w.is_empty())?;
    Some(word)
}

/// Closing fence: marker byte and width, nothing else on the line.
fn closing_fence(data: &[u8]) -> Option<(u8, usize)> {
    let line = first_line(data);
    let indent = leading_spaces(line, 3);
    let rest = &line[indent..];
    let c = *rest.first()?;
    if c != b'`' && c != b'~' {
        return None;
    }
    let width = rest.iter().take_while(|&&b| b == c).count();
    if width < 3 || !rest[width..].iter().all(|&b| b == b' ' || b == b'\t') {
        return None;
    }
    Some((c, width))
}

fn prefix_code(data: &[u8]) -> usize {
    if data.starts_with(b"    ") {
        4
    } else {
        0
    }
}

fn prefix_quote(data: &[u8]) -> usize {
    let i = leading_spaces(data, 3);
    if data.get(i) != Some(&b'>') {
        return 0;
    }
    if data.get(i + 1) == Some(&b' ') {
        i + 2
    } else {
        i + 1
    }
}

/// Bullet item marker length.
fn prefix_uli(data: &[u8]) -> usize {
    let i = leading_spaces(data, 3);
    if i + 1 >= data.len() || !matches!(data[i], b'*' | b'+' | b'-') || data[i + 1] != b' ' {
        return 0;
    }
    if is_next_headerline(&data[i..]) {
        return 0;
    }
    i + 2
}

/// Numbered item marker length.
fn prefix_oli(data: &[u8]) -> usize {
    let mut i = leading_spaces(data, 3);
    let digits = i;
    while i < data.len() && data[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits || i + 1 >= data.len() || data[i] != b'.' || data[i + 1] != b' ' {
        return 0;
    }
    if is_next_headerline(&data[i..]) {
        return 0;
    }
    i + 2
}

/// Whether `data` starts a list; bullet lines that are rules do not.
fn list_start(data: &[u8]) -> Option<bool> {
    if prefix_uli(data) > 0 && !is_hrule(data) {
        Some(false)
    } else if prefix_oli(data) > 0 {
        Some(true)
    } else {
        None
    }
}

/// Number of the first item of an ordered list.
fn start_number(data: &[u8]) -> u32 {
    data.iter()
        .skip_while(|&&c| c == b' ')
        .take_while(|c| c.is_ascii_digit())
        .fold(0u32, |n, &c| n.saturating_mul(10).saturating_add(u32::from(c - b'0')))
}

/// Opening line of a raw HTML block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HtmlStart {
    Comment,
    Rule,
    /// Block-level tag, lowercased
    Block(Vec<u8>),
}

impl HtmlStart {
    /// Lookup key for failed searches for the block's end. A rule ends on
    /// its own line, so its searches are never shared.
    fn key(&self) -> Option<&[u8]> {
        match self {
            HtmlStart::Comment => Some(b"!--"),
            HtmlStart::Rule => None,
            HtmlStart::Block(tag) => Some(tag),
        }
    }
}

/// Start-tag shape of the line at the start of `data`.
fn html_block_start(data: &[u8]) -> Option<HtmlStart> {
    if data.len() < 2 || data[0] != b'<' {
        return None;
    }
    if data.starts_with(b"<!--") {
        return Some(HtmlStart::Comment);
    }

    let caps = HTML_TAG_RE.captures(data)?;
    let tag = caps.get(1)?.as_bytes().to_ascii_lowercase();
    if tag == b"hr" {
        return Some(HtmlStart::Rule);
    }
    BLOCK_TAGS
        .iter()
        .any(|t| t.as_bytes() == tag.as_slice())
        .then_some(HtmlStart::Block(tag))
}

/// Length of the raw HTML block opened by `start` at the start of `data`.
fn html_block_len(data: &[u8], start: &HtmlStart) -> Option<usize> {
    let tag = match start {
        HtmlStart::Comment => {
            let close = data[4..].windows(3).position(|w| w == b"-->")? + 4;
            return rest_of_line_blank(data, close + 3);
        }
        HtmlStart::Rule => {
            let gt = first_line(data).iter().position(|&c| c == b'>')?;
            return rest_of_line_blank(data, gt + 1);
        }
        HtmlStart::Block(tag) => tag,
    };

    // Closing tag with nothing but whitespace after it on its line
    let mut i = 1;
    while let Some(off) = data[i..].windows(2).position(|w| w == b"</") {
        let name_start = i + off + 2;
        let name_end = name_start + tag.len();
        if name_end < data.len()
            && data[name_start..name_end].eq_ignore_ascii_case(tag)
            && data[name_end] == b'>'
        {
            if let Some(end) = rest_of_line_blank(data, name_end + 1) {
                return Some(end);
            }
        }
        i = name_start;
    }
    None
}

/// State shared by the blocks of one block sequence.
#[derive(Debug, Default)]
pub(crate) struct BlockRun {
    /// Length of the sequence; a block at `txt` sits at `len - txt.len()`
    len: usize,
    /// Earliest offset from which no end was found, per HTML block kind
    html_misses: Vec<(Vec<u8>, usize)>,
}

impl BlockRun {
    fn new(len: usize) -> Self {
        Self {
            len,
            ..Self::default()
        }
    }

    fn known_html_miss(&self, key: &[u8], offset: usize) -> bool {
        self.html_misses
            .iter()
            .any(|(k, from)| k.as_slice() == key && *from <= offset)
    }

    fn record_html_miss(&mut self, key: &[u8], offset: usize) {
        match self.html_misses.iter_mut().find(|(k, _)| k.as_slice() == key) {
            Some((_, from)) => *from = (*from).min(offset),
            None => self.html_misses.push((key.to_vec(), offset)),
        }
    }
}

/// Split a table row into trimmed cells, ignoring outer pipes.
fn split_cells(line: &[u8]) -> Vec<&[u8]> {
    let mut line = trim(line);
    if let Some(rest) = line.strip_prefix(b"|") {
        line = rest;
    }
    if line.ends_with(b"|") && !crate::inline::is_escaped(line, line.len() - 1) {
        line = &line[..line.len() - 1];
    }

    let mut cells = Vec::new();
    let mut start = 0;
    while let Some(pipe) = find_emph_char(line, start, b'|') {
        cells.push(trim(&line[start..pipe]));
        start = pipe + 1;
    }
    cells.push(trim(&line[start..]));
    cells
}

fn has_pipe(line: &[u8]) -> bool {
    find_emph_char(line, 0, b'|').is_some()
}

/// Column alignments from a separator row such as `|:--|--:|`.
fn parse_separator(line: &[u8], columns: usize) -> Option<Vec<TableFlags>> {
    let cells = split_cells(line);
    if cells.len() < columns {
        return None;
    }

    cells
        .iter()
        .take(columns)
        .map(|cell| {
            let left = cell.starts_with(b":");
            let right = cell.len() > 1 && cell.ends_with(b":");
            let dashes = &cell[usize::from(left)..cell.len() - usize::from(right)];
            if cell.len() < 3 || dashes.is_empty() || !dashes.iter().all(|&c| c == b'-') {
                return None;
            }
            let mut flags = TableFlags::empty();
            if left {
                flags |= TableFlags::ALIGN_LEFT;
            }
            if right {
                flags |= TableFlags::ALIGN_RIGHT;
            }
            Some(flags)
        })
        .collect()
}

/// One list item with its prefixes stripped.
#[derive(Debug)]
struct ListItem {
    work: Vec<u8>,
    /// Offset in `work` where a nested list begins
    sublist: Option<usize>,
    /// Source bytes consumed
    len: usize,
    /// A blank line separated this item from what follows
    loose: bool,
    /// The list ends after this item
    end_list: bool,
}

impl<R: Renderer> Parser<'_, R> {
    /// Parse `data` as a sequence of blocks into `ob`.
    pub(crate) fn parse_block(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) {
        if depth > self.max_nesting {
            self.literal_paragraph(ob, data, self.max_nesting);
            return;
        }

        self.blocks.push(BlockRun::new(data.len()));
        let mut beg = 0;
        while beg < data.len() {
            let txt = &data[beg..];
            let consumed = self.parse_one_block(ob, txt, depth);
            debug_assert!(consumed > 0, "block parser made no progress");
            beg += consumed.max(1);
        }
        self.blocks.pop();
    }

    fn parse_one_block(&mut self, ob: &mut R::Node, txt: &[u8], depth: usize) -> usize {
        let blank = is_empty(txt);
        if blank > 0 {
            return blank;
        }
        if is_atxheader(txt, self.extensions) {
            return self.parse_atxheader(ob, txt, depth);
        }
        if self.extensions.contains(Extensions::FENCED_CODE) {
            if let Some(n) = self.parse_fencedcode(ob, txt, depth) {
                return n;
            }
        }
        if !self.extensions.contains(Extensions::DISABLE_INDENTED_CODE) && prefix_code(txt) > 0 {
            return self.parse_blockcode(ob, txt, depth);
        }
        if prefix_quote(txt) > 0 {
            return self.parse_blockquote(ob, txt, depth);
        }
        if let Some(ordered) = list_start(txt) {
            return self.parse_list(ob, txt, ordered, depth);
        }
        if self.extensions.contains(Extensions::TABLES) {
            if let Some(n) = self.parse_table(ob, txt, depth) {
                return n;
            }
        }
        if is_hrule(txt) {
            if self.has(Capabilities::HRULE) {
                self.r.hrule(ob, &self.ctx(depth));
            }
            return line_end(txt, 0);
        }
        if self.has(Capabilities::BLOCKHTML) {
            if let Some(n) = self.parse_htmlblock(ob, txt, depth) {
                return n;
            }
        }
        self.parse_paragraph(ob, txt, depth)
    }

    /// Emit `data` as one paragraph of unparsed text.
    fn literal_paragraph(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) {
        log::debug!(
            "block nesting limit {} reached at depth {}, {} bytes kept literal",
            self.max_nesting,
            depth,
            data.len()
        );
        let text = trim(data);
        if text.is_empty() || !self.has(Capabilities::PARAGRAPH) {
            return;
        }
        let mut node = self.new_block(BlockKind::Paragraph, depth);
        self.text(&mut node, text, depth);
        self.r.paragraph(ob, &node, &self.ctx(depth));
        self.free_block(node, BlockKind::Paragraph, depth);
    }

    fn render_paragraph(&mut self, ob: &mut R::Node, text: &[u8], depth: usize) {
        let text = trim(text);
        if text.is_empty() || !self.has(Capabilities::PARAGRAPH) {
            return;
        }
        let mut node = self.new_block(BlockKind::Paragraph, depth);
        self.parse_inline(&mut node, text, depth);
        self.r.paragraph(ob, &node, &self.ctx(depth));
        self.free_block(node, BlockKind::Paragraph, depth);
    }

    fn render_header(
        &mut self,
        ob: &mut R::Node,
        text: &[u8],
        level: usize,
        kind: SpanKind,
        depth: usize,
    ) {
        if !self.has(Capabilities::HEADER) {
            return;
        }
        let mut node = self.new_span(kind, depth);
        self.parse_inline(&mut node, text, depth);
        self.r.header(ob, &node, level, &self.ctx(depth));
        self.free_span(node, kind, depth);
    }

    /// Whether a line ends the paragraph above it.
    fn interrupts_paragraph(&self, line: &[u8]) -> bool {
        is_atxheader(line, self.extensions)
            || is_hrule(line)
            || prefix_quote(line) > 0
            || (self.extensions.contains(Extensions::FENCED_CODE) && is_codefence(line).is_some())
            || (self.has(Capabilities::BLOCKHTML) && html_block_start(line).is_some())
            || list_start(line).is_some()
    }

    fn parse_paragraph(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> usize {
        let mut i = 0;
        let mut consumed = data.len();
        let mut level = 0;

        while i < data.len() {
            let end = line_end(data, i);
            if i > 0 {
                let line = &data[i..];
                if is_empty(line) > 0 {
                    consumed = i;
                    break;
                }
                if let Some(l) = setext_level(line) {
                    level = l;
                    consumed = end;
                    break;
                }
                if self.interrupts_paragraph(line) {
                    consumed = i;
                    break;
                }
            }
            i = end;
        }

        let text = trim_newlines(&data[..i]);
        if level == 0 {
            self.render_paragraph(ob, text, depth);
        } else {
            // Only the last line becomes the header
            let (before, last) = match text.iter().rposition(|&c| c == b'\n') {
                Some(p) => (&text[..p], &text[p + 1..]),
                None => (&text[..0], text),
            };
            self.render_paragraph(ob, before, depth);
            self.render_header(ob, trim(last), level, SpanKind::Header, depth);
        }
        consumed
    }

    fn parse_atxheader(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> usize {
        let line = first_line(data);
        let level = line.iter().take(6).take_while(|&&c| c == b'#').count();

        let mut start = level;
        while start < line.len() && (line[start] == b' ' || line[start] == b'\t') {
            start += 1;
        }
        let mut end = line.len();
        while end > start && (line[end - 1] == b' ' || line[end - 1] == b'\t') {
            end -= 1;
        }
        // Optional closing hashes, when set off by a space
        let mut closing = end;
        while closing > start && line[closing - 1] == b'#' {
            closing -= 1;
        }
        if closing == start || line[closing - 1] == b' ' || line[closing - 1] == b'\t' {
            end = closing;
            while end > start && (line[end - 1] == b' ' || line[end - 1] == b'\t') {
                end -= 1;
            }
        }

        self.render_header(ob, &line[start..end], level, SpanKind::AtxHeader, depth);
        line_end(data, 0)
    }

    fn parse_fencedcode(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> Option<usize> {
        let (marker, width, lang) = is_codefence(data)?;

        let text_start = line_end(data, 0);
        let mut text_end = data.len();
        let mut consumed = data.len();
        let mut i = text_start;
        while i < data.len() {
            let end = line_end(data, i);
            if let Some((c, w)) = closing_fence(&data[i..]) {
                if c == marker && w >= width {
                    text_end = i;
                    consumed = end;
                    break;
                }
            }
            i = end;
        }

        if self.has(Capabilities::BLOCKCODE) {
            self.r
                .blockcode(ob, &data[text_start..text_end], lang, &self.ctx(depth));
        }
        Some(consumed)
    }

    fn parse_blockcode(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> usize {
        let mut work = Vec::new();
        let mut beg = 0;
        while beg < data.len() {
            let end = line_end(data, beg);
            let line = &data[beg..end];
            let pre = prefix_code(line);
            if pre > 0 {
                work.extend_from_slice(&line[pre..]);
            } else if is_empty(line) > 0 {
                work.push(b'\n');
            } else {
                break;
            }
            beg = end;
        }

        let len = trim_newlines(&work).len();
        work.truncate(len);
        work.push(b'\n');

        if self.has(Capabilities::BLOCKCODE) {
            self.r.blockcode(ob, &work, None, &self.ctx(depth));
        }
        beg
    }

    fn parse_blockquote(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> usize {
        let mut work = Vec::new();
        let mut beg = 0;
        while beg < data.len() {
            let end = line_end(data, beg);
            let line = &data[beg..end];
            let pre = prefix_quote(line);
            if pre == 0 && is_empty(line) > 0 {
                // A blank line ends the quote unless more quoted text follows
                let next = &data[end..];
                if next.is_empty() || (prefix_quote(next) == 0 && is_empty(next) == 0) {
                    break;
                }
            }
            work.extend_from_slice(&line[pre..]);
            beg = end;
        }

        if depth + 1 > self.max_nesting {
            self.literal_paragraph(ob, &data[..beg], depth);
            return beg;
        }
        if self.has(Capabilities::BLOCKQUOTE) {
            let mut node = self.new_block(BlockKind::Blockquote, depth);
            self.parse_block(&mut node, &work, depth + 1);
            self.r.blockquote(ob, &node, &self.ctx(depth));
            self.free_block(node, BlockKind::Blockquote, depth);
        }
        beg
    }

    fn scan_listitem(&self, data: &[u8], ordered: bool) -> Option<ListItem> {
        let orgpre = leading_spaces(data, 3);
        let mut beg = prefix_uli(data);
        if beg == 0 {
            beg = prefix_oli(data);
        }
        if beg == 0 {
            return None;
        }

        let fenced = self.extensions.contains(Extensions::FENCED_CODE);
        let mut end = line_end(data, beg);
        let mut work = data[beg..end].to_vec();
        beg = end;

        let mut sublist = None;
        let mut in_empty = false;
        let mut loose = false;
        let mut in_fence = false;
        let mut end_list = false;

        while beg < data.len() {
            end = line_end(data, beg);
            let line = &data[beg..end];
            if is_empty(line) > 0 {
                in_empty = true;
                beg = end;
                continue;
            }

            let pre = leading_spaces(line, 4);
            let rest = &line[pre..];
            if fenced && is_codefence(rest).is_some() {
                in_fence = !in_fence;
            }

            let (next_uli, next_oli) = if in_fence {
                (false, false)
            } else {
                (prefix_uli(rest) > 0, prefix_oli(rest) > 0)
            };

            if (next_uli && !is_hrule(rest)) || next_oli {
                if in_empty {
                    loose = true;
                }
                if pre <= orgpre {
                    // A blank line followed by the other kind of marker
                    // starts a new list
                    if in_empty && ((ordered && next_uli) || (!ordered && next_oli)) {
                        end_list = true;
                        loose = false;
                    }
                    break;
                }
                if sublist.is_none() {
                    sublist = Some(work.len());
                }
            } else if in_empty && pre == 0 {
                end_list = true;
                break;
            }

            if in_empty {
                work.push(b'\n');
                loose = true;
                in_empty = false;
            }
            work.extend_from_slice(rest);
            beg = end;
        }

        Some(ListItem {
            work,
            sublist,
            len: beg,
            loose,
            end_list,
        })
    }

    fn render_listitem(
        &mut self,
        ob: &mut R::Node,
        item: &ListItem,
        flags: ListFlags,
        depth: usize,
    ) {
        if !self.has(Capabilities::LISTITEM) {
            return;
        }

        let mut node = self.new_span(SpanKind::ListItem, depth);
        let inner = depth + 1;
        let work = item.work.as_slice();
        let split = item.sublist.filter(|&s| s < work.len());

        match (flags.contains(ListFlags::BLOCK), split) {
            (true, Some(s)) => {
                self.parse_block(&mut node, &work[..s], inner);
                self.parse_block(&mut node, &work[s..], inner);
            }
            (true, None) => self.parse_block(&mut node, work, inner),
            (false, Some(s)) => {
                self.parse_inline(&mut node, trim_newlines(&work[..s]), inner);
                self.parse_block(&mut node, &work[s..], inner);
            }
            (false, None) => self.parse_inline(&mut node, trim_newlines(work), inner),
        }

        self.r.listitem(ob, &node, flags, &self.ctx(depth));
        self.free_span(node, SpanKind::ListItem, depth);
    }

    fn parse_list(&mut self, ob: &mut R::Node, data: &[u8], ordered: bool, depth: usize) -> usize {
        let mut flags = if ordered {
            ListFlags::ORDERED
        } else {
            ListFlags::empty()
        };
        let start = if ordered { start_number(data) } else { 1 };

        let mut items = Vec::new();
        let mut i = 0;
        while i < data.len() {
            let Some(item) = self.scan_listitem(&data[i..], ordered) else {
                break;
            };
            i += item.len;
            // Once one item is loose, the rest of the list is too
            if item.loose {
                flags |= ListFlags::BLOCK;
            }
            let end_list = item.end_list;
            items.push((item, flags));
            if end_list {
                break;
            }
        }

        if depth + 1 > self.max_nesting {
            self.literal_paragraph(ob, &data[..i], depth);
            return i;
        }
        if !self.has(Capabilities::LIST) {
            return i;
        }

        let mut list = self.new_block(BlockKind::List, depth);
        for (item, item_flags) in &items {
            self.render_listitem(&mut list, item, *item_flags, depth);
        }
        self.r.list(ob, &list, flags, start, &self.ctx(depth));
        self.free_block(list, BlockKind::List, depth);
        i
    }

    fn render_table_row(
        &mut self,
        ob: &mut R::Node,
        line: &[u8],
        aligns: &[TableFlags],
        header: TableFlags,
        depth: usize,
    ) {
        if !self.has(Capabilities::TABLE_ROW) {
            return;
        }

        let cells = split_cells(line);
        let mut row = self.new_span(SpanKind::TableRow, depth);
        for (col, align) in aligns.iter().enumerate() {
            if !self.has(Capabilities::TABLE_CELL) {
                break;
            }
            let cell = cells.get(col).copied().unwrap_or_default();
            let mut node = self.new_span(SpanKind::TableCell, depth);
            self.parse_inline(&mut node, cell, depth + 1);
            self.r
                .table_cell(&mut row, &node, *align | header, &self.ctx(depth));
            self.free_span(node, SpanKind::TableCell, depth);
        }
        self.r.table_row(ob, &row, &self.ctx(depth));
        self.free_span(row, SpanKind::TableRow, depth);
    }

    fn parse_table(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> Option<usize> {
        let header = first_line(data);
        if !has_pipe(header) {
            return None;
        }
        let sep_start = line_end(data, 0);
        if sep_start >= data.len() {
            return None;
        }
        let columns = split_cells(header).len();
        let aligns = parse_separator(first_line(&data[sep_start..]), columns)?;

        let mut rows = Vec::new();
        let mut i = line_end(data, sep_start);
        while i < data.len() {
            let line = first_line(&data[i..]);
            if !has_pipe(line) {
                break;
            }
            rows.push(line);
            i = line_end(data, i);
        }

        if !self.has(Capabilities::TABLE) {
            return Some(i);
        }

        let ctx = self.ctx(depth);
        let mut table = self.new_block(BlockKind::Table, depth);
        if self.has(Capabilities::TABLE_HEADER) {
            let mut head = self.new_span(SpanKind::TableHeader, depth);
            self.render_table_row(&mut head, header, &aligns, TableFlags::HEADER, depth);
            self.r.table_header(&mut table, &head, &ctx);
            self.free_span(head, SpanKind::TableHeader, depth);
        }
        if self.has(Capabilities::TABLE_BODY) {
            let mut body = self.new_block(BlockKind::TableBody, depth);
            for row in rows {
                self.render_table_row(&mut body, row, &aligns, TableFlags::empty(), depth);
            }
            self.r.table_body(&mut table, &body, &ctx);
            self.free_block(body, BlockKind::TableBody, depth);
        }
        self.r.table(ob, &table, &ctx);
        self.free_block(table, BlockKind::Table, depth);
        Some(i)
    }

    fn parse_htmlblock(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) -> Option<usize> {
        let start = html_block_start(data)?;
        let run = self.blocks.last_mut()?;
        let offset = run.len - data.len();
        if let Some(key) = start.key() {
            if run.known_html_miss(key, offset) {
                return None;
            }
        }
        let Some(len) = html_block_len(data, &start) else {
            if let Some(key) = start.key() {
                run.record_html_miss(key, offset);
            }
            return None;
        };
        self.r
            .blockhtml(ob, trim_newlines(&data[..len]), &self.ctx(depth));
        Some(len)
    }

    /// Render the footnote list for every definition referenced so far.
    pub(crate) fn render_footnotes(&mut self, ob: &mut R::Node) {
        if self.usage.is_empty() || !self.has(Capabilities::FOOTNOTES) {
            return;
        }

        let footnotes = self.footnotes;
        let mut list = self.new_block(BlockKind::FootnoteList, 0);
        // Footnote bodies can reference further footnotes
        let mut n = 0;
        while n < self.usage.used().len() {
            let idx = self.usage.used()[n];
            n += 1;
            let Some(note) = footnotes.get(idx) else {
                continue;
            };
            if !self.has(Capabilities::FOOTNOTE_DEF) {
                continue;
            }
            let mut node = self.new_span(SpanKind::FootnoteDef, 1);
            self.parse_block(&mut node, &note.content, 1);
            self.r.footnote_def(&mut list, &node, n, &self.ctx(1));
            self.free_span(node, SpanKind::FootnoteDef, 1);
        }

        log::trace!("rendered {} footnotes", n);
        self.r.footnotes(ob, &list, &self.ctx(0));
        self.free_block(list, BlockKind::FootnoteList, 0);
    }
}
