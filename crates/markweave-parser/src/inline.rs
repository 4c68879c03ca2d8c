//! Span-level parsing.
//!
//! [`Parser::parse_inline`] walks a byte range, copying plain bytes into a
//! pending run and handing control to a handler whenever it meets an armed
//! active byte. A handler returns the position just past the construct it
//! consumed, or `None` when nothing matched, in which case the byte joins
//! the pending run. Handlers flush the pending run themselves so that they
//! can trim it (hard line breaks) or take part of it back (autolinks).

use std::ops::Range;

use markweave_core::{AutolinkType, Extensions, SpanKind};

use crate::autolink;
use crate::chars::ActiveChar;
use crate::document::Parser;
use crate::render::{Capabilities, Renderer};

/// Bytes a backslash may escape.
const ESCAPE_CHARS: &[u8] = b"\\`*_{}[]()#+-.!:|&<>^~=\"$";

/// Whether the byte at `i` is preceded by an odd number of backslashes.
pub(crate) fn is_escaped(data: &[u8], i: usize) -> bool {
    data[..i].iter().rev().take_while(|&&c| c == b'\\').count() % 2 == 1
}

/// Find the next unescaped `c` at or after `from`.
///
/// Code spans are skipped whole, and so are bracketed link texts together
/// with a following `(...)` or `[...]` part. When such a skipped region
/// turns out to be unterminated, the first `c` seen inside it is returned.
pub(crate) fn find_emph_char(data: &[u8], from: usize, c: u8) -> Option<usize> {
    find_emph_char_tracked(data, from, c, &mut Vec::new())
}

/// [`find_emph_char`], also collecting into `shadowed` the start positions
/// from which a fresh search could read the bytes differently because this
/// one stepped over them inside a skipped region.
///
/// Regions that run to the end of `data` without their terminator leave no
/// shadow: the terminator and `c` occur nowhere after them.
fn find_emph_char_tracked(
    data: &[u8],
    from: usize,
    c: u8,
    shadowed: &mut Vec<Range<usize>>,
) -> Option<usize> {
    let size = data.len();
    let mut i = from;
    let mut shade = |start: usize, end: usize| {
        if start + 1 < end {
            shadowed.push(start + 1..end);
        }
    };

    while i < size {
        while i < size && data[i] != c && data[i] != b'[' && data[i] != b'`' {
            i += 1;
        }
        if i >= size {
            return None;
        }
        if is_escaped(data, i) {
            i += 1;
            continue;
        }
        if data[i] == c {
            return Some(i);
        }
        let region = i;

        if data[i] == b'`' {
            let mut span_nb = 0;
            while i < size && data[i] == b'`' {
                i += 1;
                span_nb += 1;
            }
            if i >= size {
                return None;
            }

            let mut bt = 0;
            let mut first = None;
            while i < size && bt < span_nb {
                if first.is_none() && data[i] == c {
                    first = Some(i);
                }
                if data[i] == b'`' {
                    bt += 1;
                } else {
                    bt = 0;
                }
                i += 1;
            }
            if bt < span_nb && i >= size {
                if let Some(f) = first {
                    shade(region, f + 1);
                }
                return first;
            }
            shade(region, i);
        } else {
            let mut first = None;
            i += 1;
            while i < size && data[i] != b']' {
                if first.is_none() && data[i] == c {
                    first = Some(i);
                }
                i += 1;
            }
            if i >= size {
                if let Some(f) = first {
                    shade(region, f + 1);
                }
                return first;
            }
            let text_end = i;
            i += 1;
            while i < size && data[i].is_ascii_whitespace() {
                i += 1;
            }
            let seen = first.map_or(text_end, |f: usize| f.max(text_end)) + 1;
            if i >= size {
                shade(region, seen);
                return first;
            }

            let close = match data[i] {
                b'[' => b']',
                b'(' => b')',
                _ => {
                    if first.is_some() {
                        shade(region, seen);
                        return first;
                    }
                    shade(region, i);
                    continue;
                }
            };
            i += 1;
            while i < size && data[i] != close {
                if first.is_none() && data[i] == c {
                    first = Some(i);
                }
                i += 1;
            }
            if i >= size {
                shade(region, first.map_or(text_end, |f| f.max(text_end)) + 1);
                return first;
            }
            i += 1;
            shade(region, i);
        }
    }
    None
}

/// Closer searches that came up empty within one span run.
///
/// A search that failed from `from` fails again from any later start it
/// walked through in the open, so a later opener of the same shape can
/// give up without rescanning.
#[derive(Debug, Default)]
pub(crate) struct SpanRun {
    /// The run is the whole inline content of a block
    root: bool,
    misses: Vec<Miss>,
    /// Longest backtick run at or after each position, built on first use
    tick_runs: Option<Vec<usize>>,
}

/// Delimiter byte and opener length of a closer search.
type ScanKey = (u8, usize);

#[derive(Debug)]
struct Miss {
    key: ScanKey,
    from: usize,
    shadowed: Vec<Range<usize>>,
}

impl Miss {
    fn covers(&self, pos: usize) -> bool {
        if pos < self.from {
            return false;
        }
        let idx = self.shadowed.partition_point(|r| r.start <= pos);
        idx == 0 || !self.shadowed[idx - 1].contains(&pos)
    }
}

impl SpanRun {
    pub(crate) fn new(root: bool) -> Self {
        Self {
            root,
            ..Self::default()
        }
    }

    fn known_miss(&self, key: ScanKey, from: usize) -> bool {
        self.misses.iter().any(|m| m.key == key && m.covers(from))
    }

    fn record_miss(&mut self, key: ScanKey, from: usize, shadowed: Vec<Range<usize>>) {
        self.misses.retain(|m| m.key != key);
        self.misses.push(Miss {
            key,
            from,
            shadowed,
        });
    }

    /// Length of the longest run of backticks in `data[from..]`.
    fn longest_tick_run(&mut self, data: &[u8], from: usize) -> usize {
        let runs = self.tick_runs.get_or_insert_with(|| {
            let mut best = vec![0; data.len() + 1];
            let mut cur = 0;
            for i in (0..data.len()).rev() {
                cur = if data[i] == b'`' { cur + 1 } else { 0 };
                best[i] = best[i + 1].max(cur);
            }
            best
        });
        runs.get(from).copied().unwrap_or(0)
    }
}

/// Copy `src` dropping the backslash of every escape pair.
pub(crate) fn unescape(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        if src[i] == b'\\' {
            if i + 1 >= src.len() {
                break;
            }
            out.push(src[i + 1]);
            i += 2;
        } else {
            out.push(src[i]);
            i += 1;
        }
    }
    out
}

fn run_length(data: &[u8], c: u8) -> usize {
    data.iter().take_while(|&&b| b == c).count()
}

fn is_blank(data: &[u8]) -> bool {
    data.iter().all(|c| c.is_ascii_whitespace())
}

/// Shape of a matched emphasis run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmphStrength {
    Single,
    Double,
    Triple,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EmphMatch {
    strength: EmphStrength,
    /// Content range relative to the opener
    content: Range<usize>,
    /// Bytes consumed from the opener on
    len: usize,
}

/// Destination and title of a resolved link.
struct LinkTarget {
    dest: Vec<u8>,
    title: Option<Vec<u8>>,
    /// Bytes consumed from the opening bracket on
    len: usize,
}

impl<R: Renderer> Parser<'_, R> {
    /// Parse `data` as inline content into `ob`.
    pub(crate) fn parse_inline(&mut self, ob: &mut R::Node, data: &[u8], depth: usize) {
        if depth > self.max_nesting {
            log::debug!(
                "span nesting limit {} reached, {} bytes kept literal",
                self.max_nesting,
                data.len()
            );
            self.text(ob, data, self.max_nesting);
            return;
        }

        let root = self.runs.is_empty();
        self.runs.push(SpanRun::new(root));

        let mut run = 0;
        let mut i = 0;
        while i < data.len() {
            while i < data.len() && !self.chars.is_active(data[i]) {
                i += 1;
            }
            let Some(action) = data.get(i).and_then(|&b| self.chars.get(b)) else {
                break;
            };

            match self.dispatch(action, ob, data, i, run, depth) {
                Some(next) => {
                    debug_assert!(next > i, "span handler made no progress");
                    i = next;
                    run = next;
                }
                None => i += 1,
            }
        }

        self.flush(ob, &data[run..], depth);
        self.runs.pop();
    }

    fn dispatch(
        &mut self,
        action: ActiveChar,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        match action {
            ActiveChar::Emphasis => self.char_emphasis(ob, data, pos, run, depth),
            ActiveChar::Codespan => self.char_codespan(ob, data, pos, run, depth),
            ActiveChar::Linebreak => self.char_linebreak(ob, data, pos, run, depth),
            ActiveChar::Link => self.char_link(ob, data, pos, run, depth, false),
            ActiveChar::Image => {
                if data.get(pos + 1) != Some(&b'[') {
                    return None;
                }
                self.char_link(ob, data, pos + 1, run, depth, true)
            }
            ActiveChar::Langle => self.char_langle(ob, data, pos, run, depth),
            ActiveChar::Escape => self.char_escape(ob, data, pos, run, depth),
            ActiveChar::Entity => self.char_entity(ob, data, pos, run, depth),
            ActiveChar::AutolinkUrl => self.char_autolink_url(ob, data, pos, run, depth),
            ActiveChar::AutolinkEmail => self.char_autolink_email(ob, data, pos, run, depth),
            ActiveChar::AutolinkWww => self.char_autolink_www(ob, data, pos, run, depth),
            ActiveChar::Superscript => self.char_superscript(ob, data, pos, run, depth),
            ActiveChar::Quote => self.char_quote(ob, data, pos, run, depth),
            ActiveChar::Math => self.char_math(ob, data, pos, run, depth),
        }
    }

    fn flush(&self, ob: &mut R::Node, text: &[u8], depth: usize) {
        if !text.is_empty() {
            self.text(ob, text, depth);
        }
    }

    /// Emit a span whose content is itself parsed as inline text.
    ///
    /// `source` is written verbatim when the renderer lacks `cap` or
    /// declines the call.
    #[allow(clippy::too_many_arguments)]
    fn emit_nested<F>(
        &mut self,
        ob: &mut R::Node,
        kind: SpanKind,
        cap: Capabilities,
        content: &[u8],
        source: &[u8],
        depth: usize,
        call: F,
    ) where
        F: FnOnce(&R, &mut R::Node, &R::Node, &crate::render::Context) -> bool,
    {
        if self.has(cap) {
            let ctx = self.ctx(depth);
            let mut node = self.new_span(kind, depth);
            self.parse_inline(&mut node, content, depth + 1);
            let handled = call(self.r, ob, &node, &ctx);
            self.free_span(node, kind, depth);
            if handled {
                return;
            }
        }
        self.text(ob, source, depth);
    }

    // -- emphasis ---------------------------------------------------------

    fn intra_blocked(&self, data: &[u8], c: u8, after: usize) -> bool {
        c == b'_'
            && self.extensions.contains(Extensions::NO_INTRA_EMPHASIS)
            && data.get(after).is_some_and(|b| b.is_ascii_alphanumeric())
    }

    /// Search for the next closer of `key` from `from`, skipping searches
    /// already known to fail. `accept` sees each candidate position and run
    /// length; it returns the closer position, or `None` to keep looking.
    fn find_closer<F>(&mut self, data: &[u8], key: ScanKey, from: usize, accept: F) -> Option<usize>
    where
        F: Fn(&Self, usize, usize) -> Option<usize>,
    {
        if self.runs.last().is_some_and(|r| r.known_miss(key, from)) {
            return None;
        }

        let c = key.0;
        let mut shadowed = Vec::new();
        let mut next = from;
        loop {
            let Some(i) = find_emph_char_tracked(data, next, c, &mut shadowed) else {
                if let Some(run) = self.runs.last_mut() {
                    run.record_miss(key, from, shadowed);
                }
                return None;
            };
            let run = run_length(&data[i..], c);
            if let Some(close) = accept(&*self, i, run) {
                return Some(close);
            }
            next = i + run;
        }
    }

    /// Closer of a single-character run whose content starts at `from`.
    fn scan_emph1(&mut self, data: &[u8], c: u8, from: usize) -> Option<usize> {
        self.find_closer(data, (c, 1), from, |p, i, run| {
            // Double runs close an inner strong span
            if data[i - 1].is_ascii_whitespace() || run == 2 {
                return None;
            }
            let close = i + run - 1;
            (!p.intra_blocked(data, c, close + 1)).then_some(close)
        })
    }

    /// First byte of the closer of a double run whose content starts at
    /// `from`.
    fn scan_emph2(&mut self, data: &[u8], c: u8, from: usize) -> Option<usize> {
        self.find_closer(data, (c, 2), from, |p, i, run| {
            if data[i - 1].is_ascii_whitespace() || run == 1 {
                return None;
            }
            let close = i + run - 2;
            (!p.intra_blocked(data, c, close + 2)).then_some(close)
        })
    }

    /// Resolve a triple run opened at `data[pos..pos + 3]`.
    ///
    /// A closing run of one or two characters hands over to the double or
    /// single scanner so that `***a**b*` and `***a*b**` nest.
    fn scan_emph3(&mut self, data: &[u8], c: u8, pos: usize) -> Option<EmphMatch> {
        let i = self.find_closer(data, (c, 3), pos + 3, |p, i, run| {
            let blocked = data[i - 1].is_ascii_whitespace() || p.intra_blocked(data, c, i + run);
            (!blocked).then_some(i)
        })?;
        let m = match run_length(&data[i..], c) {
            1 => {
                let close = self.scan_emph2(data, c, i + 1)? - pos;
                EmphMatch {
                    strength: EmphStrength::Double,
                    content: 2..close,
                    len: close + 2,
                }
            }
            2 => {
                let close = self.scan_emph1(data, c, i + 2)? - pos;
                EmphMatch {
                    strength: EmphStrength::Single,
                    content: 1..close,
                    len: close + 1,
                }
            }
            _ => EmphMatch {
                strength: EmphStrength::Triple,
                content: 3..i - pos,
                len: i - pos + 3,
            },
        };
        Some(m)
    }

    fn char_emphasis(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let c = data[pos];
        if c == b'_'
            && self.extensions.contains(Extensions::NO_INTRA_EMPHASIS)
            && pos > 0
            && data[pos - 1].is_ascii_alphanumeric()
        {
            return None;
        }

        let src = &data[pos..];
        let n = src.iter().take(4).take_while(|&&b| b == c).count();
        if n > 3 || src.len() <= n || src[n].is_ascii_whitespace() {
            return None;
        }
        if (c == b'~' || c == b'=') && n != 2 {
            return None;
        }

        let m = match n {
            1 => {
                let close = self.scan_emph1(data, c, pos + 1)? - pos;
                EmphMatch {
                    strength: EmphStrength::Single,
                    content: 1..close,
                    len: close + 1,
                }
            }
            2 => {
                let close = self.scan_emph2(data, c, pos + 2)? - pos;
                EmphMatch {
                    strength: EmphStrength::Double,
                    content: 2..close,
                    len: close + 2,
                }
            }
            _ => self.scan_emph3(data, c, pos)?,
        };
        if m.content.is_empty() {
            return None;
        }

        self.flush(ob, &data[run..pos], depth);
        let content = &src[m.content.clone()];
        let source = &src[..m.len];
        let underline = c == b'_' && self.extensions.contains(Extensions::UNDERLINE);

        match (m.strength, c) {
            (EmphStrength::Single, _) if underline => self.emit_nested(
                ob,
                SpanKind::Underline,
                Capabilities::UNDERLINE,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.underline(ob, node, ctx),
            ),
            (EmphStrength::Single, _) => self.emit_nested(
                ob,
                SpanKind::Emph1,
                Capabilities::EMPHASIS,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.emphasis(ob, node, ctx),
            ),
            (EmphStrength::Double, b'~') => self.emit_nested(
                ob,
                SpanKind::Strikethrough,
                Capabilities::STRIKETHROUGH,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.strikethrough(ob, node, ctx),
            ),
            (EmphStrength::Double, b'=') => self.emit_nested(
                ob,
                SpanKind::Highlight,
                Capabilities::HIGHLIGHT,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.highlight(ob, node, ctx),
            ),
            (EmphStrength::Double, _) => self.emit_nested(
                ob,
                SpanKind::Emph2,
                Capabilities::DOUBLE_EMPHASIS,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.double_emphasis(ob, node, ctx),
            ),
            (EmphStrength::Triple, _) => self.emit_nested(
                ob,
                SpanKind::Emph3,
                Capabilities::TRIPLE_EMPHASIS,
                content,
                source,
                depth,
                |r, ob, node, ctx| r.triple_emphasis(ob, node, ctx),
            ),
        }

        Some(pos + m.len)
    }

    // -- code, breaks -----------------------------------------------------

    fn char_codespan(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let mut nb = run_length(&data[pos..], b'`');
        let longest = self
            .runs
            .last_mut()
            .map_or(nb, |r| r.longest_tick_run(data, pos + nb));
        if longest == 0 {
            self.flush(ob, &data[run..pos], depth);
            self.text(ob, &data[pos..pos + nb], depth);
            return Some(pos + nb);
        }
        // Only a run as long as the longest one ahead can be closed; the
        // extra backticks in front stay literal
        let (pos, run) = if longest < nb {
            let skip = nb - longest;
            self.flush(ob, &data[run..pos], depth);
            self.text(ob, &data[pos..pos + skip], depth);
            nb = longest;
            (pos + skip, pos + skip)
        } else {
            (pos, run)
        };

        let src = &data[pos..];
        let mut end = nb;
        let mut closing = 0;
        while end < src.len() && closing < nb {
            if src[end] == b'`' {
                closing += 1;
            } else {
                closing = 0;
            }
            end += 1;
        }
        if closing < nb {
            return None;
        }

        let mut text_start = nb;
        while text_start < end && src[text_start] == b' ' {
            text_start += 1;
        }
        let mut text_end = end - nb;
        while text_end > nb && src[text_end - 1] == b' ' {
            text_end -= 1;
        }
        let text = if text_start < text_end {
            &src[text_start..text_end]
        } else {
            &[][..]
        };

        self.flush(ob, &data[run..pos], depth);
        if !self.r.codespan(ob, text, &self.ctx(depth)) {
            self.text(ob, &src[..end], depth);
        }
        Some(pos + end)
    }

    fn char_linebreak(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if pos < run + 2 || data[pos - 1] != b' ' || data[pos - 2] != b' ' {
            return None;
        }

        let mut text_end = pos;
        while text_end > run && data[text_end - 1] == b' ' {
            text_end -= 1;
        }
        self.flush(ob, &data[run..text_end], depth);
        if !self.r.linebreak(ob, &self.ctx(depth)) {
            self.text(ob, &data[text_end..=pos], depth);
        }
        Some(pos + 1)
    }

    // -- links and images -------------------------------------------------

    /// Destination and title of an inline link, `open` at the `(`.
    fn scan_inline_target(src: &[u8], open: usize) -> Option<LinkTarget> {
        let size = src.len();
        let mut i = open + 1;
        while i < size && src[i].is_ascii_whitespace() {
            i += 1;
        }
        let mut link_b = i;

        let mut parens = 0usize;
        while i < size {
            match src[i] {
                b'\\' => i += 2,
                b'(' => {
                    parens += 1;
                    i += 1;
                }
                b')' => {
                    if parens == 0 {
                        break;
                    }
                    parens -= 1;
                    i += 1;
                }
                b'\'' | b'"' if src[i - 1].is_ascii_whitespace() => break,
                _ => i += 1,
            }
        }
        if i >= size {
            return None;
        }

        let mut link_e = i;
        let mut title = None;
        if src[i] == b'\'' || src[i] == b'"' {
            let quote = src[i];
            let mut in_title = true;
            i += 1;
            let title_b = i;
            while i < size {
                match src[i] {
                    b'\\' => i += 2,
                    c if c == quote => {
                        in_title = !in_title;
                        i += 1;
                    }
                    b')' if !in_title => break,
                    _ => i += 1,
                }
            }
            if i >= size {
                return None;
            }

            let mut title_e = i;
            while title_e > title_b && src[title_e - 1].is_ascii_whitespace() {
                title_e -= 1;
            }
            if title_e > title_b && src[title_e - 1] == quote {
                title = Some(src[title_b..title_e - 1].to_vec());
            } else {
                link_e = i;
            }
        }

        while link_e > link_b && src[link_e - 1].is_ascii_whitespace() {
            link_e -= 1;
        }
        if link_e >= link_b + 2 && src[link_b] == b'<' && src[link_e - 1] == b'>' {
            link_b += 1;
            link_e -= 1;
        }

        Some(LinkTarget {
            dest: unescape(&src[link_b..link_e]),
            title,
            len: i + 1,
        })
    }

    /// Resolve the part after the link text, `txt_e` at the closing `]`.
    fn scan_link_target(&self, src: &[u8], txt_e: usize) -> Option<LinkTarget> {
        let size = src.len();
        let mut i = txt_e + 1;
        while i < size && src[i].is_ascii_whitespace() {
            i += 1;
        }

        let (label, len) = match src.get(i) {
            Some(b'(') => return Self::scan_inline_target(src, i),
            Some(b'[') => {
                let label_b = i + 1;
                let label_e = label_b + src[label_b..].iter().position(|&c| c == b']')?;
                let label = if label_b == label_e {
                    &src[1..txt_e]
                } else {
                    &src[label_b..label_e]
                };
                (label, label_e + 1)
            }
            _ => (&src[1..txt_e], txt_e + 1),
        };

        let def = self.links.get(label)?;
        Some(LinkTarget {
            dest: unescape(def.dest),
            title: def.title.map(<[u8]>::to_vec),
            len,
        })
    }

    fn char_footnote_ref(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if !self.has(Capabilities::FOOTNOTE_REF) {
            return None;
        }
        let src = &data[pos..];
        let txt_e = self.find_closer(data, (b']', 0), pos + 1, |_, i, _| Some(i))? - pos;
        if txt_e < 3 {
            return None;
        }
        let idx = self.footnotes.find(&src[2..txt_e])?;
        let num = self.usage.number(idx);

        self.flush(ob, &data[run..pos], depth);
        if !self.r.footnote_ref(ob, num, &self.ctx(depth)) {
            self.text(ob, &src[..=txt_e], depth);
        }
        Some(pos + txt_e + 1)
    }

    /// `[` handler; `pos` is the bracket, preceded by `!` for images.
    fn char_link(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
        is_img: bool,
    ) -> Option<usize> {
        let src = &data[pos..];
        if !is_img
            && self.extensions.contains(Extensions::FOOTNOTES)
            && src.get(1) == Some(&b'^')
        {
            return self.char_footnote_ref(ob, data, pos, run, depth);
        }
        if !is_img && self.in_link_body {
            return None;
        }

        let txt_e = self.find_closer(data, (b']', 0), pos + 1, |_, i, _| Some(i))? - pos;
        let target = self.scan_link_target(src, txt_e)?;
        let start = if is_img { pos - 1 } else { pos };
        let source = &data[start..pos + target.len];
        let text = &src[1..txt_e];
        let ctx = self.ctx(depth);

        self.flush(ob, &data[run..start], depth);
        if is_img {
            let handled = self.has(Capabilities::IMAGE)
                && self
                    .r
                    .image(ob, &target.dest, target.title.as_deref(), text, &ctx);
            if !handled {
                self.text(ob, source, depth);
            }
        } else if self.has(Capabilities::LINK) {
            let mut content = self.new_span(SpanKind::Link, depth);
            let saved = self.in_link_body;
            self.in_link_body = true;
            self.parse_inline(&mut content, text, depth + 1);
            self.in_link_body = saved;

            let handled = self
                .r
                .link(ob, &content, &target.dest, target.title.as_deref(), &ctx);
            self.free_span(content, SpanKind::Link, depth);
            if !handled {
                self.text(ob, source, depth);
            }
        } else {
            self.text(ob, source, depth);
        }
        Some(pos + target.len)
    }

    // -- angle brackets ---------------------------------------------------

    fn char_langle(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        let (end, kind) = tag_length(src)?;
        if end <= 2 {
            return None;
        }

        self.flush(ob, &data[run..pos], depth);
        let ctx = self.ctx(depth);
        let handled = match kind {
            Some(kind) => {
                self.has(Capabilities::AUTOLINK)
                    && self.r.autolink(ob, &unescape(&src[1..end - 1]), kind, &ctx)
            }
            None => self.has(Capabilities::RAW_HTML) && self.r.raw_html(ob, &src[..end], &ctx),
        };
        if !handled {
            self.text(ob, &src[..end], depth);
        }
        Some(pos + end)
    }

    // -- escapes and entities ---------------------------------------------

    fn char_escape(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        if src.len() < 2 {
            return None;
        }

        if src[1] == b'\\'
            && self.extensions.contains(Extensions::MATH)
            && self.has(Capabilities::MATH)
        {
            let delim: Option<(&[u8], bool)> = match src.get(2) {
                Some(b'(') => Some((b"\\\\)", false)),
                Some(b'[') => Some((b"\\\\]", true)),
                _ => None,
            };
            if let Some((close, display)) = delim {
                if let Some(end) = self.parse_math(ob, data, pos, run, close, 3, display, depth) {
                    return Some(end);
                }
            }
        }

        if !ESCAPE_CHARS.contains(&src[1]) {
            return None;
        }
        self.flush(ob, &data[run..pos], depth);
        self.text(ob, &src[1..2], depth);
        Some(pos + 2)
    }

    fn char_entity(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        let mut end = 1;
        if src.get(end) == Some(&b'#') {
            end += 1;
        }
        let name_start = end;
        while end < src.len() && src[end].is_ascii_alphanumeric() {
            end += 1;
        }
        if end == name_start || src.get(end) != Some(&b';') {
            return None;
        }
        end += 1;

        self.flush(ob, &data[run..pos], depth);
        let ctx = self.ctx(depth);
        if self.has(Capabilities::ENTITY) {
            self.r.entity(ob, &src[..end], &ctx);
        } else {
            self.r.normal_text(ob, &src[..end], &ctx);
        }
        Some(pos + end)
    }

    // -- bare autolinks ---------------------------------------------------

    fn char_autolink_url(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if self.in_link_body {
            return None;
        }
        let m = autolink::scan_url(data, pos, pos - run)?;
        self.emit_autolink(ob, data, pos, run, m, AutolinkType::Normal, depth)
    }

    fn char_autolink_email(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if self.in_link_body {
            return None;
        }
        let m = autolink::scan_email(data, pos, pos - run)?;
        self.emit_autolink(ob, data, pos, run, m, AutolinkType::Email, depth)
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_autolink(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        m: autolink::AutolinkMatch,
        kind: AutolinkType,
        depth: usize,
    ) -> Option<usize> {
        let link = m.link(data, pos);
        self.flush(ob, &data[run..pos - m.rewind], depth);
        if !self.r.autolink(ob, link, kind, &self.ctx(depth)) {
            self.text(ob, link, depth);
        }
        Some(pos + m.end)
    }

    fn char_autolink_www(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if self.in_link_body {
            return None;
        }
        let m = autolink::scan_www(data, pos, pos - run)?;
        let link = m.link(data, pos);
        let mut dest = b"http://".to_vec();
        dest.extend_from_slice(link);

        self.flush(ob, &data[run..pos - m.rewind], depth);
        let ctx = self.ctx(depth);
        let mut content = self.new_span(SpanKind::Link, depth);
        self.text(&mut content, link, depth);
        let handled = self.r.link(ob, &content, &dest, None, &ctx);
        self.free_span(content, SpanKind::Link, depth);
        if !handled {
            self.text(ob, link, depth);
        }
        Some(pos + m.end)
    }

    // -- superscript, quotes, math ----------------------------------------

    fn char_superscript(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        if src.len() < 2 {
            return None;
        }

        let (content, len) = if src[1] == b'(' {
            let close = self.find_closer(data, (b')', 0), pos + 2, |_, i, _| Some(i))? - pos;
            (2..close, close + 1)
        } else {
            let end = 1 + src[1..]
                .iter()
                .position(|c| c.is_ascii_whitespace())
                .unwrap_or(src.len() - 1);
            (1..end, end)
        };
        if content.is_empty() {
            return None;
        }

        self.flush(ob, &data[run..pos], depth);
        self.emit_nested(
            ob,
            SpanKind::Superscript,
            Capabilities::SUPERSCRIPT,
            &src[content],
            &src[..len],
            depth,
            |r, ob, node, ctx| r.superscript(ob, node, ctx),
        );
        Some(pos + len)
    }

    fn char_quote(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        let nq = run_length(src, b'"');

        let close = self.find_closer(data, (b'"', nq), pos + nq, |_, i, run| {
            (run >= nq).then_some(i)
        })?;
        let end = close - pos + nq;

        let mut text_start = nq;
        while text_start < end && src[text_start] == b' ' {
            text_start += 1;
        }
        let mut text_end = end - nq;
        while text_end > nq && src[text_end - 1] == b' ' {
            text_end -= 1;
        }
        let content = if text_start < text_end {
            &src[text_start..text_end]
        } else {
            &[][..]
        };

        self.flush(ob, &data[run..pos], depth);
        self.emit_nested(
            ob,
            SpanKind::Quote,
            Capabilities::QUOTE,
            content,
            &src[..end],
            depth,
            |r, ob, node, ctx| r.quote(ob, node, ctx),
        );
        Some(pos + end)
    }

    fn char_math(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        depth: usize,
    ) -> Option<usize> {
        if data.get(pos + 1) == Some(&b'$') {
            return self.parse_math(ob, data, pos, run, b"$$", 2, true, depth);
        }
        if self.extensions.contains(Extensions::MATH_EXPLICIT) {
            return self.parse_math(ob, data, pos, run, b"$", 1, false, depth);
        }
        None
    }

    /// Math span opened by a `delim_len`-byte delimiter at `pos`, closed
    /// by `close`.
    #[allow(clippy::too_many_arguments)]
    fn parse_math(
        &mut self,
        ob: &mut R::Node,
        data: &[u8],
        pos: usize,
        run: usize,
        close: &[u8],
        delim_len: usize,
        display: bool,
        depth: usize,
    ) -> Option<usize> {
        let src = &data[pos..];
        let mut i = delim_len;
        loop {
            i += src[i..].iter().position(|&c| c == close[0])?;
            if !is_escaped(src, i) && src[i..].starts_with(close) {
                break;
            }
            i += 1;
        }

        let text = &src[delim_len..i];
        let end = i + close.len();
        let display = if delim_len == 2 && !self.extensions.contains(Extensions::MATH_EXPLICIT) {
            // Display only when alone in the block, not merely in this span
            self.runs.last().is_some_and(|r| r.root)
                && is_blank(&data[..pos])
                && is_blank(&src[end..])
        } else {
            display
        };

        self.flush(ob, &data[run..pos], depth);
        if !self.r.math(ob, text, display, &self.ctx(depth)) {
            self.text(ob, &src[..end], depth);
        }
        Some(pos + end)
    }
}

/// Length of an HTML tag or `<...>` autolink at the start of `data`.
///
/// The second value is the autolink type when the bracket holds a URL or
/// an e-mail address rather than markup.
fn tag_length(data: &[u8]) -> Option<(usize, Option<AutolinkType>)> {
    let size = data.len();
    if size < 3 || data[0] != b'<' {
        return None;
    }

    if size > 5 && data.starts_with(b"<!--") {
        let mut i = 5;
        while i < size && !(data[i - 2] == b'-' && data[i - 1] == b'-' && data[i] == b'>') {
            i += 1;
        }
        if i < size {
            return Some((i + 1, None));
        }
    }

    let mut i = if data[1] == b'/' { 2 } else { 1 };
    if !data.get(i).is_some_and(|c| c.is_ascii_alphanumeric()) {
        return None;
    }

    while i < size && (data[i].is_ascii_alphanumeric() || b".+-".contains(&data[i])) {
        i += 1;
    }

    let mut kind = None;
    if i > 1 && data.get(i) == Some(&b'@') {
        if let Some(j) = mail_autolink_length(&data[i..]) {
            return Some((i + j, Some(AutolinkType::Email)));
        }
    }
    if i > 2 && data.get(i) == Some(&b':') {
        kind = Some(AutolinkType::Normal);
        i += 1;
    }

    if i >= size {
        kind = None;
    } else if kind.is_some() {
        let start = i;
        while i < size {
            match data[i] {
                b'\\' => i += 2,
                b'>' | b'\'' | b'"' | b' ' | b'\n' => break,
                _ => i += 1,
            }
        }
        if i >= size {
            return None;
        }
        if i > start && data[i] == b'>' {
            return Some((i + 1, kind));
        }
        kind = None;
    }

    let gt = i + data[i..].iter().position(|&c| c == b'>')?;
    Some((gt + 1, kind))
}

/// Length of the rest of a `<user@host>` address starting at the `@`.
fn mail_autolink_length(data: &[u8]) -> Option<usize> {
    let mut ats = 0;
    for (i, &c) in data.iter().enumerate() {
        match c {
            b'@' => ats += 1,
            b'-' | b'.' | b'_' => {}
            b'>' => return (ats == 1).then_some(i + 1),
            c if c.is_ascii_alphanumeric() => {}
            _ => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_escaped() {
        assert!(is_escaped(b"a\\*", 2));
        assert!(!is_escaped(b"a\\\\*", 3));
        assert!(!is_escaped(b"*", 0));
    }

    #[test]
    fn test_find_emph_char() {
        assert_eq!(find_emph_char(b"*a*", 1, b'*'), Some(2));
        assert_eq!(find_emph_char(b"*a\\*b*", 1, b'*'), Some(5));
        // skips code spans
        assert_eq!(find_emph_char(b"*a `*` b*", 1, b'*'), Some(8));
        // skips link text and destination
        assert_eq!(find_emph_char(b"*[a*](b*) c*", 1, b'*'), Some(11));
        assert_eq!(find_emph_char(b"*abc", 1, b'*'), None);
    }

    #[test]
    fn test_find_emph_char_unterminated_code() {
        assert_eq!(find_emph_char(b"x `a*b", 1, b'*'), Some(4));
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(b"a\\(b\\)"), b"a(b)".to_vec());
        assert_eq!(unescape(b"a\\\\b"), b"a\\b".to_vec());
        assert_eq!(unescape(b"tail\\"), b"tail".to_vec());
    }

    #[test]
    fn test_tag_length() {
        assert_eq!(tag_length(b"<b>x"), Some((3, None)));
        assert_eq!(tag_length(b"</em>"), Some((5, None)));
        assert_eq!(tag_length(b"<!-- c -->x"), Some((10, None)));
        assert_eq!(
            tag_length(b"<http://a.b/c> x"),
            Some((14, Some(AutolinkType::Normal)))
        );
        assert_eq!(
            tag_length(b"<me@example.com>"),
            Some((16, Some(AutolinkType::Email)))
        );
        assert_eq!(tag_length(b"< b>"), None);
        assert_eq!(tag_length(b"<b"), None);
    }

    #[test]
    fn test_mail_autolink_length() {
        assert_eq!(mail_autolink_length(b"@b.c>"), Some(5));
        assert_eq!(mail_autolink_length(b"@b@c>"), None);
        assert_eq!(mail_autolink_length(b"@b c>"), None);
    }
}
