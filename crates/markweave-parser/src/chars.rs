//! Active-character table for the span parser.
//!
//! The span parser only stops on bytes that can open a construct. Which
//! bytes those are depends on the extensions in effect and on which span
//! operations the renderer implements, so the table is built once per
//! [`crate::Document`].

use markweave_core::Extensions;

use crate::render::Capabilities;

/// Span handler selected by an active byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveChar {
    Emphasis,
    Codespan,
    Linebreak,
    Link,
    Image,
    Langle,
    Escape,
    Entity,
    AutolinkUrl,
    AutolinkEmail,
    AutolinkWww,
    Superscript,
    Quote,
    Math,
}

/// Byte to handler lookup.
#[derive(Debug, Clone)]
pub struct ActiveChars {
    table: [Option<ActiveChar>; 256],
}

impl ActiveChars {
    pub fn new(extensions: Extensions, caps: Capabilities) -> Self {
        let mut table = [None; 256];
        let mut arm = |bytes: &[u8], handler: ActiveChar| {
            for &b in bytes {
                table[b as usize] = Some(handler);
            }
        };

        if caps.intersects(Capabilities::ANY_EMPHASIS) {
            arm(b"*_", ActiveChar::Emphasis);
        } else if extensions.contains(Extensions::UNDERLINE)
            && caps.contains(Capabilities::UNDERLINE)
        {
            arm(b"_", ActiveChar::Emphasis);
        }
        if extensions.contains(Extensions::STRIKETHROUGH)
            && caps.contains(Capabilities::STRIKETHROUGH)
        {
            arm(b"~", ActiveChar::Emphasis);
        }
        if extensions.contains(Extensions::HIGHLIGHT) && caps.contains(Capabilities::HIGHLIGHT) {
            arm(b"=", ActiveChar::Emphasis);
        }

        if caps.contains(Capabilities::CODESPAN) {
            arm(b"`", ActiveChar::Codespan);
        }
        if caps.contains(Capabilities::LINEBREAK) {
            arm(b"\n", ActiveChar::Linebreak);
        }
        if caps.contains(Capabilities::LINK)
            || (extensions.contains(Extensions::FOOTNOTES)
                && caps.contains(Capabilities::FOOTNOTE_REF))
        {
            arm(b"[", ActiveChar::Link);
        }
        if caps.intersects(Capabilities::IMAGE | Capabilities::LINK) {
            arm(b"!", ActiveChar::Image);
        }
        if caps.intersects(Capabilities::AUTOLINK | Capabilities::RAW_HTML) {
            arm(b"<", ActiveChar::Langle);
        }

        arm(b"\\", ActiveChar::Escape);
        arm(b"&", ActiveChar::Entity);

        if extensions.contains(Extensions::AUTOLINK) {
            if caps.contains(Capabilities::AUTOLINK) {
                arm(b":", ActiveChar::AutolinkUrl);
                arm(b"@", ActiveChar::AutolinkEmail);
            }
            // www. links are emitted through `link`
            if caps.contains(Capabilities::LINK) {
                arm(b"w", ActiveChar::AutolinkWww);
            }
        }
        if extensions.contains(Extensions::SUPERSCRIPT)
            && caps.contains(Capabilities::SUPERSCRIPT)
        {
            arm(b"^", ActiveChar::Superscript);
        }
        if extensions.contains(Extensions::QUOTE) && caps.contains(Capabilities::QUOTE) {
            arm(b"\"", ActiveChar::Quote);
        }
        if extensions.contains(Extensions::MATH) && caps.contains(Capabilities::MATH) {
            arm(b"$", ActiveChar::Math);
        }

        Self { table }
    }

    /// Handler for `b`, if the byte is active.
    #[inline]
    pub fn get(&self, b: u8) -> Option<ActiveChar> {
        self.table[b as usize]
    }

    #[inline]
    pub fn is_active(&self, b: u8) -> bool {
        self.table[b as usize].is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_table() {
        let chars = ActiveChars::new(Extensions::empty(), Capabilities::all());
        assert_eq!(chars.get(b'*'), Some(ActiveChar::Emphasis));
        assert_eq!(chars.get(b'`'), Some(ActiveChar::Codespan));
        assert_eq!(chars.get(b'['), Some(ActiveChar::Link));
        assert_eq!(chars.get(b'\\'), Some(ActiveChar::Escape));
        assert!(!chars.is_active(b'~'));
        assert!(!chars.is_active(b':'));
        assert!(!chars.is_active(b'a'));
    }

    #[test]
    fn test_extensions_arm_bytes() {
        let ext = Extensions::AUTOLINK | Extensions::MATH | Extensions::STRIKETHROUGH;
        let chars = ActiveChars::new(ext, Capabilities::all());
        assert_eq!(chars.get(b'w'), Some(ActiveChar::AutolinkWww));
        assert_eq!(chars.get(b'@'), Some(ActiveChar::AutolinkEmail));
        assert_eq!(chars.get(b'$'), Some(ActiveChar::Math));
        assert_eq!(chars.get(b'~'), Some(ActiveChar::Emphasis));
    }

    #[test]
    fn test_capabilities_disarm_bytes() {
        let caps = Capabilities::all() - Capabilities::CODESPAN - Capabilities::ANY_EMPHASIS;
        let chars = ActiveChars::new(Extensions::empty(), caps);
        assert!(!chars.is_active(b'`'));
        assert!(!chars.is_active(b'*'));
        assert!(chars.is_active(b'&'));
    }
}
