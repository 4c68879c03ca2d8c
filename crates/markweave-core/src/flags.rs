//! Flag sets: grammar extensions and per-node metadata.

use bitflags::bitflags;

use crate::enums::Alignment;
use crate::error::{Error, Result};

bitflags! {
    /// Independently togglable grammar extensions.
    ///
    /// Extensions are additive, except for the negative flags which
    /// suppress a baseline rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Extensions: u32 {
        /// Pipe tables
        const TABLES = 1 << 0;
        /// ``` and ~~~ fenced code blocks
        const FENCED_CODE = 1 << 1;
        /// [^label] footnotes
        const FOOTNOTES = 1 << 2;

        /// Bare URL, www. and e-mail detection
        const AUTOLINK = 1 << 3;
        /// ~~strikethrough~~
        const STRIKETHROUGH = 1 << 4;
        /// _underline_ instead of emphasis for single underscores
        const UNDERLINE = 1 << 5;
        /// ==highlight==
        const HIGHLIGHT = 1 << 6;
        /// "quote"
        const QUOTE = 1 << 7;
        /// ^superscript
        const SUPERSCRIPT = 1 << 8;
        /// $$math$$
        const MATH = 1 << 9;

        /// Underscore emphasis only at word boundaries
        const NO_INTRA_EMPHASIS = 1 << 11;
        /// ATX headers need a space after the hashes
        const SPACE_HEADERS = 1 << 12;
        /// Single-dollar inline math, $$ is always display math
        const MATH_EXPLICIT = 1 << 13;

        /// No indented code blocks
        const DISABLE_INDENTED_CODE = 1 << 14;

        /// Block-level extensions
        const BLOCK = Self::TABLES.bits() | Self::FENCED_CODE.bits() | Self::FOOTNOTES.bits();
        /// Span-level extensions
        const SPAN = Self::AUTOLINK.bits()
            | Self::STRIKETHROUGH.bits()
            | Self::UNDERLINE.bits()
            | Self::HIGHLIGHT.bits()
            | Self::QUOTE.bits()
            | Self::SUPERSCRIPT.bits()
            | Self::MATH.bits();
        /// Behaviour flags
        const BEHAVIOR = Self::NO_INTRA_EMPHASIS.bits()
            | Self::SPACE_HEADERS.bits()
            | Self::MATH_EXPLICIT.bits();
        /// Flags that switch off a baseline rule
        const NEGATIVE = Self::DISABLE_INDENTED_CODE.bits();
    }
}

/// Kebab-case names used by configuration files and the command line.
const EXTENSION_NAMES: &[(&str, Extensions)] = &[
    ("tables", Extensions::TABLES),
    ("fenced-code", Extensions::FENCED_CODE),
    ("footnotes", Extensions::FOOTNOTES),
    ("autolink", Extensions::AUTOLINK),
    ("strikethrough", Extensions::STRIKETHROUGH),
    ("underline", Extensions::UNDERLINE),
    ("highlight", Extensions::HIGHLIGHT),
    ("quote", Extensions::QUOTE),
    ("superscript", Extensions::SUPERSCRIPT),
    ("math", Extensions::MATH),
    ("no-intra-emphasis", Extensions::NO_INTRA_EMPHASIS),
    ("disable-intra-emphasis", Extensions::NO_INTRA_EMPHASIS),
    ("space-headers", Extensions::SPACE_HEADERS),
    ("math-explicit", Extensions::MATH_EXPLICIT),
    ("disable-indented-code", Extensions::DISABLE_INDENTED_CODE),
];

impl Default for Extensions {
    fn default() -> Self {
        Extensions::empty()
    }
}

impl Extensions {
    /// Look up a single extension by its kebab-case name.
    ///
    /// Underscores are accepted in place of dashes and case is ignored.
    ///
    /// # Example
    ///
    /// ```
    /// use markweave_core::Extensions;
    /// assert_eq!(Extensions::from_ext_name("fenced_code"), Some(Extensions::FENCED_CODE));
    /// assert_eq!(Extensions::from_ext_name("nope"), None);
    /// ```
    pub fn from_ext_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('_', "-");
        EXTENSION_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ext)| *ext)
    }

    /// Parse a comma-separated list of extension names.
    ///
    /// # Example
    ///
    /// ```
    /// use markweave_core::Extensions;
    /// let ext = Extensions::from_names("tables, footnotes").unwrap();
    /// assert!(ext.contains(Extensions::TABLES | Extensions::FOOTNOTES));
    /// ```
    pub fn from_names(list: &str) -> Result<Self> {
        let mut ext = Extensions::empty();
        for name in list.split(',').filter(|s| !s.trim().is_empty()) {
            ext |= Self::from_ext_name(name)
                .ok_or_else(|| Error::UnknownExtension(name.trim().to_string()))?;
        }
        Ok(ext)
    }

    /// Names of the individual extensions set in `self`.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = EXTENSION_NAMES
            .iter()
            .filter(|(_, ext)| self.contains(*ext))
            .map(|(n, _)| *n)
            .collect();
        // aliases share a flag with the canonical name listed before them
        names.dedup_by(|a, b| Self::from_ext_name(a) == Self::from_ext_name(b));
        names
    }
}

bitflags! {
    /// Metadata for lists and list items.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct ListFlags: u8 {
        /// Numbered list
        const ORDERED = 1 << 0;
        /// Item holds block content (loose list)
        const BLOCK = 1 << 1;
    }
}

bitflags! {
    /// Metadata for table cells.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct TableFlags: u8 {
        const ALIGN_LEFT = 1;
        const ALIGN_RIGHT = 2;
        const ALIGN_CENTER = 3;
        const ALIGNMASK = 3;
        /// Cell belongs to the header row
        const HEADER = 4;
    }
}

impl TableFlags {
    /// Column alignment encoded in the flags.
    pub fn alignment(&self) -> Alignment {
        match self.bits() & Self::ALIGNMASK.bits() {
            1 => Alignment::Left,
            2 => Alignment::Right,
            3 => Alignment::Center,
            _ => Alignment::None,
        }
    }

    /// Whether the cell belongs to the header row.
    pub fn is_header(&self) -> bool {
        self.contains(TableFlags::HEADER)
    }
}
