//! Extension switches.
//!
//! This module contains the `ExtensionsConfig` struct which maps one
//! boolean per grammar extension onto [`Extensions`].

use markweave_core::Extensions;
use serde::{Deserialize, Serialize};

/// Extension switches configuration.
///
/// Each field enables one grammar extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExtensionsConfig {
    /// Pipe tables.
    /// Default: true
    #[serde(default = "default_true")]
    pub tables: bool,

    /// ``` and ~~~ fenced code blocks.
    /// Default: true
    #[serde(default = "default_true")]
    pub fenced_code: bool,

    /// [^label] footnotes.
    /// Default: true
    #[serde(default = "default_true")]
    pub footnotes: bool,

    /// Bare URL, www. and e-mail links.
    /// Default: true
    #[serde(default = "default_true")]
    pub autolink: bool,

    /// ~~strikethrough~~.
    /// Default: true
    #[serde(default = "default_true")]
    pub strikethrough: bool,

    #[serde(default)]
    pub underline: bool,

    #[serde(default)]
    pub highlight: bool,

    #[serde(default)]
    pub quote: bool,

    #[serde(default)]
    pub superscript: bool,

    #[serde(default)]
    pub math: bool,

    /// Underscore emphasis only at word boundaries.
    /// Default: true
    #[serde(default = "default_true")]
    pub no_intra_emphasis: bool,

    #[serde(default)]
    pub space_headers: bool,

    #[serde(default)]
    pub math_explicit: bool,

    #[serde(default)]
    pub disable_indented_code: bool,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            tables: true,
            fenced_code: true,
            footnotes: true,
            autolink: true,
            strikethrough: true,
            underline: false,
            highlight: false,
            quote: false,
            superscript: false,
            math: false,
            no_intra_emphasis: true,
            space_headers: false,
            math_explicit: false,
            disable_indented_code: false,
        }
    }
}

impl ExtensionsConfig {
    /// The flag set described by these switches.
    pub fn to_extensions(&self) -> Extensions {
        let switches = [
            (self.tables, Extensions::TABLES),
            (self.fenced_code, Extensions::FENCED_CODE),
            (self.footnotes, Extensions::FOOTNOTES),
            (self.autolink, Extensions::AUTOLINK),
            (self.strikethrough, Extensions::STRIKETHROUGH),
            (self.underline, Extensions::UNDERLINE),
            (self.highlight, Extensions::HIGHLIGHT),
            (self.quote, Extensions::QUOTE),
            (self.superscript, Extensions::SUPERSCRIPT),
            (self.math, Extensions::MATH),
            (self.no_intra_emphasis, Extensions::NO_INTRA_EMPHASIS),
            (self.space_headers, Extensions::SPACE_HEADERS),
            (self.math_explicit, Extensions::MATH_EXPLICIT),
            (self.disable_indented_code, Extensions::DISABLE_INDENTED_CODE),
        ];
        switches
            .iter()
            .filter(|(on, _)| *on)
            .fold(Extensions::empty(), |acc, (_, ext)| acc | *ext)
    }

    /// Switches matching a flag set.
    pub fn from_extensions(ext: Extensions) -> Self {
        Self {
            tables: ext.contains(Extensions::TABLES),
            fenced_code: ext.contains(Extensions::FENCED_CODE),
            footnotes: ext.contains(Extensions::FOOTNOTES),
            autolink: ext.contains(Extensions::AUTOLINK),
            strikethrough: ext.contains(Extensions::STRIKETHROUGH),
            underline: ext.contains(Extensions::UNDERLINE),
            highlight: ext.contains(Extensions::HIGHLIGHT),
            quote: ext.contains(Extensions::QUOTE),
            superscript: ext.contains(Extensions::SUPERSCRIPT),
            math: ext.contains(Extensions::MATH),
            no_intra_emphasis: ext.contains(Extensions::NO_INTRA_EMPHASIS),
            space_headers: ext.contains(Extensions::SPACE_HEADERS),
            math_explicit: ext.contains(Extensions::MATH_EXPLICIT),
            disable_indented_code: ext.contains(Extensions::DISABLE_INDENTED_CODE),
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let ext = ExtensionsConfig::default().to_extensions();
        assert!(ext.contains(Extensions::TABLES | Extensions::FENCED_CODE | Extensions::FOOTNOTES));
        assert!(ext.contains(Extensions::AUTOLINK | Extensions::STRIKETHROUGH));
        assert!(ext.contains(Extensions::NO_INTRA_EMPHASIS));
        assert!(!ext.contains(Extensions::MATH));
        assert!(!ext.contains(Extensions::DISABLE_INDENTED_CODE));
    }

    #[test]
    fn test_serde_pascal_case() {
        let toml_str = r#"
            Tables = false
            FencedCode = false
            Math = true
            MathExplicit = true
            DisableIndentedCode = true
        "#;

        let cfg: ExtensionsConfig = toml::from_str(toml_str).unwrap();
        assert!(!cfg.tables);
        assert!(!cfg.fenced_code);
        assert!(cfg.footnotes);
        assert!(cfg.math);
        assert!(cfg.math_explicit);
        assert!(cfg.disable_indented_code);
    }

    #[test]
    fn test_from_extensions() {
        let ext = Extensions::TABLES | Extensions::MATH | Extensions::SPACE_HEADERS;
        let cfg = ExtensionsConfig::from_extensions(ext);
        assert!(cfg.tables && cfg.math && cfg.space_headers);
        assert!(!cfg.footnotes);
        assert_eq!(cfg.to_extensions(), ext);
    }
}
