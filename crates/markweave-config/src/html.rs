//! HTML output switches.

use markweave_html::HtmlFlags;
use serde::{Deserialize, Serialize};

/// HTML renderer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HtmlConfig {
    /// Drop raw HTML from the input.
    #[serde(default)]
    pub skip_html: bool,

    /// Escape raw HTML instead of passing it through.
    #[serde(default)]
    pub escape: bool,

    /// Turn newlines inside paragraphs into line breaks.
    #[serde(default)]
    pub hard_wrap: bool,

    /// Emit XHTML void tags (`<br/>`, `<hr/>`).
    #[serde(default)]
    pub use_xhtml: bool,
}

impl HtmlConfig {
    /// The renderer flag set described by these switches.
    pub fn to_flags(&self) -> HtmlFlags {
        let mut flags = HtmlFlags::empty();
        flags.set(HtmlFlags::SKIP_HTML, self.skip_html);
        flags.set(HtmlFlags::ESCAPE, self.escape);
        flags.set(HtmlFlags::HARD_WRAP, self.hard_wrap);
        flags.set(HtmlFlags::USE_XHTML, self.use_xhtml);
        flags
    }
}
