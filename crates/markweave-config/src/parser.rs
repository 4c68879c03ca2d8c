//! Parser limits.

use serde::{Deserialize, Serialize};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParserConfig {
    /// Maximum nesting depth of blocks and spans.
    /// Default: 16
    #[serde(default = "default_max_nesting")]
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting: default_max_nesting(),
        }
    }
}

fn default_max_nesting() -> usize {
    16
}
