//! Markweave Config
//!
//! This crate handles configuration loading and management
//! for markweave, supporting TOML configuration files.
//!
//! # Overview
//!
//! Configuration is loaded from platform-specific locations:
//! - Linux: `~/.config/markweave/config.toml`
//! - macOS: `~/Library/Application Support/markweave/config.toml`
//! - Windows: `%APPDATA%\markweave\config.toml`
//!
//! # Example
//!
//! ```no_run
//! use markweave_config::Config;
//!
//! // Load config with defaults
//! let config = Config::load().unwrap();
//!
//! // Or load with an inline override
//! let config = Config::load_with_override(Some("[parser]\nMaxNesting = 8")).unwrap();
//! assert_eq!(config.parser.max_nesting, 8);
//! ```

mod extensions;
mod html;
mod parser;

pub use extensions::ExtensionsConfig;
pub use html::HtmlConfig;
pub use parser::ParserConfig;

use markweave_core::{Error, Extensions, Result};
use markweave_html::HtmlFlags;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default TOML configuration string.
const DEFAULT_TOML: &str = r#"[extensions]
Tables              = true
FencedCode          = true
Footnotes           = true
Autolink            = true
Strikethrough       = true
Underline           = false
Highlight           = false
Quote               = false
Superscript         = false
Math                = false
NoIntraEmphasis     = true
SpaceHeaders        = false
MathExplicit        = false
DisableIndentedCode = false

[parser]
MaxNesting = 16

[html]
SkipHtml = false
Escape   = false
HardWrap = false
UseXhtml = false
"#;

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Grammar extensions
    #[serde(default)]
    pub extensions: ExtensionsConfig,

    /// Parser limits
    #[serde(default)]
    pub parser: ParserConfig,

    /// HTML output switches
    #[serde(default)]
    pub html: HtmlConfig,
}

impl Config {
    /// Returns the default TOML configuration string.
    ///
    /// # Example
    ///
    /// ```
    /// use markweave_config::Config;
    /// let toml = Config::default_toml();
    /// assert!(toml.contains("[extensions]"));
    /// assert!(toml.contains("[parser]"));
    /// ```
    pub fn default_toml() -> &'static str {
        DEFAULT_TOML
    }

    /// Returns the platform-specific configuration file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns the platform-specific configuration directory.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "markweave")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Ensures the config file exists, creating it with defaults if not.
    ///
    /// # Returns
    ///
    /// The path to the config file.
    pub fn ensure_config_file() -> Result<PathBuf> {
        let config_dir = Self::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;

        std::fs::create_dir_all(&config_dir)?;

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_TOML)?;
        }

        Ok(config_path)
    }

    /// Load configuration from the default platform-specific path.
    ///
    /// If no config file exists, returns the default configuration.
    pub fn load() -> Result<Self> {
        Self::from_table(Self::load_table()?)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_table(Self::read_table(path)?)
    }

    /// Load configuration with an optional override file or string.
    ///
    /// 1. Load the base config from the default location
    /// 2. If `override_config` names an existing file, layer it on top;
    ///    otherwise parse it as inline TOML and layer that
    ///
    /// Layering is per key: a key the override leaves out keeps the
    /// value from the base file.
    pub fn load_with_override(override_config: Option<&str>) -> Result<Self> {
        let mut table = Self::load_table()?;

        if let Some(override_str) = override_config {
            merge_tables(&mut table, Self::parse_override(override_str)?);
        }

        Self::from_table(table)
    }

    fn load_table() -> Result<toml::Table> {
        match Self::config_path() {
            Some(config_path) if config_path.exists() => Self::read_table(&config_path),
            _ => Ok(toml::Table::new()),
        }
    }

    fn read_table(path: &Path) -> Result<toml::Table> {
        let content = std::fs::read_to_string(path)?;
        content
            .parse::<toml::Table>()
            .map_err(|e| Error::Config(format!("Parse error in {}: {}", path.display(), e)))
    }

    fn parse_override(override_str: &str) -> Result<toml::Table> {
        let override_path = Path::new(override_str);
        let override_toml = if override_path.is_file() {
            std::fs::read_to_string(override_path)?
        } else {
            override_str.to_string()
        };

        override_toml
            .parse::<toml::Table>()
            .map_err(|e| Error::Config(format!("Override parse error: {}", e)))
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))
    }

    /// Layer TOML settings on top of this config.
    ///
    /// Only the keys present in `overlay` change; every other key keeps
    /// its current value, even inside a section the overlay mentions.
    ///
    /// # Example
    ///
    /// ```
    /// use markweave_config::Config;
    ///
    /// let mut base = Config::default();
    /// base.merge("[parser]\nMaxNesting = 4").unwrap();
    /// assert_eq!(base.parser.max_nesting, 4);
    /// assert!(base.extensions.tables);
    /// ```
    pub fn merge(&mut self, overlay: &str) -> Result<()> {
        let overlay = overlay
            .parse::<toml::Table>()
            .map_err(|e| Error::Config(format!("Override parse error: {}", e)))?;
        let mut table = toml::Table::try_from(&*self)
            .map_err(|e| Error::Config(format!("Serialization error: {}", e)))?;
        merge_tables(&mut table, overlay);
        *self = Self::from_table(table)?;
        Ok(())
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Serialization error: {}", e)))?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Extension flags selected by this config.
    pub fn extensions(&self) -> Extensions {
        self.extensions.to_extensions()
    }

    /// HTML renderer flags selected by this config.
    pub fn html_flags(&self) -> HtmlFlags {
        self.html.to_flags()
    }
}

/// Recursively copy `over` into `base`; sub-tables merge key by key.
fn merge_tables(base: &mut toml::Table, over: toml::Table) {
    for (key, value) in over {
        match value {
            toml::Value::Table(value) => match base.get_mut(&key) {
                Some(toml::Value::Table(inner)) => merge_tables(inner, value),
                _ => {
                    base.insert(key, toml::Value::Table(value));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
