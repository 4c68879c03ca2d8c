//! Command-line interface for markweave.

use clap::Parser;
use markweave_core::{Extensions, Result};
use std::path::PathBuf;

/// mwd - render Markdown to HTML.
///
/// Reads the given files in order (or stdin when none are given) and
/// writes HTML to stdout.
#[derive(Parser, Debug)]
#[command(
    name = "mwd",
    author = "Markweave Contributors",
    version,
    about = "Render Markdown to HTML",
    after_help = "Examples:\n  \
                  cat README.md | mwd\n  \
                  mwd document.md > document.html\n  \
                  mwd -e tables,footnotes --no-ext autolink notes.md\n  \
                  mwd --inline -c '[html]\\nUseXhtml = true' snippet.md"
)]
pub struct Cli {
    /// Input files to process (reads from stdin if not provided)
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Set the logging level (trace, debug, info, warn, error)
    #[arg(short = 'l', long = "loglevel", default_value = "warn")]
    pub log_level: String,

    /// Use a custom config file or inline TOML
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Enable extensions by name, on top of the configured ones
    #[arg(short = 'e', long = "ext", value_name = "EXT", value_delimiter = ',')]
    pub extensions: Vec<String>,

    /// Disable extensions by name
    #[arg(long = "no-ext", value_name = "EXT", value_delimiter = ',')]
    pub no_extensions: Vec<String>,

    /// Maximum nesting depth (overrides the config)
    #[arg(short = 'n', long = "max-nesting")]
    pub max_nesting: Option<usize>,

    /// Render span-level markup only, without block structure
    #[arg(long = "inline")]
    pub inline: bool,

    /// Show configuration paths and exit
    #[arg(long = "paths")]
    pub show_paths: bool,
}

impl Cli {
    /// Check if we should read from stdin.
    pub fn should_read_stdin(&self) -> bool {
        self.files.is_empty()
    }

    /// Apply `--ext` and `--no-ext` to a configured extension set.
    pub fn apply_extensions(&self, base: Extensions) -> Result<Extensions> {
        let enable = Extensions::from_names(&self.extensions.join(","))?;
        let disable = Extensions::from_names(&self.no_extensions.join(","))?;
        Ok((base | enable) - disable)
    }
}

/// Show paths information.
pub fn show_paths() {
    use markweave_config::Config;

    let config_path = Config::config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not found)".to_string());

    println!("paths:");
    println!("  config                {}", config_path);
}
