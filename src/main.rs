//! mwd - render Markdown to HTML.
//!
//! This binary provides the CLI interface to the markweave library,
//! reading Markdown from files or stdin and writing HTML to stdout.

mod cli;

use clap::Parser as ClapParser;
use cli::Cli;
use log::{debug, error, info, LevelFilter};
use std::io::{self, Read, Write};

use markweave_config::Config;
use markweave_core::Result;
use markweave_html::HtmlRenderer;
use markweave_parser::Document;

fn main() {
    let cli = <Cli as ClapParser>::parse();

    // Handle --paths flag
    if cli.show_paths {
        cli::show_paths();
        return;
    }

    setup_logging(&cli.log_level);
    info!("mwd v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Set up logging based on the log level argument.
fn setup_logging(level: &str) {
    let filter = match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Warn,
    };

    env_logger::Builder::new()
        .filter_level(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

/// Main application logic.
fn run(cli: &Cli) -> Result<()> {
    let config = Config::load_with_override(cli.config.as_deref())?;
    let extensions = cli.apply_extensions(config.extensions())?;
    let max_nesting = cli.max_nesting.unwrap_or(config.parser.max_nesting);
    debug!(
        "extensions {:?}, max nesting {}",
        extensions.names(),
        max_nesting
    );

    let renderer = HtmlRenderer::new(config.html_flags());
    let doc = Document::new(&renderer, extensions, max_nesting)?;

    let input = read_input(cli)?;
    let mut out = Vec::with_capacity(input.len() * 2);
    if cli.inline {
        doc.render_inline(&mut out, &input);
    } else {
        doc.render(&mut out, &input);
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&out)?;
    stdout.flush()?;
    Ok(())
}

/// Read stdin, or the input files joined in order.
fn read_input(cli: &Cli) -> Result<Vec<u8>> {
    let mut input = Vec::new();
    if cli.should_read_stdin() {
        debug!("reading stdin");
        io::stdin().lock().read_to_end(&mut input)?;
        return Ok(input);
    }

    for path in &cli.files {
        debug!("reading {}", path.display());
        let content = std::fs::read(path).map_err(|e| {
            error!("{}: {}", path.display(), e);
            e
        })?;
        input.extend_from_slice(&content);
        if !input.is_empty() && !input.ends_with(b"\n") {
            input.push(b'\n');
        }
    }
    Ok(input)
}
