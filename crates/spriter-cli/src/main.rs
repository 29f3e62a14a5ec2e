//! spriter - CSS sprite sheet generator.
//!
//! Reads a stylesheet, packs the background images it references into
//! composite sheets, writes the sheets next to the target path, and emits
//! the rewritten stylesheet on stdout.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use spriter_core::{generate, Options, Stylesheet};

/// Pack stylesheet background images into sprite sheets.
#[derive(Parser)]
#[command(name = "spriter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Stylesheet to process, or `-` for stdin.
    stylesheet: PathBuf,

    /// Directory background URLs resolve against (default: the
    /// stylesheet's directory).
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Output path for the sheets, relative to the source root; its stem
    /// names the sheet group (e.g. `images/sprites.png`).
    #[arg(short, long)]
    target: PathBuf,

    /// Only process background URLs containing this substring.
    #[arg(short, long)]
    filter: Option<String>,

    /// Collapse rewritten background declarations into canonical order.
    #[arg(short = 'O', long)]
    optimize: bool,

    /// Write the rewritten stylesheet here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

async fn run(cli: Cli) -> Result<()> {
    let css = if cli.stylesheet == PathBuf::from("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read stylesheet from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&cli.stylesheet)
            .with_context(|| format!("failed to read {}", cli.stylesheet.display()))?
    };

    let source_root = match cli.source {
        Some(source) => source,
        None => cli
            .stylesheet
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut stylesheet = Stylesheet::parse(&css)
        .with_context(|| format!("failed to parse {}", cli.stylesheet.display()))?;

    let report = generate(
        &mut stylesheet,
        &Options {
            source_root,
            target: cli.target,
            filter: cli.filter,
            optimize: cli.optimize,
        },
    )
    .await?;

    for failure in &report.failures {
        eprintln!(
            "{} loading {}: {}",
            "error".red(),
            failure.path.display(),
            failure.error
        );
    }

    let css = stylesheet.to_css();
    match cli.output {
        Some(path) => std::fs::write(&path, css)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{css}"),
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red(), e);
            ExitCode::from(1)
        }
    }
}
