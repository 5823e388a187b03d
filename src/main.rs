use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use karafuri::cli::{Cli, Command, LineArgs, MarkArgs, ReadingArgs};
use karafuri::config::{AppConfig, ReadingSource};
use karafuri::reading::ReadingProvider;
use karafuri::subtitle::{ensure_has_events, mark_line, process_document};
use karafuri::AlignmentEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Mark(args) => handle_mark(&args),
        Command::Line(args) => handle_line(&args),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_provider(args: &ReadingArgs) -> Result<Box<dyn ReadingProvider + Send + Sync>> {
    let config = AppConfig::from_override(args.assets_path.clone())?;
    let source = ReadingSource::resolve(args.readings.clone(), args.lexicon.clone(), &config);
    info!(source = ?source, "using reading source");
    source.load()
}

fn handle_mark(args: &MarkArgs) -> Result<()> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let options = args.options().context("Failed to load run options")?;
    let provider = load_provider(&args.reading)?;

    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read subtitle file {:?}", args.input))?;
    ensure_has_events(&input).with_context(|| format!("{:?} is not a subtitle script", args.input))?;

    let engine = AlignmentEngine::new();
    let report = process_document(&input, &engine, provider.as_ref(), &options)?;
    fs::write(&args.output, &report.output)
        .with_context(|| format!("Failed to write {:?}", args.output))?;
    info!(
        marked = report.marked,
        skipped = report.skipped,
        output = %args.output.display(),
        "subtitle written"
    );
    Ok(())
}

fn handle_line(args: &LineArgs) -> Result<()> {
    let provider = load_provider(&args.reading)?;
    let marked = mark_line(&args.text, &AlignmentEngine::new(), provider.as_ref())?;
    println!("{marked}");
    Ok(())
}
