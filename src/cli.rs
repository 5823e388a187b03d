use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::subtitle::MarkOptions;

/// karafuri - furigana for karaoke subtitles
///
/// Anchors kanji readings onto `\k`/`\kf`/`\ko` timed syllables, splitting
/// each syllable's time across its reading.
#[derive(Parser, Debug)]
#[command(name = "karafuri", version, about = "Furigana for timed karaoke subtitles")]
pub struct Cli {
    /// Log per-window alignment details (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mark every karaoke Dialogue event of a subtitle file.
    Mark(MarkArgs),
    /// Mark a single karaoke text field and print it.
    Line(LineArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ReadingArgs {
    /// Tab-separated lexicon (`surface<TAB>reading`) used to look up readings.
    #[arg(long, value_name = "PATH", conflicts_with = "readings")]
    pub lexicon: Option<PathBuf>,

    /// JSON file with precomputed readings keyed by line text.
    #[arg(long, value_name = "PATH")]
    pub readings: Option<PathBuf>,

    /// Optional override for the assets directory.
    #[arg(long = "assets-path", value_name = "DIR")]
    pub assets_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MarkArgs {
    /// Input subtitle file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output subtitle file.
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    #[command(flatten)]
    pub reading: ReadingArgs,

    /// Run options as inline JSON.
    #[arg(long, value_name = "JSON", conflicts_with = "options_file")]
    pub options_json: Option<String>,

    /// Path to run options as JSON.
    #[arg(long, value_name = "PATH", conflicts_with = "options_json")]
    pub options_file: Option<PathBuf>,
}

impl MarkArgs {
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            bail!("Input file does not exist: {:?}", self.input);
        }
        if self.output.is_dir() {
            bail!("Output path is a directory: {:?}", self.output);
        }
        Ok(())
    }

    pub fn options(&self) -> Result<MarkOptions> {
        load_options(self.options_file.as_deref(), self.options_json.as_deref())
    }
}

#[derive(Args, Debug, Clone)]
pub struct LineArgs {
    /// Karaoke text field, e.g. `{\kf30}私{\kf12}は`.
    #[arg(value_name = "TEXT")]
    pub text: String,

    #[command(flatten)]
    pub reading: ReadingArgs,
}

fn load_options(path: Option<&Path>, json: Option<&str>) -> Result<MarkOptions> {
    let options = match (path, json) {
        (Some(p), _) => {
            let data = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read options file {:?}", p))?;
            parse_options(&data)?
        }
        (None, Some(raw)) => parse_options(raw)?,
        (None, None) => MarkOptions::default(),
    };
    options.validate().context("Invalid run options")?;
    Ok(options)
}

fn parse_options(raw: &str) -> Result<MarkOptions> {
    serde_json::from_str(raw).context("Failed to parse options JSON")
}
