use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::reading::{Lexicon, ReadingProvider, ReadingTable};

const LEXICON_FILE: &str = "readings/lexicon.tsv";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub assets_root: Option<PathBuf>,
}

impl AppConfig {
    /// Uses `path` as the assets directory, or looks for an `assets` directory
    /// next to the executable. Not finding one is fine: the bundled lexicon
    /// is used instead.
    pub fn from_override(path: Option<PathBuf>) -> Result<Self> {
        let root = match path {
            Some(custom) => Some(canonicalize_dir(&custom)?),
            None => default_assets_root(),
        };
        Ok(Self { assets_root: root })
    }

    /// Lexicon file shipped in the assets directory, if any.
    pub fn lexicon_path(&self) -> Option<PathBuf> {
        self.assets_root
            .as_ref()
            .map(|root| root.join(LEXICON_FILE))
            .filter(|candidate| candidate.is_file())
    }
}

/// Where readings come from, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingSource {
    Table(PathBuf),
    LexiconFile(PathBuf),
    BundledLexicon,
}

impl ReadingSource {
    pub fn resolve(
        readings: Option<PathBuf>,
        lexicon: Option<PathBuf>,
        config: &AppConfig,
    ) -> Self {
        match (readings, lexicon) {
            (Some(table), _) => Self::Table(table),
            (None, Some(path)) => Self::LexiconFile(path),
            (None, None) => config
                .lexicon_path()
                .map(Self::LexiconFile)
                .unwrap_or(Self::BundledLexicon),
        }
    }

    pub fn load(&self) -> Result<Box<dyn ReadingProvider + Send + Sync>> {
        debug!(source = ?self, "loading reading provider");
        Ok(match self {
            Self::Table(path) => Box::new(
                ReadingTable::from_path(path)
                    .with_context(|| format!("failed to load readings from {:?}", path))?,
            ),
            Self::LexiconFile(path) => Box::new(
                Lexicon::from_path(path)
                    .with_context(|| format!("failed to load lexicon from {:?}", path))?,
            ),
            Self::BundledLexicon => {
                Box::new(Lexicon::bundled().context("bundled lexicon is malformed")?)
            }
        })
    }
}

fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve assets directory at {:?}", path))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(anyhow!("assets path {:?} is not a directory", canonical))
    }
}

fn default_assets_root() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.ancestors().find_map(|dir| {
        let candidate = dir.join("assets");
        candidate.is_dir().then_some(candidate)
    })
}
