use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::types::ReadingPair;

use super::{split_mixed_text, ReadingError, ReadingProvider};

const BUNDLED_LEXICON: &str = include_str!("../../assets/readings/lexicon.tsv");

/// Surface-to-reading dictionary with greedy longest-match segmentation.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, String>,
    longest: usize,
}

impl Lexicon {
    /// Parses tab-separated `surface<TAB>reading` lines. Blank lines and lines
    /// starting with `#` are skipped; later entries replace earlier ones.
    pub fn from_tsv(data: &str) -> Result<Self, ReadingError> {
        let mut lexicon = Self::default();
        for (idx, raw) in data.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let malformed = |message: &str| ReadingError::MalformedLexicon {
                line: idx + 1,
                message: message.to_string(),
            };
            let (surface, reading) = line
                .split_once('\t')
                .ok_or_else(|| malformed("expected surface and reading separated by a tab"))?;
            let (surface, reading) = (surface.trim(), reading.trim());
            if surface.is_empty() {
                return Err(malformed("empty surface"));
            }
            if reading.is_empty() || reading.contains('\t') {
                return Err(malformed("reading must be a single non-empty column"));
            }
            lexicon.insert(surface, reading);
        }
        Ok(lexicon)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReadingError> {
        let data = fs::read_to_string(path).map_err(|source| ReadingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = Self::from_tsv(&data)?;
        debug!(path = %path.display(), entries = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    /// Builds a fresh copy of the lexicon compiled into the binary.
    pub fn bundled() -> Result<Self, ReadingError> {
        Self::from_tsv(BUNDLED_LEXICON)
    }

    pub fn insert(&mut self, surface: &str, reading: &str) {
        self.longest = self.longest.max(surface.chars().count());
        self.entries.insert(surface.to_string(), reading.to_string());
    }

    pub fn lookup(&self, surface: &str) -> Option<&str> {
        self.entries.get(surface).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn segment_run(&self, run: &str, out: &mut Vec<ReadingPair>) {
        let chars: Vec<char> = run.chars().collect();
        let mut unmatched = String::new();
        let mut start = 0;
        while start < chars.len() {
            let longest = self.longest.min(chars.len() - start);
            let hit = (1..=longest).rev().find_map(|len| {
                let surface: String = chars[start..start + len].iter().collect();
                self.lookup(&surface)
                    .map(|reading| (len, ReadingPair::new(surface.as_str(), reading)))
            });
            match hit {
                Some((len, pair)) => {
                    flush_unmatched(&mut unmatched, out);
                    out.push(pair);
                    start += len;
                }
                None => {
                    unmatched.push(chars[start]);
                    start += 1;
                }
            }
        }
        flush_unmatched(&mut unmatched, out);
    }
}

fn flush_unmatched(unmatched: &mut String, out: &mut Vec<ReadingPair>) {
    if !unmatched.is_empty() {
        out.push(ReadingPair::identity(std::mem::take(unmatched)));
    }
}

impl ReadingProvider for Lexicon {
    /// Consecutive unknown characters inside a run, and unknown Latin words,
    /// become a single identity pair.
    fn readings(&self, text: &str) -> Result<Vec<ReadingPair>, ReadingError> {
        let mut pairs = Vec::new();
        for chunk in split_mixed_text(text) {
            let is_word = chunk.chars().all(|ch| ch.is_ascii_alphabetic());
            match self.lookup(chunk) {
                Some(reading) if is_word => pairs.push(ReadingPair::new(chunk, reading)),
                _ if is_word => pairs.push(ReadingPair::identity(chunk)),
                _ => self.segment_run(chunk, &mut pairs),
            }
        }
        Ok(pairs)
    }
}
