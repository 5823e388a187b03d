//! Reading providers: turn the plain text of a line into `(surface, reading)`
//! pairs for the alignment engine.

pub mod lexicon;
pub mod table;

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::ReadingPair;

pub use lexicon::Lexicon;
pub use table::ReadingTable;

static MIXED_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]+|[ぁ-んァ-ヶ一-龯々ー]+|[^A-Za-zぁ-んァ-ヶ一-龯々ー]")
        .unwrap_or_else(|err| panic!("invalid mixed text regex: {err}"))
});

#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("lexicon line {line}: {message}")]
    MalformedLexicon { line: usize, message: String },
    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reading table")]
    Json(#[from] serde_json::Error),
    #[error("no readings recorded for line \"{0}\"")]
    MissingLine(String),
    #[error("readings for \"{line}\" spell \"{surfaces}\"")]
    SurfaceMismatch { line: String, surfaces: String },
}

/// Source of readings for one line of plain text.
pub trait ReadingProvider {
    fn readings(&self, text: &str) -> Result<Vec<ReadingPair>, ReadingError>;
}

impl<P: ReadingProvider + ?Sized> ReadingProvider for &P {
    fn readings(&self, text: &str) -> Result<Vec<ReadingPair>, ReadingError> {
        (**self).readings(text)
    }
}

impl<P: ReadingProvider + ?Sized> ReadingProvider for Box<P> {
    fn readings(&self, text: &str) -> Result<Vec<ReadingPair>, ReadingError> {
        (**self).readings(text)
    }
}

/// Splits a line into Latin words, Japanese runs and single other characters.
pub fn split_mixed_text(text: &str) -> Vec<&str> {
    MIXED_TEXT.find_iter(text).map(|m| m.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_text_keeps_words_whole() {
        assert_eq!(
            split_mixed_text("君とMain Street、走る"),
            vec!["君と", "Main", " ", "Street", "、", "走る"]
        );
    }

    #[test]
    fn small_and_voiced_katakana_stay_in_runs() {
        assert_eq!(split_mixed_text("ヴァイオリンヶ丘"), vec!["ヴァイオリンヶ丘"]);
    }

    #[test]
    fn mixed_text_covers_every_character() {
        let text = "日々 — «lyric» 2024";
        assert_eq!(split_mixed_text(text).concat(), text);
    }
}
