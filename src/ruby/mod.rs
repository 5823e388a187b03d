//! Ruby alignment: anchors furigana onto timed karaoke syllables.
//!
//! The engine reconciles two segmentations of one line: the syllables of the
//! timing markup and the words of a reading provider. It walks both in
//! minimal balanced windows and decides per window how the reading and the
//! playback time are spread over the output syllables.

pub mod distribute;
pub mod engine;
pub mod kana;
pub mod reconcile;
pub mod window;

use thiserror::Error;

pub use distribute::distribute;
pub use engine::AlignmentEngine;
pub use kana::{GreedyTrailingKana, KanaStrategy, KanjiSplit};
pub use window::{Window, WindowAligner};

/// Convenient alias for results returned by the ruby modules.
pub type Result<T> = std::result::Result<T, RubyError>;

/// Failures of the alignment engine. All of them are fatal for the line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RubyError {
    #[error("syllables contain {token_chars} characters but readings cover {pair_chars}")]
    LengthMismatch {
        token_chars: usize,
        pair_chars: usize,
    },
    #[error(
        "window {window} ran out of input at syllable {token_offset}, \
         reading {pair_offset} (balance {balance})"
    )]
    UnbalancedWindow {
        window: usize,
        token_offset: usize,
        pair_offset: usize,
        balance: i64,
    },
    #[error("window {window} pairs several syllables [{tokens}] with several readings [{surfaces}]")]
    UnsupportedConfiguration {
        window: usize,
        tokens: String,
        surfaces: String,
    },
    #[error("cannot distribute duration {total} over zero parts")]
    InvalidDistribution { total: u32 },
    #[error("combined duration of {syllables} syllables does not fit in 32 bits")]
    DurationOverflow { syllables: usize },
}

/// Aligns one line with the default greedy kana strategy.
pub fn align(
    tokens: &[crate::types::DurationToken],
    pairs: &[crate::types::ReadingPair],
) -> Result<Vec<crate::types::DurationToken>> {
    AlignmentEngine::new().align(tokens, pairs)
}
