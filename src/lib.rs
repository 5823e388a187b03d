//! karafuri - furigana for timed karaoke subtitles.
//!
//! Takes karaoke text such as `{\kf30}私{\kf12}は`, looks up readings for the
//! line and emits syllables with furigana in the karaoke templater syntax:
//! `{\kf10}私|<わ{\kf10}#|<た{\kf10}#|<し{\kf12}は`.

pub mod cli;
pub mod config;
pub mod karaoke;
pub mod reading;
pub mod ruby;
pub mod subtitle;
pub mod types;

pub use ruby::{align, AlignmentEngine, RubyError};
pub use types::{DurationToken, ReadingPair, Ruby, TagKind};
