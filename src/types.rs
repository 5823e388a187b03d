//! Core types shared by the karaoke tokenizer, the reading providers and the
//! ruby alignment engine.

use std::fmt::{self, Display, Formatter};

use serde::Deserialize;

/// Timing-tag dialect of a karaoke syllable.
///
/// Passed through the engine untouched; only the serializer looks at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagKind {
    /// `\k`: the syllable switches colour at once when its time starts.
    K,
    /// `\kf`: the fill sweeps across the syllable over its duration.
    #[default]
    Kf,
    /// `\ko`: the outline is removed when the syllable starts.
    Ko,
}

impl TagKind {
    /// Parses the tag name as it appears after the backslash.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "k" => Some(Self::K),
            "kf" => Some(Self::Kf),
            "ko" => Some(Self::Ko),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::K => "k",
            Self::Kf => "kf",
            Self::Ko => "ko",
        }
    }
}

impl Display for TagKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\\{}", self.as_tag())
    }
}

/// Furigana attached to an output syllable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ruby {
    /// First reading character, attached to the syllable carrying the kanji.
    Base(String),
    /// Further reading characters of the preceding base; the syllable itself
    /// has no visible text.
    Continuation(String),
}

impl Ruby {
    pub fn reading(&self) -> &str {
        match self {
            Self::Base(reading) | Self::Continuation(reading) => reading,
        }
    }
}

/// One timed unit of karaoke text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurationToken {
    /// Playback time in centiseconds.
    pub duration: u32,
    pub text: String,
    pub kind: TagKind,
    /// Override blocks such as `{\c&H0000FF&}` found inside the syllable.
    /// Rendered right after the timing tag; never counted as text.
    pub markup: String,
    /// Only ever set on tokens produced by the alignment engine.
    pub ruby: Option<Ruby>,
}

impl DurationToken {
    pub fn new(duration: u32, text: impl Into<String>, kind: TagKind) -> Self {
        Self {
            duration,
            text: text.into(),
            kind,
            markup: String::new(),
            ruby: None,
        }
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    pub fn with_ruby(mut self, ruby: Ruby) -> Self {
        self.ruby = Some(ruby);
        self
    }

    /// Length of the visible text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// One `(surface, pronunciation)` unit produced by a reading provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct ReadingPair {
    pub surface: String,
    pub pronunciation: String,
}

impl ReadingPair {
    pub fn new(surface: impl Into<String>, pronunciation: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            pronunciation: pronunciation.into(),
        }
    }

    /// A pair that needs no annotation.
    pub fn identity(surface: impl Into<String>) -> Self {
        let surface = surface.into();
        Self {
            pronunciation: surface.clone(),
            surface,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.surface == self.pronunciation
    }

    pub fn char_len(&self) -> usize {
        self.surface.chars().count()
    }
}

impl From<(String, String)> for ReadingPair {
    fn from((surface, pronunciation): (String, String)) -> Self {
        Self {
            surface,
            pronunciation,
        }
    }
}

/// Sum of token durations.
pub fn total_duration(tokens: &[DurationToken]) -> u64 {
    tokens.iter().map(|token| u64::from(token.duration)).sum()
}

/// Concatenated visible text of a token run, ignoring ruby.
pub fn visible_text(tokens: &[DurationToken]) -> String {
    tokens.iter().map(|token| token.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_kind_round_trips_tag_names() {
        for kind in [TagKind::K, TagKind::Kf, TagKind::Ko] {
            assert_eq!(TagKind::from_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(TagKind::from_tag("kt"), None);
        assert_eq!(TagKind::Ko.to_string(), "\\ko");
    }

    #[test]
    fn char_len_counts_scalar_values() {
        let token = DurationToken::new(10, "飢えた", TagKind::Kf);
        assert_eq!(token.char_len(), 3);
        assert_eq!(ReadingPair::new("私", "わたし").char_len(), 1);
    }

    #[test]
    fn reading_pair_deserializes_from_tuple() {
        let pair: ReadingPair = serde_json::from_str(r#"["私", "わたし"]"#).unwrap();
        assert_eq!(pair, ReadingPair::new("私", "わたし"));
        assert!(!pair.is_identity());
        assert!(ReadingPair::identity("よ").is_identity());
    }
}
