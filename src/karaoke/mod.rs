//! Karaoke timing markup: `{\kf20}text` syllables inside a subtitle text field.

use std::fmt::Write;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::types::{DurationToken, Ruby, TagKind};

/// Separates a syllable from its furigana in the templater syntax.
pub const RUBY_DELIMITER: &str = "|<";
/// Placeholder text of a syllable that continues the previous furigana.
pub const CONTINUATION_MARK: &str = "#";

static TIMING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\\(kf|ko|k)(\d+)\}").unwrap_or_else(|err| panic!("invalid timing tag regex: {err}"))
});

static OVERRIDE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*\}").unwrap_or_else(|err| panic!("invalid override block regex: {err}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KaraokeError {
    #[error("timing tag duration {raw} at byte {offset} does not fit in 32 bits")]
    InvalidDuration { raw: String, offset: usize },
}

/// A subtitle text field split into timed syllables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KaraokeLine {
    /// Text before the first timing tag, kept verbatim.
    pub lead: String,
    pub tokens: Vec<DurationToken>,
}

impl KaraokeLine {
    /// Splits `text` at every `\k`, `\kf` or `\ko` tag. A syllable runs up to
    /// the next timing tag and may be empty. Other override blocks inside a
    /// syllable are kept as its markup and moved in front of its text.
    pub fn parse(text: &str) -> Result<Self, KaraokeError> {
        let mut tags = TIMING_TAG.captures_iter(text).peekable();
        let lead_end = tags
            .peek()
            .and_then(|caps| caps.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let mut line = Self {
            lead: text[..lead_end].to_string(),
            tokens: Vec::new(),
        };

        while let Some(caps) = tags.next() {
            let (Some(whole), Some(tag), Some(raw)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let duration = raw
                .as_str()
                .parse::<u32>()
                .map_err(|_| KaraokeError::InvalidDuration {
                    raw: raw.as_str().to_string(),
                    offset: raw.start(),
                })?;
            let text_end = tags
                .peek()
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());
            let kind = TagKind::from_tag(tag.as_str()).unwrap_or_default();
            let (markup, visible) = split_markup(&text[whole.end()..text_end]);
            line.tokens
                .push(DurationToken::new(duration, visible, kind).with_markup(markup));
        }
        Ok(line)
    }

    /// Characters a reading provider should analyse.
    pub fn plain_text(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }

    pub fn render(&self) -> String {
        render_tokens(&self.lead, &self.tokens)
    }
}

/// Separates override blocks from the visible text of one syllable.
fn split_markup(segment: &str) -> (String, String) {
    let mut markup = String::new();
    let mut visible = String::with_capacity(segment.len());
    let mut cursor = 0;
    for block in OVERRIDE_BLOCK.find_iter(segment) {
        visible.push_str(&segment[cursor..block.start()]);
        markup.push_str(block.as_str());
        cursor = block.end();
    }
    visible.push_str(&segment[cursor..]);
    (markup, visible)
}

/// True when `text` carries at least one karaoke timing tag.
pub fn has_timing_tags(text: &str) -> bool {
    TIMING_TAG.is_match(text)
}

/// Writes syllables back into timing markup, furigana included.
pub fn render_tokens(lead: &str, tokens: &[DurationToken]) -> String {
    let mut out = String::from(lead);
    for token in tokens {
        // Writing into a String cannot fail.
        let _ = write!(out, "{{{}{}}}", token.kind, token.duration);
        out.push_str(&token.markup);
        match &token.ruby {
            None => out.push_str(&token.text),
            Some(Ruby::Base(reading)) => {
                out.push_str(&token.text);
                out.push_str(RUBY_DELIMITER);
                out.push_str(reading);
            }
            Some(Ruby::Continuation(reading)) => {
                out.push_str(CONTINUATION_MARK);
                out.push_str(RUBY_DELIMITER);
                out.push_str(reading);
            }
        }
    }
    out
}
