use tracing::{debug, trace};

use crate::types::{DurationToken, ReadingPair, Ruby};

use super::distribute::distribute;
use super::kana::KanaStrategy;
use super::window::WindowAligner;
use super::{Result, RubyError};

/// Turns balanced windows into output syllables.
///
/// Shapes that need finer handling are reduced to smaller windows and fed
/// back through [`WindowAligner`]; each reduction shrinks the number of
/// syllables or readings, so the recursion terminates.
#[derive(Debug, Clone, Default)]
pub struct WindowReconciler<S> {
    strategy: S,
}

impl<S: KanaStrategy> WindowReconciler<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Aligns a syllable run against a reading run and reconciles every window.
    pub fn align_run(
        &self,
        window: usize,
        tokens: &[DurationToken],
        pairs: &[ReadingPair],
    ) -> Result<Vec<DurationToken>> {
        let mut out = Vec::with_capacity(tokens.len());
        for sub in WindowAligner::new(tokens, pairs) {
            let sub = sub?;
            out.extend(self.reconcile(window, sub.tokens, sub.pairs)?);
        }
        Ok(out)
    }

    /// Reconciles one window; `window` is only used for diagnostics.
    pub fn reconcile(
        &self,
        window: usize,
        tokens: &[DurationToken],
        pairs: &[ReadingPair],
    ) -> Result<Vec<DurationToken>> {
        trace!(window, syllables = tokens.len(), readings = pairs.len(), "reconciling window");
        match (tokens, pairs) {
            ([], _) | (_, []) => Ok(tokens.to_vec()),
            ([token], [pair]) => self.annotate(token, pair),
            ([token], _) => self.split_syllable(window, token, pairs),
            (_, [pair]) => self.merge_syllables(window, tokens, pair),
            _ => Err(RubyError::UnsupportedConfiguration {
                window,
                tokens: join_texts(tokens.iter().map(|t| t.text.as_str())),
                surfaces: join_texts(pairs.iter().map(|p| p.surface.as_str())),
            }),
        }
    }

    /// One syllable, one reading: spread the syllable over the reading characters.
    fn annotate(&self, token: &DurationToken, pair: &ReadingPair) -> Result<Vec<DurationToken>> {
        if pair.is_identity() || pair.pronunciation.is_empty() {
            return Ok(vec![token.clone()]);
        }
        let reading: Vec<char> = pair.pronunciation.chars().collect();
        let split = self.strategy.split_kanji_prefix(&token.text, &pair.pronunciation);
        let shares = distribute(token.duration, reading.len())?;
        let head = reading.len() - split.matched_suffix;

        let mut out = Vec::with_capacity(reading.len());
        for (idx, (&ch, &share)) in reading.iter().zip(&shares).enumerate() {
            let syllable = if idx == 0 {
                DurationToken::new(share, split.prefix.as_str(), token.kind)
                    .with_markup(token.markup.as_str())
                    .with_ruby(Ruby::Base(ch.to_string()))
            } else if idx < head {
                DurationToken::new(share, String::new(), token.kind)
                    .with_ruby(Ruby::Continuation(ch.to_string()))
            } else {
                DurationToken::new(share, ch.to_string(), token.kind)
            };
            out.push(syllable);
        }
        Ok(out)
    }

    /// One syllable spanning several words: give each word its own share of
    /// the syllable and align again at word granularity.
    fn split_syllable(
        &self,
        window: usize,
        token: &DurationToken,
        pairs: &[ReadingPair],
    ) -> Result<Vec<DurationToken>> {
        if pairs.iter().all(ReadingPair::is_identity) {
            return Ok(vec![token.clone()]);
        }
        let shares = distribute(token.duration, pairs.len())?;
        let mut synthetic: Vec<DurationToken> = pairs
            .iter()
            .zip(shares)
            .map(|(pair, share)| DurationToken::new(share, pair.surface.as_str(), token.kind))
            .collect();
        if let Some(first) = synthetic.first_mut() {
            first.markup = token.markup.clone();
        }
        debug!(window, words = pairs.len(), text = %token.text, "splitting syllable across words");
        self.align_run(window, &synthetic, pairs)
    }

    /// Several syllables inside one word.
    fn merge_syllables(
        &self,
        window: usize,
        tokens: &[DurationToken],
        pair: &ReadingPair,
    ) -> Result<Vec<DurationToken>> {
        if pair.is_identity() {
            return Ok(tokens.to_vec());
        }

        let blocks = self.strategy.re_block(pair);
        if blocks.len() > 1 {
            match self.align_run(window, tokens, &blocks) {
                Err(RubyError::UnsupportedConfiguration { .. }) => {
                    debug!(window, surface = %pair.surface, "re-blocked reading does not fit syllables");
                }
                result => return result,
            }
        }

        self.match_trailing_kana(tokens, pair)
    }

    /// Emits trailing syllables that spell the end of the reading verbatim and
    /// fuses the rest into one annotated syllable.
    fn match_trailing_kana(
        &self,
        tokens: &[DurationToken],
        pair: &ReadingPair,
    ) -> Result<Vec<DurationToken>> {
        let reading: Vec<char> = pair.pronunciation.chars().collect();
        let mut remaining = reading.len();
        let mut split = tokens.len();
        while split > 1 {
            let text: Vec<char> = tokens[split - 1].text.chars().collect();
            if text.len() >= remaining || reading[remaining - text.len()..remaining] != text[..] {
                break;
            }
            remaining -= text.len();
            split -= 1;
        }

        let (head, tail) = tokens.split_at(split);
        let fused = fuse(head)?;
        let head_reading = ReadingPair::new(
            fused.text.as_str(),
            reading[..remaining].iter().collect::<String>(),
        );
        let mut out = self.annotate(&fused, &head_reading)?;
        out.extend_from_slice(tail);
        Ok(out)
    }
}

fn fuse(tokens: &[DurationToken]) -> Result<DurationToken> {
    if let [single] = tokens {
        return Ok(single.clone());
    }
    let duration = tokens
        .iter()
        .try_fold(0u32, |total, t| total.checked_add(t.duration))
        .ok_or(RubyError::DurationOverflow {
            syllables: tokens.len(),
        })?;
    Ok(DurationToken::new(
        duration,
        tokens.iter().map(|t| t.text.as_str()).collect::<String>(),
        tokens.first().map(|t| t.kind).unwrap_or_default(),
    )
    .with_markup(tokens.iter().map(|t| t.markup.as_str()).collect::<String>()))
}

fn join_texts<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    texts.collect::<Vec<_>>().join("|")
}
