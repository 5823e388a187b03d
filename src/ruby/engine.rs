use tracing::debug;

use crate::types::{DurationToken, ReadingPair};

use super::kana::{GreedyTrailingKana, KanaStrategy};
use super::reconcile::WindowReconciler;
use super::window::WindowAligner;
use super::{Result, RubyError};

/// Entry point of the ruby alignment.
///
/// Holds no per-line state; one engine can align any number of lines, from
/// any number of threads when the strategy is `Sync`.
#[derive(Debug, Clone, Default)]
pub struct AlignmentEngine<S = GreedyTrailingKana> {
    reconciler: WindowReconciler<S>,
}

impl AlignmentEngine<GreedyTrailingKana> {
    pub fn new() -> Self {
        Self::with_strategy(GreedyTrailingKana)
    }
}

impl<S: KanaStrategy> AlignmentEngine<S> {
    pub fn with_strategy(strategy: S) -> Self {
        Self {
            reconciler: WindowReconciler::new(strategy),
        }
    }

    pub fn strategy(&self) -> &S {
        self.reconciler.strategy()
    }

    /// Anchors `pairs` onto `tokens`.
    ///
    /// Both sequences must spell the same characters. The output keeps the
    /// total duration and the visible text of `tokens`; syllables whose
    /// reading differs from their surface carry [`crate::types::Ruby`].
    pub fn align(
        &self,
        tokens: &[DurationToken],
        pairs: &[ReadingPair],
    ) -> Result<Vec<DurationToken>> {
        let token_chars: usize = tokens.iter().map(DurationToken::char_len).sum();
        let pair_chars: usize = pairs.iter().map(ReadingPair::char_len).sum();
        if token_chars != pair_chars {
            return Err(RubyError::LengthMismatch {
                token_chars,
                pair_chars,
            });
        }

        let pairs: Vec<ReadingPair> = pairs
            .iter()
            .filter(|pair| !pair.surface.is_empty())
            .cloned()
            .collect();

        let mut out = Vec::with_capacity(tokens.len());
        for window in WindowAligner::new(tokens, &pairs) {
            let window = window?;
            debug!(
                window = window.index,
                syllables = window.tokens.len(),
                readings = window.pairs.len(),
                "aligning window"
            );
            out.extend(
                self.reconciler
                    .reconcile(window.index, window.tokens, window.pairs)?,
            );
        }
        Ok(out)
    }
}
