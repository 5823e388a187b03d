use crate::types::{DurationToken, ReadingPair};

use super::{Result, RubyError};

/// Minimal run of syllables and readings covering the same characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    pub index: usize,
    pub tokens: &'a [DurationToken],
    pub pairs: &'a [ReadingPair],
}

/// Two-pointer balancing scan over a syllable stream and a reading stream.
///
/// Each window starts by taking one reading, then takes syllables while the
/// readings are ahead and readings while the syllables are ahead, closing as
/// soon as both sides cover the same number of characters. Empty syllables
/// found at a window start become windows of their own with no readings.
#[derive(Debug, Clone)]
pub struct WindowAligner<'a> {
    tokens: &'a [DurationToken],
    pairs: &'a [ReadingPair],
    token_cursor: usize,
    pair_cursor: usize,
    index: usize,
    failed: bool,
}

impl<'a> WindowAligner<'a> {
    pub fn new(tokens: &'a [DurationToken], pairs: &'a [ReadingPair]) -> Self {
        Self {
            tokens,
            pairs,
            token_cursor: 0,
            pair_cursor: 0,
            index: 0,
            failed: false,
        }
    }

    fn emit(&mut self, token_start: usize, pair_start: usize) -> Window<'a> {
        let window = Window {
            index: self.index,
            tokens: &self.tokens[token_start..self.token_cursor],
            pairs: &self.pairs[pair_start..self.pair_cursor],
        };
        self.index += 1;
        window
    }

    fn unbalanced(&mut self, balance: i64) -> RubyError {
        self.failed = true;
        RubyError::UnbalancedWindow {
            window: self.index,
            token_offset: self.token_cursor,
            pair_offset: self.pair_cursor,
            balance,
        }
    }

    fn scan(&mut self) -> Result<Window<'a>> {
        let token_start = self.token_cursor;
        let pair_start = self.pair_cursor;

        if self
            .tokens
            .get(self.token_cursor)
            .is_some_and(|token| token.text.is_empty())
        {
            self.token_cursor += 1;
            return Ok(self.emit(token_start, pair_start));
        }

        let mut balance: i64 = 0;
        loop {
            if balance > 0 || self.pair_cursor == pair_start {
                let Some(pair) = self.pairs.get(self.pair_cursor) else {
                    return Err(self.unbalanced(balance));
                };
                balance -= pair.char_len() as i64;
                self.pair_cursor += 1;
            } else if balance < 0 {
                let Some(token) = self.tokens.get(self.token_cursor) else {
                    return Err(self.unbalanced(balance));
                };
                balance += token.char_len() as i64;
                self.token_cursor += 1;
            } else {
                return Ok(self.emit(token_start, pair_start));
            }
        }
    }
}

impl<'a> Iterator for WindowAligner<'a> {
    type Item = Result<Window<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let tokens_left = self.token_cursor < self.tokens.len();
        let pairs_left = self.pair_cursor < self.pairs.len();
        if !tokens_left && !pairs_left {
            return None;
        }
        if !pairs_left && !self.tokens[self.token_cursor].text.is_empty() {
            return Some(Err(self.unbalanced(0)));
        }
        Some(self.scan())
    }
}
