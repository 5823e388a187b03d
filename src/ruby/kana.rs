use crate::types::ReadingPair;

/// Result of separating a word into its annotated head and plain kana tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanjiSplit {
    /// Leading part of the surface that receives the reading.
    pub prefix: String,
    /// Number of trailing surface characters that match the reading verbatim.
    pub matched_suffix: usize,
}

/// Heuristics the reconciler uses to match kana between surface and reading.
pub trait KanaStrategy {
    /// Separates the kanji-bearing head of `surface` from trailing kana that
    /// already appear at the end of `pronunciation`.
    fn split_kanji_prefix(&self, surface: &str, pronunciation: &str) -> KanjiSplit;

    /// Re-segments a word whose surface alternates kanji and kana blocks into
    /// one pair per block.
    fn re_block(&self, pair: &ReadingPair) -> Vec<ReadingPair>;
}

/// Greedy longest-trailing-kana matching.
///
/// Cheap and deterministic, but it can misplace the boundary when the same
/// kana recurs inside a word.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyTrailingKana;

impl KanaStrategy for GreedyTrailingKana {
    fn split_kanji_prefix(&self, surface: &str, pronunciation: &str) -> KanjiSplit {
        let surface: Vec<char> = surface.chars().collect();
        let reading: Vec<char> = pronunciation.chars().collect();
        let mut s = surface.len();
        let mut r = reading.len();
        while s > 1 && r > 1 && surface[s - 1] == reading[r - 1] {
            s -= 1;
            r -= 1;
        }
        KanjiSplit {
            prefix: surface[..s].iter().collect(),
            matched_suffix: surface.len() - s,
        }
    }

    fn re_block(&self, pair: &ReadingPair) -> Vec<ReadingPair> {
        let blocks = split_into_blocks(&pair.surface);
        let Some((last, leading)) = blocks.split_last() else {
            return vec![pair.clone()];
        };
        let reading: Vec<char> = pair.pronunciation.chars().collect();
        let mut cursor = 0;
        let mut pairs = Vec::with_capacity(blocks.len());
        for block in leading {
            let end = block
                .chars()
                .last()
                .and_then(|tail| reading[cursor..].iter().position(|&c| c == tail))
                .map(|offset| cursor + offset + 1)
                .unwrap_or(reading.len());
            pairs.push(ReadingPair::new(
                *block,
                reading[cursor..end].iter().collect::<String>(),
            ));
            cursor = end;
        }
        pairs.push(ReadingPair::new(
            *last,
            reading[cursor..].iter().collect::<String>(),
        ));
        pairs
    }
}

/// Splits `text` wherever a kana character is directly followed by a kanji.
pub fn split_into_blocks(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    let mut blocks = Vec::new();
    let mut start = 0;
    let mut previous: Option<char> = None;
    for (idx, ch) in text.char_indices() {
        if previous.is_some_and(is_kana) && is_kanji(ch) {
            blocks.push(&text[start..idx]);
            start = idx;
        }
        previous = Some(ch);
    }
    blocks.push(&text[start..]);
    blocks
}

pub fn is_kana(ch: char) -> bool {
    matches!(ch, '\u{3040}'..='\u{309f}' | '\u{30a0}'..='\u{30ff}')
}

pub fn is_kanji(ch: char) -> bool {
    matches!(ch, '\u{4e00}'..='\u{9fff}' | '\u{3400}'..='\u{4dbf}' | '々')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(surface: &str, pronunciation: &str) -> (String, usize) {
        let result = GreedyTrailingKana.split_kanji_prefix(surface, pronunciation);
        (result.prefix, result.matched_suffix)
    }

    #[test]
    fn trailing_kana_is_peeled_off() {
        assert_eq!(split("飢えた", "うえた"), ("飢".to_string(), 2));
        assert_eq!(split("食べる", "たべる"), ("食".to_string(), 2));
    }

    #[test]
    fn pure_kanji_keeps_whole_surface() {
        assert_eq!(split("私", "わたし"), ("私".to_string(), 0));
        assert_eq!(split("学校", "がっこう"), ("学校".to_string(), 0));
    }

    #[test]
    fn head_is_never_emptied() {
        // Every character matches, but one surface and one reading character stay.
        assert_eq!(split("あい", "あい"), ("あ".to_string(), 1));
        assert_eq!(split("かな", "な"), ("かな".to_string(), 0));
    }

    #[test]
    fn blocks_split_on_kana_to_kanji() {
        assert_eq!(split_into_blocks("繰り返す"), vec!["繰り", "返す"]);
        assert_eq!(split_into_blocks("学校生活"), vec!["学校生活"]);
        assert_eq!(split_into_blocks("お日様"), vec!["お", "日様"]);
        assert!(split_into_blocks("").is_empty());
    }

    #[test]
    fn re_block_pairs_each_block_with_its_reading() {
        let pairs = GreedyTrailingKana.re_block(&ReadingPair::new("繰り返す", "くりかえす"));
        assert_eq!(
            pairs,
            vec![
                ReadingPair::new("繰り", "くり"),
                ReadingPair::new("返す", "かえす"),
            ]
        );
    }

    #[test]
    fn re_block_handles_repeated_endings() {
        let pairs =
            GreedyTrailingKana.re_block(&ReadingPair::new("見つめ見つめ", "みつめみつめ"));
        assert_eq!(
            pairs,
            vec![
                ReadingPair::new("見つめ", "みつめ"),
                ReadingPair::new("見つめ", "みつめ"),
            ]
        );
    }

    #[test]
    fn re_block_without_transition_is_a_no_op() {
        let pair = ReadingPair::new("飢えた", "うえた");
        assert_eq!(GreedyTrailingKana.re_block(&pair), vec![pair]);
    }

    #[test]
    fn re_block_missing_kana_takes_the_rest() {
        let pairs = GreedyTrailingKana.re_block(&ReadingPair::new("入れ物", "いりもの"));
        assert_eq!(
            pairs,
            vec![
                ReadingPair::new("入れ", "いりもの"),
                ReadingPair::new("物", ""),
            ]
        );
    }

    #[test]
    fn script_classes() {
        assert!(is_kana('あ') && is_kana('ア') && !is_kana('漢'));
        assert!(is_kanji('漢') && is_kanji('々') && !is_kanji('a'));
    }
}
