use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::types::ReadingPair;

use super::{ReadingError, ReadingProvider};

/// Readings computed ahead of time by an external analyzer, keyed by the
/// plain text of each line.
///
/// The JSON form is an object mapping line text to `[surface, reading]`
/// arrays: `{"私は": [["私", "わたし"], ["は", "は"]]}`.
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    lines: HashMap<String, Vec<ReadingPair>>,
}

impl ReadingTable {
    pub fn from_json(raw: &str) -> Result<Self, ReadingError> {
        let lines: HashMap<String, Vec<ReadingPair>> = serde_json::from_str(raw)?;
        for (line, pairs) in &lines {
            let surfaces: String = pairs.iter().map(|pair| pair.surface.as_str()).collect();
            if &surfaces != line {
                return Err(ReadingError::SurfaceMismatch {
                    line: line.clone(),
                    surfaces,
                });
            }
        }
        Ok(Self { lines })
    }

    pub fn from_path(path: &Path) -> Result<Self, ReadingError> {
        let raw = fs::read_to_string(path).map_err(|source| ReadingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn insert(&mut self, line: impl Into<String>, pairs: Vec<ReadingPair>) {
        self.lines.insert(line.into(), pairs);
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl ReadingProvider for ReadingTable {
    fn readings(&self, text: &str) -> Result<Vec<ReadingPair>, ReadingError> {
        self.lines
            .get(text)
            .cloned()
            .ok_or_else(|| ReadingError::MissingLine(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn looks_up_lines_by_plain_text() {
        let table =
            ReadingTable::from_json(r#"{"私は": [["私", "わたし"], ["は", "は"]]}"#).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.readings("私は").unwrap(),
            vec![ReadingPair::new("私", "わたし"), ReadingPair::identity("は")]
        );
    }

    #[test]
    fn missing_line_is_an_error() {
        let table = ReadingTable::default();
        assert!(matches!(
            table.readings("夢"),
            Err(ReadingError::MissingLine(line)) if line == "夢"
        ));
    }

    #[test]
    fn rejects_pairs_that_do_not_spell_the_line() {
        let err = ReadingTable::from_json(r#"{"私は": [["私", "わたし"]]}"#).unwrap_err();
        assert!(matches!(err, ReadingError::SurfaceMismatch { .. }));
    }
}
