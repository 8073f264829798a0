//! In-memory labelled dataset

use std::io::BufRead;
use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use super::error::DataError;
use super::tokenizer::{HashingTokenizer, TokenId, TokenizerOptions};

/// One tokenized, labelled example
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub input_ids: Vec<TokenId>,
    pub attention_mask: Vec<u8>,
    pub label: usize,
}

/// JSONL record: `{"sentence": "...", "label": 0}`
#[derive(Debug, Deserialize)]
struct Record {
    sentence: String,
    label: usize,
}

/// Ordered collection of examples
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    examples: Vec<Example>,
}

impl Dataset {
    pub fn from_examples(examples: Vec<Example>) -> Self {
        Self { examples }
    }

    /// Tokenize `(text, label)` pairs
    pub fn from_texts<'a, I>(
        texts: I,
        tokenizer: &HashingTokenizer,
        options: &TokenizerOptions,
    ) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let examples = texts
            .into_iter()
            .map(|(text, label)| {
                let enc = tokenizer.encode(text, options)?;
                Ok(Example { input_ids: enc.input_ids, attention_mask: enc.attention_mask, label })
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Ok(Self { examples })
    }

    /// Load a JSONL file of `{"sentence", "label"}` records. Blank lines are skipped.
    pub fn from_jsonl(
        path: impl AsRef<Path>,
        tokenizer: &HashingTokenizer,
        options: &TokenizerOptions,
    ) -> Result<Self, DataError> {
        let path = path.as_ref();
        let io_err = |source| DataError::Io { path: path.to_path_buf(), source };
        let file = std::fs::File::open(path).map_err(io_err)?;

        let mut examples = Vec::new();
        for (idx, line) in std::io::BufReader::new(file).lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line).map_err(|e| DataError::Parse {
                path: path.to_path_buf(),
                line: idx + 1,
                message: e.to_string(),
            })?;
            let enc = tokenizer.encode(&record.sentence, options)?;
            examples.push(Example {
                input_ids: enc.input_ids,
                attention_mask: enc.attention_mask,
                label: record.label,
            });
        }
        Ok(Self { examples })
    }

    /// Sub-dataset over `range`
    pub fn select(&self, range: Range<usize>) -> Result<Self, DataError> {
        if range.end > self.examples.len() {
            return Err(DataError::SelectOutOfRange { end: range.end, len: self.examples.len() });
        }
        Ok(Self { examples: self.examples[range].to_vec() })
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Example> {
        self.examples.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Example> {
        self.examples.iter()
    }

    pub fn labels(&self) -> Vec<usize> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// `max(label) + 1`, or 0 for an empty dataset
    pub fn num_labels(&self) -> usize {
        self.examples.iter().map(|e| e.label + 1).max().unwrap_or(0)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Example;
    type IntoIter = std::slice::Iter<'a, Example>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
