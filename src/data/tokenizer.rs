//! Word-hashing tokenizer

use serde::{Deserialize, Serialize};

use super::error::DataError;

/// Token ID type
pub type TokenId = u32;

pub const PAD_TOKEN_ID: TokenId = 0;
pub const UNK_TOKEN_ID: TokenId = 1;
pub const CLS_TOKEN_ID: TokenId = 2;
pub const SEP_TOKEN_ID: TokenId = 3;
const NUM_SPECIAL: TokenId = 4;

/// Padding strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    /// Pad each batch to its longest sequence
    #[default]
    Longest,
    /// Pad every sequence to `max_length`
    MaxLength,
    /// Never pad (batches still pad to longest for stacking)
    DoNotPad,
}

/// Encoding options, mirroring the usual tokenizer call arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    pub max_length: usize,
    pub padding: Padding,
    pub truncation: bool,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self { max_length: 64, padding: Padding::Longest, truncation: true }
    }
}

impl TokenizerOptions {
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_truncation(mut self, truncation: bool) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_length < 2 {
            return Err(format!("max_length must be at least 2 (got {})", self.max_length));
        }
        Ok(())
    }
}

/// Encoded sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoding {
    pub input_ids: Vec<TokenId>,
    pub attention_mask: Vec<u8>,
}

/// Stateless tokenizer mapping lowercased words into a fixed vocabulary by
/// FNV-1a hash. Sequences are framed with `[CLS] ... [SEP]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashingTokenizer {
    vocab_size: usize,
    lowercase: bool,
}

impl HashingTokenizer {
    /// Create a tokenizer; `vocab_size` includes the four special tokens.
    pub fn new(vocab_size: usize) -> Self {
        Self { vocab_size: vocab_size.max(NUM_SPECIAL as usize + 1), lowercase: true }
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Token id for a single word
    pub fn token_id(&self, word: &str) -> TokenId {
        if word.is_empty() {
            return UNK_TOKEN_ID;
        }
        let buckets = (self.vocab_size as u64) - u64::from(NUM_SPECIAL);
        let hash = if self.lowercase { fnv1a(word.to_lowercase().as_bytes()) } else { fnv1a(word.as_bytes()) };
        NUM_SPECIAL + (hash % buckets) as TokenId
    }

    /// Encode one text
    pub fn encode(&self, text: &str, options: &TokenizerOptions) -> Result<Encoding, DataError> {
        options.validate().map_err(DataError::InvalidOptions)?;

        let words: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || (c.is_ascii_punctuation() && c != '\''))
            .filter(|w| !w.is_empty())
            .collect();

        let len = words.len() + 2;
        let body = if len > options.max_length {
            if !options.truncation {
                return Err(DataError::SequenceTooLong { len, max_length: options.max_length });
            }
            &words[..options.max_length - 2]
        } else {
            &words[..]
        };

        let mut input_ids = Vec::with_capacity(options.max_length);
        input_ids.push(CLS_TOKEN_ID);
        input_ids.extend(body.iter().map(|w| self.token_id(w)));
        input_ids.push(SEP_TOKEN_ID);
        let mut attention_mask = vec![1u8; input_ids.len()];

        if options.padding == Padding::MaxLength {
            input_ids.resize(options.max_length, PAD_TOKEN_ID);
            attention_mask.resize(options.max_length, 0);
        }

        Ok(Encoding { input_ids, attention_mask })
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_with_cls_and_sep() {
        let tok = HashingTokenizer::new(128);
        let enc = tok.encode("a great movie", &TokenizerOptions::default()).unwrap();
        assert_eq!(enc.input_ids.len(), 5);
        assert_eq!(enc.input_ids[0], CLS_TOKEN_ID);
        assert_eq!(enc.input_ids[4], SEP_TOKEN_ID);
        assert!(enc.attention_mask.iter().all(|&m| m == 1));
        assert!(enc.input_ids[1..4].iter().all(|&id| id >= 4 && (id as usize) < 128));
    }

    #[test]
    fn test_lowercase_and_punctuation() {
        let tok = HashingTokenizer::new(1000);
        assert_eq!(tok.token_id("Great"), tok.token_id("great"));
        let a = tok.encode("great, movie!", &TokenizerOptions::default()).unwrap();
        let b = tok.encode("great movie", &TokenizerOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_truncation() {
        let tok = HashingTokenizer::new(64);
        let opts = TokenizerOptions::default().with_max_length(4);
        let enc = tok.encode("one two three four five", &opts).unwrap();
        assert_eq!(enc.input_ids.len(), 4);
        assert_eq!(enc.input_ids[3], SEP_TOKEN_ID);

        let err = tok.encode("one two three", &opts.with_truncation(false)).unwrap_err();
        assert!(matches!(err, DataError::SequenceTooLong { len: 5, max_length: 4 }));
    }

    #[test]
    fn test_max_length_padding() {
        let tok = HashingTokenizer::new(64);
        let opts = TokenizerOptions::default().with_max_length(8).with_padding(Padding::MaxLength);
        let enc = tok.encode("short", &opts).unwrap();
        assert_eq!(enc.input_ids.len(), 8);
        assert_eq!(enc.attention_mask, vec![1, 1, 1, 0, 0, 0, 0, 0]);
        assert_eq!(enc.input_ids[7], PAD_TOKEN_ID);
    }

    #[test]
    fn test_empty_text_is_cls_sep() {
        let tok = HashingTokenizer::new(64);
        let enc = tok.encode("", &TokenizerOptions::default()).unwrap();
        assert_eq!(enc.input_ids, vec![CLS_TOKEN_ID, SEP_TOKEN_ID]);
    }
}
