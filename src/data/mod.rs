//! Tokenized text classification data
//!
//! - [`HashingTokenizer`]: stateless word-hash tokenizer with padding and truncation
//! - [`Dataset`]: in-memory labelled examples, loadable from JSONL
//! - [`DataLoader`]: seeded, shuffling batch producer

mod dataset;
mod error;
mod loader;
mod tokenizer;

pub use dataset::{Dataset, Example};
pub use error::DataError;
pub use loader::{Batch, DataLoader};
pub use tokenizer::{
    Encoding, HashingTokenizer, Padding, TokenId, TokenizerOptions, CLS_TOKEN_ID, PAD_TOKEN_ID,
    SEP_TOKEN_ID, UNK_TOKEN_ID,
};
