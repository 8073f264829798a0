//! Batch collation and seeded shuffling

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::dataset::{Dataset, Example};
use super::error::DataError;
use super::tokenizer::{TokenId, PAD_TOKEN_ID};

/// A padded batch of examples
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Token ids `[batch, seq_len]`, padded with [`PAD_TOKEN_ID`]
    pub input_ids: Array2<TokenId>,
    /// 1 for real tokens, 0 for padding
    pub attention_mask: Array2<u8>,
    pub labels: Vec<usize>,
}

impl Batch {
    /// Stack examples, padding to the longest one
    pub fn collate(examples: &[&Example]) -> Self {
        let seq_len = examples.iter().map(|e| e.input_ids.len()).max().unwrap_or(0);
        let mut input_ids = Array2::from_elem((examples.len(), seq_len), PAD_TOKEN_ID);
        let mut attention_mask = Array2::zeros((examples.len(), seq_len));

        for (row, example) in examples.iter().enumerate() {
            for (col, (&id, &mask)) in example.input_ids.iter().zip(&example.attention_mask).enumerate() {
                input_ids[[row, col]] = id;
                attention_mask[[row, col]] = mask;
            }
        }

        Self { input_ids, attention_mask, labels: examples.iter().map(|e| e.label).collect() }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn seq_len(&self) -> usize {
        self.input_ids.ncols()
    }
}

/// Batches over a borrowed dataset.
///
/// With shuffling on, epoch `e` uses the permutation drawn from `seed + e`,
/// so two loaders with the same seed produce identical batches.
#[derive(Debug, Clone)]
pub struct DataLoader<'a> {
    dataset: &'a Dataset,
    batch_size: usize,
    shuffle: bool,
    seed: u64,
}

impl<'a> DataLoader<'a> {
    pub fn new(dataset: &'a Dataset, batch_size: usize) -> Result<Self, DataError> {
        if batch_size == 0 {
            return Err(DataError::InvalidBatchSize);
        }
        Ok(Self { dataset, batch_size, shuffle: false, seed: 0 })
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Batches per epoch (last partial batch included)
    pub fn num_batches(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    /// All batches of one epoch
    pub fn epoch(&self, epoch: usize) -> Vec<Batch> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.shuffle {
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(epoch as u64));
            order.shuffle(&mut rng);
        }
        order
            .chunks(self.batch_size)
            .map(|chunk| {
                let examples: Vec<&Example> =
                    chunk.iter().filter_map(|&i| self.dataset.get(i)).collect();
                Batch::collate(&examples)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{HashingTokenizer, TokenizerOptions};

    fn dataset(n: usize) -> Dataset {
        let texts: Vec<String> = (0..n).map(|i| "word ".repeat(i % 4 + 1)).collect();
        Dataset::from_texts(
            texts.iter().enumerate().map(|(i, t)| (t.as_str(), i % 2)),
            &HashingTokenizer::new(64),
            &TokenizerOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_collate_pads_to_longest() {
        let ds = dataset(3);
        let batch = Batch::collate(&ds.iter().collect::<Vec<_>>());
        assert_eq!(batch.input_ids.dim(), (3, 5));
        assert_eq!(batch.attention_mask.row(0).sum(), 3);
        assert_eq!(batch.input_ids[[0, 4]], PAD_TOKEN_ID);
        assert_eq!(batch.labels, vec![0, 1, 0]);
    }

    #[test]
    fn test_partial_last_batch() {
        let ds = dataset(10);
        let loader = DataLoader::new(&ds, 4).unwrap();
        let batches = loader.epoch(0);
        assert_eq!(loader.num_batches(), 3);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 2);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let ds = dataset(16);
        let a = DataLoader::new(&ds, 4).unwrap().with_shuffle(42);
        let b = DataLoader::new(&ds, 4).unwrap().with_shuffle(42);
        assert_eq!(a.epoch(1), b.epoch(1));
        let total: usize = a.epoch(0).iter().map(Batch::len).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let ds = dataset(2);
        assert!(matches!(DataLoader::new(&ds, 0), Err(DataError::InvalidBatchSize)));
    }
}
