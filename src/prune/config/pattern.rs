//! Sparsity pattern configuration.

use serde::{Deserialize, Serialize};

/// Sparsity pattern selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SparsityPatternConfig {
    /// Unstructured sparsity - any weight can be pruned.
    #[default]
    Unstructured,

    /// N:M structured sparsity (e.g., 2:4 for NVIDIA Ampere).
    /// `n` weights are kept in every group of `m` along the input dimension.
    #[serde(rename = "nm")]
    NM {
        /// Number of non-zero elements per group.
        n: usize,
        /// Group size.
        m: usize,
    },

    /// Block sparsity - entire blocks pruned together.
    Block {
        /// Block height (output dimension).
        height: usize,
        /// Block width (input dimension).
        width: usize,
    },

    /// Row sparsity - entire output channels pruned.
    Row,

    /// Column sparsity - entire input channels pruned.
    Column,
}

impl SparsityPatternConfig {
    /// Create 2:4 sparsity pattern for NVIDIA Ampere.
    pub fn nm_2_4() -> Self {
        SparsityPatternConfig::NM { n: 2, m: 4 }
    }

    /// Sparsity fixed by the pattern itself, if any.
    pub fn theoretical_sparsity(&self) -> Option<f32> {
        match self {
            SparsityPatternConfig::NM { n, m } => Some(1.0 - (*n as f32 / *m as f32)),
            _ => None,
        }
    }

    /// Block shape for a `[rows, cols]` weight, `None` for N:M.
    pub fn block_shape(&self, rows: usize, cols: usize) -> Option<(usize, usize)> {
        match *self {
            SparsityPatternConfig::Unstructured => Some((1, 1)),
            SparsityPatternConfig::Block { height, width } => Some((height, width)),
            SparsityPatternConfig::Row => Some((1, cols)),
            SparsityPatternConfig::Column => Some((rows, 1)),
            SparsityPatternConfig::NM { .. } => None,
        }
    }

    /// Validate the pattern parameters on their own.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            SparsityPatternConfig::NM { n, m } => {
                if m == 0 {
                    return Err("M cannot be 0".to_string());
                }
                if n == 0 || n >= m {
                    return Err(format!("N ({n}) must be in 1..M ({m})"));
                }
            }
            SparsityPatternConfig::Block { height, width } => {
                if height == 0 || width == 0 {
                    return Err("Block dimensions must be non-zero".to_string());
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Check that a `[rows, cols]` weight can be tiled by the pattern.
    pub fn check_shape(&self, rows: usize, cols: usize) -> Result<(), String> {
        match *self {
            SparsityPatternConfig::NM { m, .. } if !cols.is_multiple_of(m) => {
                Err(format!("input dimension {cols} is not divisible by M ({m})"))
            }
            SparsityPatternConfig::Block { height, width }
                if !rows.is_multiple_of(height) || !cols.is_multiple_of(width) =>
            {
                Err(format!("weight [{rows}, {cols}] is not divisible into {height}x{width} blocks"))
            }
            _ => Ok(()),
        }
    }
}
