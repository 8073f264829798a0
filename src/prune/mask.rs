//! Mask computation from importance scores
//!
//! Scores are grouped into units (single weights, blocks, rows, columns or
//! N:M groups), the lowest-scoring units are removed, and the result is
//! intersected with any existing mask so sparsity only ever grows.

use ndarray::{s, Array2};

use super::config::{PruningScope, SparsityPatternConfig};

/// Score assigned to units that are already pruned so they are selected first
const PRUNED: f32 = f32::NEG_INFINITY;

/// One layer's inputs to mask computation
#[derive(Debug, Clone, Copy)]
pub struct MaskInput<'a> {
    /// Importance scores, same shape as the weight
    pub scores: &'a Array2<f32>,
    /// Existing mask, if the layer was pruned before
    pub current: Option<&'a Array2<f32>>,
}

/// Compute new masks for a group of layers pruned together.
///
/// With [`PruningScope::Local`] every layer drops `round(sparsity * units)` of
/// its own units; with [`PruningScope::Global`] the lowest units across all
/// layers are dropped until the total reaches the target.
pub fn compute_masks(
    inputs: &[MaskInput<'_>],
    pattern: &SparsityPatternConfig,
    scope: PruningScope,
    sparsity: f32,
) -> Result<Vec<Array2<f32>>, String> {
    pattern.validate()?;
    let sparsity = sparsity.clamp(0.0, 1.0);

    if let SparsityPatternConfig::NM { n, m } = *pattern {
        if scope == PruningScope::Global {
            return Err("N:M patterns cannot use global scope".to_string());
        }
        return inputs.iter().map(|input| nm_mask(input, n, m, sparsity)).collect();
    }

    let mut unit_scores = Vec::with_capacity(inputs.len());
    let mut blocks = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (rows, cols) = input.scores.dim();
        pattern.check_shape(rows, cols)?;
        let block = pattern.block_shape(rows, cols).unwrap_or((1, 1));
        unit_scores.push(block_scores(&effective_scores(input), block));
        blocks.push(block);
    }

    let unit_masks = match scope {
        PruningScope::Local => unit_scores
            .iter()
            .map(|scores| {
                let k = (sparsity * scores.len() as f32).round() as usize;
                select_lowest(std::slice::from_ref(scores), k).remove(0)
            })
            .collect::<Vec<_>>(),
        PruningScope::Global => {
            let total: usize = unit_scores.iter().map(Array2::len).sum();
            let k = (sparsity * total as f32).round() as usize;
            select_lowest(&unit_scores, k)
        }
    };

    Ok(inputs
        .iter()
        .zip(unit_masks)
        .zip(blocks)
        .map(|((input, unit_mask), block)| {
            let mask = expand(&unit_mask, block, input.scores.dim());
            intersect(mask, input.current)
        })
        .collect())
}

/// Fraction of zeros in a mask
pub fn mask_sparsity(mask: &Array2<f32>) -> f32 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|&&m| m == 0.0).count() as f32 / mask.len() as f32
}

fn effective_scores(input: &MaskInput<'_>) -> Array2<f32> {
    let mut scores = input.scores.mapv(|s| if s.is_nan() { 0.0 } else { s });
    if let Some(current) = input.current {
        scores.zip_mut_with(current, |s, &m| {
            if m == 0.0 {
                *s = PRUNED;
            }
        });
    }
    scores
}

/// Sum of scores per `(bh, bw)` block
fn block_scores(scores: &Array2<f32>, (bh, bw): (usize, usize)) -> Array2<f32> {
    if (bh, bw) == (1, 1) {
        return scores.clone();
    }
    let (rows, cols) = scores.dim();
    Array2::from_shape_fn((rows / bh, cols / bw), |(r, c)| {
        scores.slice(s![r * bh..(r + 1) * bh, c * bw..(c + 1) * bw]).sum()
    })
}

/// Zero the `k` lowest units across `groups`; ties break on position.
fn select_lowest(groups: &[Array2<f32>], k: usize) -> Vec<Array2<f32>> {
    let mut ranked: Vec<(f32, usize, usize)> = groups
        .iter()
        .enumerate()
        .flat_map(|(g, scores)| scores.iter().enumerate().map(move |(i, &s)| (s, g, i)))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut masks: Vec<Array2<f32>> = groups.iter().map(|g| Array2::ones(g.dim())).collect();
    for &(_, g, i) in ranked.iter().take(k) {
        let cols = masks[g].ncols();
        masks[g][[i / cols, i % cols]] = 0.0;
    }
    masks
}

fn expand(unit_mask: &Array2<f32>, (bh, bw): (usize, usize), dim: (usize, usize)) -> Array2<f32> {
    Array2::from_shape_fn(dim, |(r, c)| unit_mask[[r / bh, c / bw]])
}

fn intersect(mut mask: Array2<f32>, current: Option<&Array2<f32>>) -> Array2<f32> {
    if let Some(current) = current {
        mask.zip_mut_with(current, |m, &c| *m = m.min(c));
    }
    mask
}

/// Per group of `m` inputs, drop `round(sparsity * m)` weights (at most `m - n`).
fn nm_mask(input: &MaskInput<'_>, n: usize, m: usize, sparsity: f32) -> Result<Array2<f32>, String> {
    let (rows, cols) = input.scores.dim();
    SparsityPatternConfig::NM { n, m }.check_shape(rows, cols)?;
    let scores = effective_scores(input);
    let drop = ((sparsity * m as f32).round() as usize).min(m - n);

    let mut mask = Array2::ones((rows, cols));
    for r in 0..rows {
        for g in (0..cols).step_by(m) {
            let mut idx: Vec<usize> = (g..g + m).collect();
            idx.sort_by(|&a, &b| scores[[r, a]].total_cmp(&scores[[r, b]]).then(a.cmp(&b)));
            for &c in idx.iter().take(drop) {
                mask[[r, c]] = 0.0;
            }
        }
    }
    Ok(intersect(mask, input.current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    fn local(scores: &Array2<f32>, pattern: SparsityPatternConfig, sparsity: f32) -> Array2<f32> {
        compute_masks(&[MaskInput { scores, current: None }], &pattern, PruningScope::Local, sparsity)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_unstructured_drops_smallest() {
        let scores = array![[0.9, 0.1, 0.5], [0.2, 0.8, 0.3]];
        let mask = local(&scores, SparsityPatternConfig::Unstructured, 0.5);
        assert_eq!(mask, array![[1.0, 0.0, 1.0], [0.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_target_rounding() {
        let scores = Array2::from_shape_fn((32, 32), |(r, c)| (r * 32 + c) as f32);
        let mask = local(&scores, SparsityPatternConfig::Unstructured, 0.64);
        // round(0.64 * 1024) = 655
        assert_eq!(mask.iter().filter(|&&m| m == 0.0).count(), 655);
        assert!((mask_sparsity(&mask) - 0.64).abs() < 0.001);
    }

    #[test]
    fn test_existing_mask_is_kept() {
        let scores = array![[5.0, 4.0, 3.0, 2.0]];
        let current = array![[0.0, 1.0, 1.0, 1.0]];
        let mask = compute_masks(
            &[MaskInput { scores: &scores, current: Some(&current) }],
            &SparsityPatternConfig::Unstructured,
            PruningScope::Local,
            0.5,
        )
        .unwrap()
        .remove(0);
        // Already-pruned slot counts toward the target; one more is the smallest
        assert_eq!(mask, array![[0.0, 1.0, 1.0, 0.0]]);
    }

    #[test]
    fn test_block_pattern() {
        let scores = array![[1.0, 1.0, 9.0, 9.0], [1.0, 1.0, 9.0, 9.0]];
        let mask = local(&scores, SparsityPatternConfig::Block { height: 2, width: 2 }, 0.5);
        assert_eq!(mask, array![[0.0, 0.0, 1.0, 1.0], [0.0, 0.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_row_and_column_patterns() {
        let scores = array![[1.0, 5.0], [0.1, 0.2], [3.0, 4.0]];
        let rows = local(&scores, SparsityPatternConfig::Row, 0.34);
        assert_eq!(rows.row(1).sum(), 0.0);
        assert_eq!(rows.sum(), 4.0);
        let cols = local(&scores, SparsityPatternConfig::Column, 0.5);
        assert_eq!(cols.column(0).sum(), 0.0);
        assert_eq!(cols.column(1).sum(), 3.0);
    }

    #[test]
    fn test_nm_pattern() {
        let scores = array![[4.0, 1.0, 3.0, 2.0, 0.5, 0.6, 0.7, 0.8]];
        let mask = local(&scores, SparsityPatternConfig::nm_2_4(), 0.5);
        assert_eq!(mask, array![[1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0]]);
    }

    #[test]
    fn test_nm_rejects_bad_shape() {
        let scores = Array2::ones((2, 6));
        let result = compute_masks(
            &[MaskInput { scores: &scores, current: None }],
            &SparsityPatternConfig::nm_2_4(),
            PruningScope::Local,
            0.5,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_global_scope_balances_across_layers() {
        let small = array![[0.1, 0.2], [0.3, 0.4]];
        let large = array![[5.0, 6.0], [7.0, 8.0]];
        let masks = compute_masks(
            &[MaskInput { scores: &small, current: None }, MaskInput { scores: &large, current: None }],
            &SparsityPatternConfig::Unstructured,
            PruningScope::Global,
            0.5,
        )
        .unwrap();
        assert_relative_eq!(mask_sparsity(&masks[0]), 1.0);
        assert_relative_eq!(mask_sparsity(&masks[1]), 0.0);
    }

    #[test]
    fn test_zero_sparsity_keeps_everything() {
        let scores = array![[1.0, 2.0]];
        assert_eq!(local(&scores, SparsityPatternConfig::Unstructured, 0.0), array![[1.0, 1.0]]);
    }

    proptest! {
        #[test]
        fn prop_masks_grow_monotonically(
            values in proptest::collection::vec(-1.0f32..1.0, 24),
            first in 0.0f32..0.9,
            extra in 0.0f32..0.1,
        ) {
            let scores = Array2::from_shape_vec((4, 6), values).unwrap().mapv(f32::abs);
            let a = local(&scores, SparsityPatternConfig::Unstructured, first);
            let b = compute_masks(
                &[MaskInput { scores: &scores, current: Some(&a) }],
                &SparsityPatternConfig::Unstructured,
                PruningScope::Local,
                first + extra,
            ).unwrap().remove(0);
            for (x, y) in a.iter().zip(b.iter()) {
                prop_assert!(y <= x);
            }
            let expected = ((first + extra) * 24.0).round() as usize;
            prop_assert_eq!(b.iter().filter(|&&m| m == 0.0).count(), expected);
        }
    }
}
