//! Property tests for evaluation and metric acceptance
//!
//! - Accuracy bounded to [0, 1]
//! - Argmax always picks a maximal column
//! - Acceptance is monotone in the candidate value and in the criterion

use ndarray::Array2;
use orquestar::eval::{accuracy, argmax_rows, Metric};
use proptest::collection::vec;
use proptest::prelude::*;

// =============================================================================
// Strategy Helpers
// =============================================================================

/// Generate pair of prediction/true labels with same length
fn label_pair(n_classes: usize, len: std::ops::Range<usize>) -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
    len.prop_flat_map(move |l| (vec(0..n_classes, l), vec(0..n_classes, l)))
}

fn logits(rows: std::ops::Range<usize>, cols: usize) -> impl Strategy<Value = Array2<f32>> {
    rows.prop_flat_map(move |r| {
        vec(-10.0f32..10.0, r * cols).prop_map(move |v| Array2::from_shape_vec((r, cols), v).unwrap())
    })
}

// =============================================================================
// Accuracy Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_accuracy_bounded((y_pred, y_true) in label_pair(5, 1..100)) {
        let acc = accuracy(&y_pred, &y_true);
        prop_assert!((0.0..=1.0).contains(&acc), "Accuracy {} not in [0, 1]", acc);
    }

    #[test]
    fn prop_accuracy_perfect(y in vec(0usize..3, 1..50)) {
        prop_assert_eq!(accuracy(&y, &y), 1.0);
    }

    #[test]
    fn prop_argmax_is_maximal(m in logits(1..20, 4)) {
        let picks = argmax_rows(&m);
        prop_assert_eq!(picks.len(), m.nrows());
        for (row, &col) in m.rows().into_iter().zip(&picks) {
            let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
            prop_assert_eq!(row[col], max);
        }
    }
}

// =============================================================================
// Metric Acceptance Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn prop_better_candidate_never_rejected(
        baseline in 0.01f32..1.0,
        candidate in 0.0f32..1.0,
        gain in 0.0f32..0.5,
        criterion in 0.0f32..1.0,
        relative in any::<bool>(),
    ) {
        let metric = Metric::new("eval_accuracy", relative, criterion);
        if metric.accepts(baseline, candidate) {
            prop_assert!(metric.accepts(baseline, candidate + gain));
        }
    }

    #[test]
    fn prop_looser_criterion_never_rejects_more(
        baseline in 0.01f32..1.0,
        candidate in 0.0f32..1.0,
        criterion in 0.0f32..0.5,
        slack in 0.0f32..0.5,
    ) {
        let strict = Metric::new("eval_accuracy", true, criterion);
        let loose = Metric::new("eval_accuracy", true, criterion + slack);
        if strict.accepts(baseline, candidate) {
            prop_assert!(loose.accepts(baseline, candidate));
        }
    }

    #[test]
    fn prop_no_change_always_accepted(baseline in 0.0f32..1.0, relative in any::<bool>()) {
        let metric = Metric::new("eval_accuracy", relative, 0.0);
        prop_assert!(metric.accepts(baseline, baseline));
    }

    #[test]
    fn prop_lower_is_better_mirrors(baseline in 0.1f32..2.0, delta in -0.5f32..0.5, criterion in 0.0f32..0.5) {
        prop_assume!((delta - criterion).abs() > 1e-4);
        let up = Metric::new("eval_accuracy", false, criterion);
        let down = Metric::new("eval_loss", false, criterion).with_greater_is_better(false);
        prop_assert_eq!(up.accepts(baseline, baseline - delta), down.accepts(baseline, baseline + delta));
    }
}
