//! Tests for pruning configuration module.

use super::*;
use crate::prune::PruningSchedule;

const LAYERS: [&str; 2] = ["pre_classifier", "classifier"];

// =============================================================================
// PruneMethod / SparsityPatternConfig
// =============================================================================

#[test]
fn test_prune_method_default() {
    assert_eq!(PruneMethod::default(), PruneMethod::Magnitude);
    assert!(!PruneMethod::Magnitude.uses_gradients());
    assert!(PruneMethod::snip_momentum().uses_gradients());
    assert_eq!(PruneMethod::snip_momentum().display_name(), "SNIP (momentum)");
}

#[test]
fn test_nm_theoretical_sparsity() {
    assert_eq!(SparsityPatternConfig::nm_2_4().theoretical_sparsity(), Some(0.5));
    assert_eq!(SparsityPatternConfig::Unstructured.theoretical_sparsity(), None);
}

#[test]
fn test_pattern_block_shapes() {
    assert_eq!(SparsityPatternConfig::Unstructured.block_shape(4, 8), Some((1, 1)));
    assert_eq!(SparsityPatternConfig::Row.block_shape(4, 8), Some((1, 8)));
    assert_eq!(SparsityPatternConfig::Column.block_shape(4, 8), Some((4, 1)));
    assert_eq!(SparsityPatternConfig::nm_2_4().block_shape(4, 8), None);
}

#[test]
fn test_pattern_check_shape() {
    assert!(SparsityPatternConfig::nm_2_4().check_shape(3, 8).is_ok());
    assert!(SparsityPatternConfig::nm_2_4().check_shape(3, 6).is_err());
    let block = SparsityPatternConfig::Block { height: 4, width: 1 };
    assert!(block.check_shape(8, 3).is_ok());
    assert!(block.check_shape(6, 3).is_err());
}

#[test]
fn test_pattern_serde() {
    let pattern: SparsityPatternConfig = serde_yaml::from_str("type: nm\nn: 2\nm: 4\n").unwrap();
    assert_eq!(pattern, SparsityPatternConfig::nm_2_4());
    let block: SparsityPatternConfig =
        serde_yaml::from_str("type: block\nheight: 4\nwidth: 1\n").unwrap();
    assert_eq!(block, SparsityPatternConfig::Block { height: 4, width: 1 });
}

// =============================================================================
// PruningConfig
// =============================================================================

#[test]
fn test_default_excludes_classifier() {
    let config = PruningConfig::default();
    assert!(config.validate().is_ok());
    let resolved = config.resolve(&LAYERS);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].layers, vec!["pre_classifier".to_string()]);
    assert_eq!(resolved[0].schedule, PruningSchedule::Cubic { start_step: 0, end_step: 0, frequency: 1 });
}

#[test]
fn test_explicit_target_layers_override_exclusion() {
    let config = PruningConfig::default().with_target_layers(["classifier"]);
    assert_eq!(config.resolve(&LAYERS)[0].layers, vec!["classifier".to_string()]);
}

#[test]
fn test_window_overrides() {
    let config = PruningConfig::default().with_target_sparsity(0.5).with_pruners(vec![
        PrunerWindow::new(0, 4).with_target_layers(["pre_classifier"]).with_target_sparsity(0.8),
        PrunerWindow::new(2, 6).with_target_layers(["classifier"]),
    ]);
    let resolved = config.resolve(&LAYERS);
    assert_eq!(resolved[0].target_sparsity, 0.8);
    assert_eq!(resolved[1].target_sparsity, 0.5);
    assert_eq!(resolved[1].layers, vec!["classifier".to_string()]);
    assert_eq!(config.last_step(), 6);
}

#[test]
fn test_oneshot_kind_prunes_at_window_end() {
    let config = PruningConfig::default().with_window(3, 7).with_schedule(ScheduleKind::OneShot);
    assert_eq!(config.resolve(&LAYERS)[0].schedule, PruningSchedule::OneShot { step: 7 });
}

#[test]
fn test_validate_sparsity_range() {
    assert!(PruningConfig::default().with_target_sparsity(1.0).validate().is_err());
    assert!(PruningConfig::default().with_target_sparsity(-0.1).validate().is_err());
    assert!(PruningConfig::default().with_target_sparsity(0.0).validate().is_ok());
    let bad_window = PruningConfig::default()
        .with_pruners(vec![PrunerWindow::new(0, 1).with_target_sparsity(1.5)]);
    assert!(bad_window.validate().is_err());
}

#[test]
fn test_validate_reversed_window() {
    let err = PruningConfig::default().with_window(5, 1).validate().unwrap_err();
    assert!(err.contains("end_step"), "unexpected message: {err}");
}

#[test]
fn test_validate_no_pruners() {
    assert!(PruningConfig::default().with_pruners(Vec::new()).validate().is_err());
}

#[test]
fn test_validate_nm_rules() {
    let nm = PruningConfig::default().with_pattern(SparsityPatternConfig::nm_2_4());
    assert!(nm.clone().with_target_sparsity(0.5).validate().is_ok());
    assert!(nm.clone().with_target_sparsity(0.6).validate().is_err());
    assert!(nm.with_target_sparsity(0.5).with_scope(PruningScope::Global).validate().is_err());
    let degenerate = PruningConfig::default()
        .with_pattern(SparsityPatternConfig::NM { n: 4, m: 4 })
        .with_target_sparsity(0.0);
    assert!(degenerate.validate().is_err());
}

#[test]
fn test_validate_snip_beta() {
    let config = PruningConfig::default().with_method(PruneMethod::SnipMomentum { beta: 1.0 });
    assert!(config.validate().is_err());
}

#[test]
fn test_yaml_with_defaults() {
    let yaml = r#"
target_sparsity: 0.64
scope: local
pruners:
  - start_step: 0
    end_step: 2
"#;
    let config: PruningConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.target_sparsity(), 0.64);
    assert_eq!(config.schedule(), ScheduleKind::Cubic);
    assert_eq!(config.excluded_layers(), &["classifier".to_string()]);
    assert_eq!(config.pruners()[0], PrunerWindow::new(0, 2));
}
