//! Model evaluation
//!
//! - `evaluator`: loss and accuracy over a dataset, argmax helpers
//! - `metric`: acceptance of a candidate model against its baseline
//!
//! The orchestrator never gates on the metric itself; callers compare the
//! optimized model's [`EvalReport`] against the baseline's.

mod evaluator;
mod metric;

pub use evaluator::{accuracy, argmax_rows, evaluate, EvalReport};
pub use metric::{Metric, MetricComparison};
