//! Pruning callback for the combined training loop

mod pruning_callback;


pub use pruning_callback::PruningCallback;
