pub mod grid_search;

pub use grid_search::{OptimizationResult, ParameterOptimizer, ParameterSet};
