//! Ensemble scoring and explanation aggregation.

pub mod aggregator;
pub mod ensemble;
pub mod weights;

pub use aggregator::*;
pub use ensemble::{EnsembleCombiner, Verdict};
pub use weights::{renormalize, WeightTable};
