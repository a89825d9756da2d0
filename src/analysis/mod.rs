//! Analysis modules.
//!
//! Aggregation over stored assessments lives in [`aggregator`].

pub mod aggregator;

pub use aggregator::*;
