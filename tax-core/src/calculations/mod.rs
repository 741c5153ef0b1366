//! Tax calculations.
//!
//! The estimator maps a filer's aggregated income to federal tax, state tax
//! and an estimated refund. `common` holds the decimal helpers shared with the
//! presentation layer.

pub mod common;
pub mod estimator;

pub use common::round_whole;
pub use estimator::TaxEstimator;
