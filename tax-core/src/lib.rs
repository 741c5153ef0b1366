pub mod calculations;
pub mod models;

pub use calculations::{TaxEstimator, round_whole};
pub use models::*;
