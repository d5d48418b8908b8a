// Analyzer module: the per-series scoring primitives.

pub mod competitive;
pub mod outliers;
pub mod price_stability;
pub mod rank_stability;
pub mod trend;

pub use competitive::competitive_position;
pub use outliers::remove_outliers;
pub use price_stability::{analyze_price, default_price_analysis};
pub use rank_stability::analyze_rank;
pub use trend::calculate_trend;
