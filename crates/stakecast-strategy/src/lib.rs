//! Pure decision and settlement math: merging directional model outputs,
//! splitting a stake budget, pro-rata payouts, and classifier performance.

pub mod allocator;
pub mod error;
pub mod merger;
pub mod payout;
pub mod performance;

pub use allocator::{allocate, StakeAllocator};
pub use error::StrategyError;
pub use merger::{merge, models_in_conflict, ConfidenceMerger};
pub use payout::calc_payout;
pub use performance::{
    AccuracyEstimate, ClassificationScores, PerformanceSnapshot, PerformanceTracker,
    ProfitSeries, DEGENERATE_LOG_LOSS,
};
