pub mod config;
pub mod decision;
pub mod direction;
pub mod error;
pub mod history;
pub mod submission;

pub use config::{LedgerConfig, SchedulerConfig, StakecastConfig, StakingConfig};
pub use decision::{Approach, Decision, DirectionalSignal, StakeSplit};
pub use direction::{Direction, PerDirection};
pub use error::ConfigError;
pub use history::{EpochObservation, ResolvedOutcome};
pub use submission::{EpochState, LegAttempt, LegOutcome, SubmissionRecord};
