pub mod classifier;
pub mod coordinator;
pub mod error;
pub mod market;
pub mod scheduler;

pub mod test_support;

pub use classifier::{Classifier, DirectionalModels, FeatureSource};
pub use coordinator::{SubmissionCoordinator, TickOutcome};
pub use error::{AgentError, MarketError};
pub use market::{BlockInfo, MarketInterface, Token, TxResult};
pub use scheduler::{EpochScheduler, EpochTick};
