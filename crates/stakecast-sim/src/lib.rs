pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod multisim;

pub use config::{SimConfig, SimSettings, SweepSettings};
pub use engine::{SimEngine, SimSummary};
pub use error::SimError;
pub use history::{load_history, parse_history};
pub use multisim::{sweep_points, MultiSimEngine, SweepPoint, SweepRow};
