use serde::{Deserialize, Serialize};

use crate::decision::DirectionalSignal;

/// Ground truth for a past epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedOutcome {
    /// Did the close at the end of the epoch come in above the previous close.
    pub true_up_close: bool,
}

/// One replayable epoch: what the models said and how the market resolved.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EpochObservation {
    pub epoch: u64,
    pub prob_up: f64,
    pub prob_down: f64,
    pub true_up_close: bool,
}

impl EpochObservation {
    pub fn signal(&self) -> DirectionalSignal {
        DirectionalSignal {
            prob_up: self.prob_up,
            prob_down: self.prob_down,
        }
    }

    pub fn outcome(&self) -> ResolvedOutcome {
        ResolvedOutcome {
            true_up_close: self.true_up_close,
        }
    }
}
