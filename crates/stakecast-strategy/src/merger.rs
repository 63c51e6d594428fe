use stakecast_models::decision::{Decision, DirectionalSignal};

use crate::error::{ensure_unit_interval, StrategyError};

/// Merges the up-model and down-model outputs into one [`Decision`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceMerger {
    conf_thr: f64,
}

impl ConfidenceMerger {
    pub fn new(conf_thr: f64) -> Result<Self, StrategyError> {
        ensure_unit_interval("conf_thr", conf_thr)?;
        Ok(Self { conf_thr })
    }

    pub fn threshold(&self) -> f64 {
        self.conf_thr
    }

    pub fn merge(&self, signal: &DirectionalSignal) -> Result<Decision, StrategyError> {
        merge(signal.prob_up, signal.prob_down, self.conf_thr)
    }
}

/// Both models sit strictly on the same side of 0.5: each claims its own event
/// is likely, or each doubts it.
pub fn models_in_conflict(prob_up: f64, prob_down: f64) -> Result<bool, StrategyError> {
    ensure_unit_interval("prob_up", prob_up)?;
    ensure_unit_interval("prob_down", prob_down)?;
    Ok((prob_up > 0.5 && prob_down > 0.5) || (prob_up < 0.5 && prob_down < 0.5))
}

/// Combine the two directional probabilities.
///
/// `prob_up` is the up-model's probability of an up move; `prob_down` is the
/// down-model's probability of a down move. The dominant model sets the merged
/// probability of up and, when its confidence clears `conf_thr`, the
/// prediction.
pub fn merge(prob_up: f64, prob_down: f64, conf_thr: f64) -> Result<Decision, StrategyError> {
    ensure_unit_interval("conf_thr", conf_thr)?;
    let conflict = models_in_conflict(prob_up, prob_down)?;

    let decision = if conflict {
        Decision {
            conflict,
            conf_up: 0.0,
            conf_down: 0.0,
            pred_up: false,
            pred_down: false,
            prob_up_merged: 0.5,
            trusted: false,
        }
    } else if prob_up >= prob_down {
        let conf_up = (prob_up - 0.5) * 2.0;
        let pred_up = conf_up > conf_thr;
        Decision {
            conflict,
            conf_up,
            conf_down: 0.0,
            pred_up,
            pred_down: false,
            prob_up_merged: prob_up,
            trusted: pred_up,
        }
    } else {
        let conf_down = (prob_down - 0.5) * 2.0;
        let pred_down = conf_down > conf_thr;
        Decision {
            conflict,
            conf_up: 0.0,
            conf_down,
            pred_up: false,
            pred_down,
            prob_up_merged: 1.0 - prob_down,
            trusted: pred_down,
        }
    };

    check_decision(&decision)?;
    Ok(decision)
}

/// Reject a decision whose fields contradict each other.
pub fn check_decision(decision: &Decision) -> Result<(), StrategyError> {
    if decision.pred_up && decision.pred_down {
        return Err(StrategyError::InvariantViolation(
            "pred_up and pred_down are both true".to_string(),
        ));
    }
    if decision.pred_up && decision.conf_down > 0.0 {
        return Err(StrategyError::InvariantViolation(
            "pred_up with the down model dominant".to_string(),
        ));
    }
    if decision.pred_down && decision.conf_up > 0.0 {
        return Err(StrategyError::InvariantViolation(
            "pred_down with the up model dominant".to_string(),
        ));
    }
    if decision.trusted && (decision.conflict || !(decision.pred_up || decision.pred_down)) {
        return Err(StrategyError::InvariantViolation(
            "trusted decision must be unconflicted with one prediction".to_string(),
        ));
    }
    ensure_unit_interval("prob_up_merged", decision.prob_up_merged)
}
