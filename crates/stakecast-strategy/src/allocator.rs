use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use stakecast_models::decision::{Approach, Decision, StakeSplit};
use tracing::debug;

use crate::error::{ensure_unit_interval, StrategyError};
use crate::merger::check_decision;

/// Splits a fixed per-epoch budget between the up and down legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StakeAllocator {
    budget: Decimal,
    approach: Approach,
}

impl StakeAllocator {
    pub fn new(budget: Decimal, approach: Approach) -> Result<Self, StrategyError> {
        if budget.is_sign_negative() {
            return Err(StrategyError::InvariantViolation(format!(
                "stake budget {budget} is negative"
            )));
        }
        Ok(Self { budget, approach })
    }

    pub fn budget(&self) -> Decimal {
        self.budget
    }

    pub fn approach(&self) -> Approach {
        self.approach
    }

    pub fn allocate(&self, decision: Option<&Decision>) -> Result<StakeSplit, StrategyError> {
        allocate(self.budget, self.approach, decision)
    }
}

/// Split `budget` according to `approach`.
///
/// The whole budget is always committed: `stake_up + stake_down == budget`.
/// `ConfidenceWeighted` needs the decision for its merged probability of up;
/// `EqualSplit` ignores it.
pub fn allocate(
    budget: Decimal,
    approach: Approach,
    decision: Option<&Decision>,
) -> Result<StakeSplit, StrategyError> {
    if budget.is_sign_negative() {
        return Err(StrategyError::InvariantViolation(format!(
            "stake budget {budget} is negative"
        )));
    }

    let split = match approach {
        Approach::EqualSplit => {
            let half = budget * Decimal::new(5, 1);
            StakeSplit {
                stake_up: half,
                stake_down: half,
            }
        }
        Approach::ConfidenceWeighted => {
            let decision = decision.ok_or_else(|| {
                StrategyError::InvariantViolation(
                    "confidence_weighted allocation needs a decision".to_string(),
                )
            })?;
            check_decision(decision)?;
            let p = decision.prob_up_merged;
            ensure_unit_interval("prob_up_merged", p)?;
            let p = Decimal::from_f64(p).ok_or_else(|| {
                StrategyError::InvariantViolation(format!("prob_up_merged={p} is not representable"))
            })?;
            let stake_up = budget.checked_mul(p).ok_or_else(|| {
                StrategyError::InvariantViolation(format!("stake {budget} * {p} overflows"))
            })?;
            StakeSplit {
                stake_up,
                stake_down: budget - stake_up,
            }
        }
    };

    debug!(
        approach = %approach,
        budget = %budget,
        stake_up = %split.stake_up,
        stake_down = %split.stake_down,
        "Allocated stake"
    );
    Ok(split)
}
