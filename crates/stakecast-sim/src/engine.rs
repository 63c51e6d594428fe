use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use stakecast_models::history::EpochObservation;
use stakecast_strategy::{
    calc_payout, ConfidenceMerger, PerformanceSnapshot, PerformanceTracker, ProfitSeries,
    StakeAllocator, StrategyError,
};
use tracing::info;
use uuid::Uuid;

use crate::config::SimConfig;
use crate::error::SimError;

/// Result of replaying a history.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SimSummary {
    pub run_id: Uuid,
    pub epochs: usize,
    pub trusted: usize,
    pub conflicts: usize,
    pub up: PerformanceSnapshot,
    pub down: PerformanceSnapshot,
    pub merged: PerformanceSnapshot,
    pub total_profit: f64,
    pub cumulative_profit: Vec<f64>,
}

/// Replays recorded model outputs through the live merge and allocation
/// logic and settles each epoch against the configured market.
pub struct SimEngine {
    run_id: Uuid,
    config: SimConfig,
    merger: ConfidenceMerger,
    allocator: StakeAllocator,
}

impl SimEngine {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let merger = ConfidenceMerger::new(config.staking.confidence_threshold)?;
        let allocator = StakeAllocator::new(config.staking.stake_budget, config.staking.approach)?;
        Ok(Self {
            run_id: Uuid::new_v4(),
            config,
            merger,
            allocator,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run(&self, observations: &[EpochObservation]) -> Result<SimSummary, SimError> {
        let settings = &self.config.sim;
        let limit = match settings.max_epochs {
            0 => observations.len(),
            n => n.min(observations.len()),
        };
        info!(
            run_id = %self.run_id,
            epochs = limit,
            approach = %self.config.staking.approach,
            "Starting simulation"
        );

        let mut up = PerformanceTracker::new();
        let mut down = PerformanceTracker::new();
        let mut merged = PerformanceTracker::new();
        let mut profits = ProfitSeries::new();
        let mut trusted = 0;
        let mut conflicts = 0;

        for (i, obs) in observations[..limit].iter().enumerate() {
            let decision = self.merger.merge(&obs.signal())?;
            let stakes = self.allocator.allocate(Some(&decision))?;
            let outcome = obs.outcome();

            let profit = calc_payout(
                settings.others_stake,
                settings.others_accuracy,
                to_f64(stakes.stake_up)?,
                to_f64(stakes.stake_down)?,
                settings.revenue,
                outcome.true_up_close,
            )?;

            up.update(outcome.true_up_close, obs.prob_up)?;
            down.update(!outcome.true_up_close, obs.prob_down)?;
            merged.update(outcome.true_up_close, decision.prob_up_merged)?;
            profits.push(profit);
            trusted += usize::from(decision.trusted);
            conflicts += usize::from(decision.conflict);

            let n = i + 1;
            if settings.log_every > 0 && n % settings.log_every == 0 {
                let recent = profits
                    .rolling_sum(settings.log_every)
                    .last()
                    .copied()
                    .unwrap_or_default();
                info!(
                    run_id = %self.run_id,
                    iter = n,
                    epoch = obs.epoch,
                    profit,
                    recent_profit = recent,
                    total_profit = profits.total(),
                    accuracy = merged.accuracy().map(|a| a.estimate).unwrap_or_default(),
                    "Simulation progress"
                );
            }
        }

        let summary = SimSummary {
            run_id: self.run_id,
            epochs: profits.len(),
            trusted,
            conflicts,
            up: up.snapshot(),
            down: down.snapshot(),
            merged: merged.snapshot(),
            total_profit: profits.total(),
            cumulative_profit: profits.cumulative(),
        };
        info!(
            run_id = %self.run_id,
            epochs = summary.epochs,
            total_profit = summary.total_profit,
            "Simulation complete"
        );
        Ok(summary)
    }
}

fn to_f64(amount: Decimal) -> Result<f64, StrategyError> {
    amount.to_f64().ok_or_else(|| {
        StrategyError::InvariantViolation(format!("stake {amount} has no f64 representation"))
    })
}
