use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use stakecast_ledger::SubmissionLedger;
use stakecast_models::config::{SchedulerConfig, StakingConfig};
use stakecast_models::decision::StakeSplit;
use stakecast_models::direction::{Direction, PerDirection};
use stakecast_models::submission::{EpochState, LegAttempt, LegOutcome, SubmissionRecord};
use stakecast_strategy::{ConfidenceMerger, StakeAllocator};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::classifier::DirectionalModels;
use crate::error::AgentError;
use crate::market::{MarketInterface, Token};
use crate::scheduler::{EpochScheduler, EpochTick};

/// What a single tick did.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    NoNewBlock,
    /// A market or feature read failed; retried on the next block.
    MarketUnavailable { reason: String },
    /// Too early in the epoch to act.
    Waiting { epoch: u64, seconds_left: u64 },
    /// Too late in the epoch to act.
    PastCutoff { epoch: u64, seconds_left: u64 },
    AlreadySubmitted { epoch: u64 },
    InsufficientBalance {
        epoch: u64,
        identity: String,
        token: Token,
        balance: Decimal,
        required: Decimal,
    },
    /// Both stakes came out zero; nothing sent and nothing recorded.
    Abstained { epoch: u64 },
    Submitted(SubmissionRecord),
}

/// Drives one epoch at a time through timing, balance and stake checks and the
/// two-leg submission.
///
/// The up leg is signed by `markets.up` and the down leg by `markets.down`.
/// The up identity's handle also serves as the clock.
pub struct SubmissionCoordinator {
    scheduler: EpochScheduler,
    markets: PerDirection<Arc<dyn MarketInterface>>,
    models: DirectionalModels,
    merger: ConfidenceMerger,
    allocator: StakeAllocator,
    staking: StakingConfig,
    scheduler_config: SchedulerConfig,
    ledger: Box<dyn SubmissionLedger>,
}

impl SubmissionCoordinator {
    pub fn new(
        markets: PerDirection<Arc<dyn MarketInterface>>,
        models: DirectionalModels,
        ledger: Box<dyn SubmissionLedger>,
        staking: StakingConfig,
        scheduler_config: SchedulerConfig,
    ) -> Result<Self, AgentError> {
        staking.validate()?;
        scheduler_config.validate()?;
        let merger = ConfidenceMerger::new(staking.confidence_threshold)?;
        let allocator = StakeAllocator::new(staking.stake_budget, staking.approach)?;
        let scheduler = EpochScheduler::new(Arc::clone(&markets.up), scheduler_config.clone());
        Ok(Self {
            scheduler,
            markets,
            models,
            merger,
            allocator,
            staking,
            scheduler_config,
            ledger,
        })
    }

    pub fn ledger(&self) -> &dyn SubmissionLedger {
        self.ledger.as_ref()
    }

    /// Poll until cancelled or until `max_ticks` ticks have run. Returns the
    /// number of ticks.
    ///
    /// Market read failures are logged and retried. Ledger and invariant
    /// errors end the loop.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<u64, AgentError> {
        let poll = Duration::from_millis(self.scheduler_config.poll_interval_ms);
        let max_ticks = self.scheduler_config.max_ticks;
        info!(
            up = self.markets.up.identity(),
            down = self.markets.down.identity(),
            approach = %self.staking.approach,
            budget = %self.staking.stake_budget,
            "Submission coordinator starting"
        );

        let mut ticks = 0u64;
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = self.tick().await?;
            ticks += 1;
            if max_ticks > 0 && ticks >= max_ticks {
                break;
            }

            let pause = match outcome {
                TickOutcome::NoNewBlock | TickOutcome::MarketUnavailable { .. } => poll,
                _ => Duration::ZERO,
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!(ticks, "Submission coordinator stopped");
        Ok(ticks)
    }

    /// Process the current chain head once.
    pub async fn tick(&mut self) -> Result<TickOutcome, AgentError> {
        let tick = match self.scheduler.tick().await {
            Ok(Some(tick)) => tick,
            Ok(None) => return Ok(TickOutcome::NoNewBlock),
            Err(AgentError::Market(e)) => {
                error!(error = %e, "Failed to read chain head");
                return Ok(TickOutcome::MarketUnavailable {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        info!(
            block = tick.block_number,
            epoch = tick.epoch,
            seconds_left = tick.seconds_left,
            "Epoch status"
        );

        if !tick.should_predict {
            return Ok(TickOutcome::Waiting {
                epoch: tick.epoch,
                seconds_left: tick.seconds_left,
            });
        }
        if self.ledger.contains(tick.epoch)? {
            return Ok(TickOutcome::AlreadySubmitted { epoch: tick.epoch });
        }
        if tick.should_abandon {
            warn!(
                epoch = tick.epoch,
                seconds_left = tick.seconds_left,
                "Past cutoff, skipping epoch"
            );
            return Ok(TickOutcome::PastCutoff {
                epoch: tick.epoch,
                seconds_left: tick.seconds_left,
            });
        }

        self.act_on(&tick).await
    }

    async fn act_on(&mut self, tick: &EpochTick) -> Result<TickOutcome, AgentError> {
        match self.check_balances(tick.epoch).await {
            Ok(None) => {}
            Ok(Some(short)) => return Ok(short),
            Err(AgentError::Market(e)) => {
                error!(epoch = tick.epoch, error = %e, "Balance query failed");
                return Ok(TickOutcome::MarketUnavailable {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        let signal = match self.models.signal(tick.target_slot).await {
            Ok(signal) => signal,
            Err(AgentError::Market(e)) => {
                error!(epoch = tick.epoch, error = %e, "Feature read failed");
                return Ok(TickOutcome::MarketUnavailable {
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let decision = self.merger.merge(&signal)?;
        let stakes = self.allocator.allocate(Some(&decision))?;
        info!(
            epoch = tick.epoch,
            prob_up = signal.prob_up,
            prob_down = signal.prob_down,
            prob_up_merged = decision.prob_up_merged,
            conflict = decision.conflict,
            trusted = decision.trusted,
            stake_up = %stakes.stake_up,
            stake_down = %stakes.stake_down,
            "Decision"
        );

        if stakes.is_zero() {
            warn!(epoch = tick.epoch, "Both stakes are zero, not submitting");
            return Ok(TickOutcome::Abstained { epoch: tick.epoch });
        }

        self.ledger.reserve(tick.epoch, tick.target_slot)?;

        let first_attempt = self.submit_legs(tick, stakes).await;
        let resubmission = if first_attempt.all_confirmed() {
            None
        } else {
            let floor = StakeSplit::uniform(self.staking.resubmit_stake_floor);
            warn!(
                epoch = tick.epoch,
                stake = %self.staking.resubmit_stake_floor,
                "A leg failed, resubmitting both legs at the floor stake"
            );
            Some(self.submit_legs(tick, floor).await)
        };

        let record = SubmissionRecord {
            epoch: tick.epoch,
            target_slot: tick.target_slot,
            first_attempt,
            resubmission,
            state: EpochState::Submitted,
            submitted_at: Utc::now(),
        };
        self.ledger.complete(&record)?;

        info!(
            epoch = record.epoch,
            target_slot = record.target_slot,
            succeeded = record.succeeded(),
            resubmitted = record.resubmission.is_some(),
            committed = %record.committed_stake(),
            "Epoch submitted"
        );
        Ok(TickOutcome::Submitted(record))
    }

    /// `Some` describes the first shortfall found.
    async fn check_balances(&self, epoch: u64) -> Result<Option<TickOutcome>, AgentError> {
        let required = [
            (Token::Staking, self.staking.stake_budget),
            (Token::Native, self.staking.min_gas_balance),
        ];
        for direction in Direction::ALL {
            let market = self.markets.get(direction);
            for (token, need) in required {
                let balance = market.balance_of(token).await?;
                if balance < need {
                    warn!(
                        epoch,
                        identity = market.identity(),
                        %token,
                        %balance,
                        required = %need,
                        "Insufficient balance, skipping"
                    );
                    return Ok(Some(TickOutcome::InsufficientBalance {
                        epoch,
                        identity: market.identity().to_string(),
                        token,
                        balance,
                        required: need,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Send the up leg, then the down leg. A leg that errors or reverts is
    /// recorded as failed; it never aborts the other leg.
    async fn submit_legs(&self, tick: &EpochTick, stakes: StakeSplit) -> LegAttempt {
        let mut outcomes = PerDirection::new(
            LegOutcome::Failed {
                reason: "not sent".to_string(),
            },
            LegOutcome::Failed {
                reason: "not sent".to_string(),
            },
        );

        for direction in Direction::ALL {
            let market = self.markets.get(direction);
            let stake = stakes.stake(direction);
            let outcome = match market
                .submit_prediction(direction, stake, tick.target_slot)
                .await
            {
                Ok(tx) if tx.succeeded() => {
                    info!(
                        epoch = tick.epoch,
                        %direction,
                        %stake,
                        tx = tx.tx_hash.as_deref().unwrap_or("-"),
                        "Leg confirmed"
                    );
                    LegOutcome::Confirmed { tx_hash: tx.tx_hash }
                }
                Ok(tx) => {
                    warn!(
                        epoch = tick.epoch,
                        %direction,
                        status = tx.status,
                        "Leg reverted"
                    );
                    LegOutcome::Failed {
                        reason: format!("transaction status {}", tx.status),
                    }
                }
                Err(e) => {
                    warn!(epoch = tick.epoch, %direction, error = %e, "Leg failed");
                    LegOutcome::Failed {
                        reason: e.to_string(),
                    }
                }
            };
            *outcomes.get_mut(direction) = outcome;
        }

        LegAttempt { stakes, outcomes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_outcome_serializes_with_tag() {
        let json = serde_json::to_value(TickOutcome::Waiting {
            epoch: 10,
            seconds_left: 200,
        })
        .unwrap();
        assert_eq!(json["outcome"], "waiting");
        assert_eq!(json["epoch"], 10);

        let json = serde_json::to_value(TickOutcome::NoNewBlock).unwrap();
        assert_eq!(json["outcome"], "no_new_block");
    }
}
