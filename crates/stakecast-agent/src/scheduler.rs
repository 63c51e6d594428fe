use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stakecast_models::config::SchedulerConfig;
use tracing::{debug, warn};

use crate::error::{AgentError, MarketError};
use crate::market::MarketInterface;

/// Where a new block falls relative to its epoch's decision window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpochTick {
    pub block_number: u64,
    pub timestamp: u64,
    pub epoch: u64,
    /// Slot the prediction is for: the start of the epoch after next.
    pub target_slot: u64,
    /// Seconds until the current epoch ends. Always in `1..=seconds_per_epoch`.
    pub seconds_left: u64,
    pub should_predict: bool,
    pub should_abandon: bool,
}

impl EpochTick {
    /// Place `timestamp` inside its epoch.
    pub fn at(
        block_number: u64,
        timestamp: u64,
        seconds_per_epoch: u64,
        config: &SchedulerConfig,
    ) -> Result<Self, MarketError> {
        if seconds_per_epoch == 0 {
            return Err(MarketError::Invalid(
                "seconds_per_epoch is zero".to_string(),
            ));
        }
        let epoch = timestamp / seconds_per_epoch;
        let seconds_left = (epoch + 1) * seconds_per_epoch - timestamp;
        Ok(Self {
            block_number,
            timestamp,
            epoch,
            target_slot: (epoch + 2) * seconds_per_epoch,
            seconds_left,
            should_predict: seconds_left <= config.predict_threshold_s,
            should_abandon: seconds_left < config.cutoff_s,
        })
    }

    /// Inside the window and not past the cutoff.
    pub fn in_window(&self) -> bool {
        self.should_predict && !self.should_abandon
    }
}

/// Turns chain heads into epoch ticks, one per new block.
pub struct EpochScheduler {
    market: Arc<dyn MarketInterface>,
    config: SchedulerConfig,
    seconds_per_epoch: Option<u64>,
    prev_block_number: Option<u64>,
    prev_block_timestamp: Option<u64>,
}

impl EpochScheduler {
    pub fn new(market: Arc<dyn MarketInterface>, config: SchedulerConfig) -> Self {
        Self {
            market,
            config,
            seconds_per_epoch: None,
            prev_block_number: None,
            prev_block_timestamp: None,
        }
    }

    pub fn prev_block_number(&self) -> Option<u64> {
        self.prev_block_number
    }

    pub fn prev_block_timestamp(&self) -> Option<u64> {
        self.prev_block_timestamp
    }

    /// Epoch length, fetched from the market once and then cached.
    pub async fn seconds_per_epoch(&mut self) -> Result<u64, AgentError> {
        if let Some(len) = self.seconds_per_epoch {
            return Ok(len);
        }
        let len = self.market.seconds_per_epoch().await?;
        if len == 0 {
            return Err(MarketError::Invalid("seconds_per_epoch is zero".to_string()).into());
        }
        self.seconds_per_epoch = Some(len);
        Ok(len)
    }

    /// Read the chain head. `None` when no block newer than the last one seen
    /// is available; the caller should sleep before polling again.
    pub async fn tick(&mut self) -> Result<Option<EpochTick>, AgentError> {
        let number = self.market.block_number().await?;
        if self.prev_block_number.is_some_and(|prev| number <= prev) {
            debug!(block = number, "No new block");
            return Ok(None);
        }

        let Some(block) = self.market.get_block(number).await? else {
            debug!(block = number, "Block not yet available");
            return Ok(None);
        };

        let len = self.seconds_per_epoch().await?;
        let tick = EpochTick::at(block.number, block.timestamp, len, &self.config)?;

        let reported = self.market.current_epoch().await?;
        if reported != tick.epoch {
            warn!(
                computed = tick.epoch,
                reported,
                timestamp = block.timestamp,
                "Market reports a different epoch than the block timestamp implies"
            );
        }

        self.prev_block_number = Some(block.number);
        self.prev_block_timestamp = Some(block.timestamp);
        Ok(Some(tick))
    }
}
