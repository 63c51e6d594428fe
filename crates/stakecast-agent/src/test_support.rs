//! Scripted collaborators for driving the scheduler and coordinator without a
//! chain.
//!
//! `MockMarket` replays a queue of blocks: each `block_number` call advances to
//! the next queued block, or repeats the current head once the queue is empty.
//! Failures are queued the same way and consumed one call at a time.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use rust_decimal::Decimal;
use stakecast_models::direction::Direction;
use tokio::sync::Mutex;

use crate::classifier::{Classifier, FeatureSource};
use crate::error::MarketError;
use crate::market::{BlockInfo, MarketInterface, Token, TxResult};

/// A prediction the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedPrediction {
    pub direction: Direction,
    pub stake: Decimal,
    pub target_slot: u64,
    pub accepted: bool,
}

/// How the next submission should end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitScript {
    /// Mined with status 0.
    Revert,
    /// The call itself fails (no receipt).
    Error,
}

#[derive(Debug, Default)]
struct MockMarketState {
    queued_blocks: VecDeque<BlockInfo>,
    head: Option<BlockInfo>,
    hidden_blocks: HashSet<u64>,
    reported_epoch: Option<u64>,
    block_read_failures: usize,
    balance_read_failures: usize,
    staking_balance: Decimal,
    native_balance: Decimal,
    submit_script: VecDeque<SubmitScript>,
    submissions: Vec<SubmittedPrediction>,
}

pub struct MockMarket {
    name: String,
    seconds_per_epoch: u64,
    state: Mutex<MockMarketState>,
}

impl MockMarket {
    /// A funded identity with no blocks yet.
    pub fn new(name: &str, seconds_per_epoch: u64) -> Self {
        Self {
            name: name.to_string(),
            seconds_per_epoch,
            state: Mutex::new(MockMarketState {
                staking_balance: Decimal::new(1000, 0),
                native_balance: Decimal::new(10, 0),
                ..Default::default()
            }),
        }
    }

    pub async fn push_block(&self, number: u64, timestamp: u64) {
        self.state
            .lock()
            .await
            .queued_blocks
            .push_back(BlockInfo { number, timestamp });
    }

    /// `get_block` returns `None` for this number.
    pub async fn hide_block(&self, number: u64) {
        self.state.lock().await.hidden_blocks.insert(number);
    }

    /// Override what `current_epoch` reports.
    pub async fn report_epoch(&self, epoch: u64) {
        self.state.lock().await.reported_epoch = Some(epoch);
    }

    pub async fn fail_block_reads(&self, count: usize) {
        self.state.lock().await.block_read_failures += count;
    }

    pub async fn fail_balance_reads(&self, count: usize) {
        self.state.lock().await.balance_read_failures += count;
    }

    pub async fn set_balance(&self, token: Token, amount: Decimal) {
        let mut state = self.state.lock().await;
        match token {
            Token::Staking => state.staking_balance = amount,
            Token::Native => state.native_balance = amount,
        }
    }

    /// Queue outcomes for upcoming submissions. Unscripted submissions succeed.
    pub async fn script_submissions(&self, script: &[SubmitScript]) {
        self.state
            .lock()
            .await
            .submit_script
            .extend(script.iter().copied());
    }

    pub async fn submissions(&self) -> Vec<SubmittedPrediction> {
        self.state.lock().await.submissions.clone()
    }
}

#[async_trait]
impl MarketInterface for MockMarket {
    fn identity(&self) -> &str {
        &self.name
    }

    async fn block_number(&self) -> Result<u64, MarketError> {
        let mut state = self.state.lock().await;
        if state.block_read_failures > 0 {
            state.block_read_failures -= 1;
            return Err(MarketError::Rpc("mock block read failure".to_string()));
        }
        if let Some(next) = state.queued_blocks.pop_front() {
            state.head = Some(next);
        }
        state
            .head
            .map(|b| b.number)
            .ok_or_else(|| MarketError::Unavailable("no blocks yet".to_string()))
    }

    async fn get_block(&self, number: u64) -> Result<Option<BlockInfo>, MarketError> {
        let state = self.state.lock().await;
        if state.hidden_blocks.contains(&number) {
            return Ok(None);
        }
        Ok(state.head.filter(|b| b.number == number))
    }

    async fn current_epoch(&self) -> Result<u64, MarketError> {
        let state = self.state.lock().await;
        if let Some(epoch) = state.reported_epoch {
            return Ok(epoch);
        }
        let head = state
            .head
            .ok_or_else(|| MarketError::Unavailable("no blocks yet".to_string()))?;
        Ok(head.timestamp / self.seconds_per_epoch.max(1))
    }

    async fn seconds_per_epoch(&self) -> Result<u64, MarketError> {
        Ok(self.seconds_per_epoch)
    }

    async fn balance_of(&self, token: Token) -> Result<Decimal, MarketError> {
        let mut state = self.state.lock().await;
        if state.balance_read_failures > 0 {
            state.balance_read_failures -= 1;
            return Err(MarketError::Rpc("mock balance read failure".to_string()));
        }
        Ok(match token {
            Token::Staking => state.staking_balance,
            Token::Native => state.native_balance,
        })
    }

    async fn submit_prediction(
        &self,
        direction: Direction,
        stake: Decimal,
        target_slot: u64,
    ) -> Result<TxResult, MarketError> {
        let mut state = self.state.lock().await;
        let script = state.submit_script.pop_front();
        let n = state.submissions.len();
        state.submissions.push(SubmittedPrediction {
            direction,
            stake,
            target_slot,
            accepted: script.is_none(),
        });
        match script {
            None => Ok(TxResult {
                status: 1,
                tx_hash: Some(format!("0x{}{n:04x}", self.name)),
            }),
            Some(SubmitScript::Revert) => Ok(TxResult {
                status: 0,
                tx_hash: Some(format!("0x{}{n:04x}", self.name)),
            }),
            Some(SubmitScript::Error) => {
                Err(MarketError::Rpc("mock transaction not mined".to_string()))
            }
        }
    }
}

/// Returns the same probability for any input.
pub struct FixedClassifier(pub f64);

impl Classifier for FixedClassifier {
    fn predict_probability(&self, _features: &[f64]) -> f64 {
        self.0
    }
}

/// Returns the same feature vector for every slot.
pub struct StaticFeatures(pub Vec<f64>);

#[async_trait]
impl FeatureSource for StaticFeatures {
    async fn features(&self, _target_slot: u64) -> Result<Vec<f64>, MarketError> {
        Ok(self.0.clone())
    }
}
