use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stakecast_models::direction::Direction;

use crate::error::MarketError;

/// Chain head as seen by the agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    /// Unix seconds.
    pub timestamp: u64,
}

/// Tokens an identity must hold to take part in an epoch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Token {
    /// The token stakes are denominated in.
    Staking,
    /// The chain's native token, spent on gas.
    Native,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Staking => write!(f, "staking"),
            Token::Native => write!(f, "native"),
        }
    }
}

/// Receipt of a submitted prediction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TxResult {
    /// 1 on success, anything else is a reverted transaction.
    pub status: u8,
    pub tx_hash: Option<String>,
}

impl TxResult {
    pub fn succeeded(&self) -> bool {
        self.status == 1
    }
}

/// One identity's handle on the prediction market. Mockable for testing.
///
/// The agent holds two handles, one per leg, so the up and down stakes are
/// signed by different keys.
#[async_trait]
pub trait MarketInterface: Send + Sync {
    /// Label used in logs (an address, or a name in tests).
    fn identity(&self) -> &str;

    async fn block_number(&self) -> Result<u64, MarketError>;

    /// `None` when the node does not have the block yet.
    async fn get_block(&self, number: u64) -> Result<Option<BlockInfo>, MarketError>;

    async fn current_epoch(&self) -> Result<u64, MarketError>;

    async fn seconds_per_epoch(&self) -> Result<u64, MarketError>;

    async fn balance_of(&self, token: Token) -> Result<Decimal, MarketError>;

    async fn submit_prediction(
        &self,
        direction: Direction,
        stake: Decimal,
        target_slot: u64,
    ) -> Result<TxResult, MarketError>;
}
