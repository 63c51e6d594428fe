use thiserror::Error;

/// Failures reported by an external collaborator (chain, feed, feature source).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Market data unavailable: {0}")]
    Unavailable(String),

    #[error("Feature source error: {0}")]
    Features(String),

    #[error("Invalid market parameter: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Market error: {0}")]
    Market(#[from] MarketError),

    #[error("Strategy error: {0}")]
    Strategy(#[from] stakecast_strategy::StrategyError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] stakecast_ledger::LedgerError),

    #[error("Configuration error: {0}")]
    Config(#[from] stakecast_models::ConfigError),
}
