use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("History line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Strategy error: {0}")]
    Strategy(#[from] stakecast_strategy::StrategyError),

    #[error("Configuration error: {0}")]
    Config(#[from] stakecast_models::ConfigError),
}
