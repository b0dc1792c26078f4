use std::result::Result as StdResult;

use thiserror::Error;

/// Error type shared by the wallet, budget, rate and storage layers.
#[derive(Debug, Error)]
pub enum PortfelError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Exchange rate for `{0}` not found")]
    RateNotFound(String),
    #[error("Wallet entry not found: {0}")]
    EntryNotFound(String),
    #[error("Document `{id}` not found in `{collection}`")]
    DocumentNotFound { collection: String, id: String },
    #[error("No historical data available for {0}")]
    NoHistoricalData(String),
    #[error("Remote service unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = StdResult<T, PortfelError>;

impl PortfelError {
    /// True for failures caused by user input that can simply be resubmitted.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            PortfelError::Validation(_)
                | PortfelError::InvalidDate(_)
                | PortfelError::RateNotFound(_)
                | PortfelError::EntryNotFound(_)
        )
    }
}

impl From<std::io::Error> for PortfelError {
    fn from(err: std::io::Error) -> Self {
        PortfelError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PortfelError {
    fn from(err: serde_json::Error) -> Self {
        PortfelError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for PortfelError {
    fn from(err: reqwest::Error) -> Self {
        PortfelError::RemoteUnavailable(err.to_string())
    }
}
