//! Error types for the wallet session

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Wallet provider is not installed")]
    NotInstalled,

    #[error("No account connected")]
    NotConnected,

    #[error("Request rejected by user: {0}")]
    Rejected(String),

    #[error("Unrecognized chain id {0}")]
    UnsupportedChain(u64),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Transfer failed: {0}")]
    Transfer(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the wallet user declined the request
    pub fn is_rejection(&self) -> bool {
        matches!(self, Error::Rejected(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
