//! User-visible notices
//!
//! The blocking alerts of the front-end. Everything else goes to the log.

use alloy::primitives::TxHash;
use std::fmt;

/// A message that must reach the user, not just the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Connect was attempted with no wallet installed
    WalletNotInstalled,
    /// Self-transfer was mined
    TransferConfirmed { hash: TxHash },
    /// Self-transfer was rejected, reverted or timed out
    TransferFailed { reason: String },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::WalletNotInstalled => write!(
                f,
                "Wallet is not installed. Please install it to use this feature."
            ),
            Notice::TransferConfirmed { hash } => write!(f, "Transaction successful: {}", hash),
            Notice::TransferFailed { reason } => write!(f, "Transaction failed: {}", reason),
        }
    }
}

/// Sink for user-visible notices
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that only logs; used when there is no interactive user
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::TransferConfirmed { .. } => tracing::info!(%notice, "Notice"),
            _ => tracing::warn!(%notice, "Notice"),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        assert!(Notice::WalletNotInstalled.to_string().contains("not installed"));

        let hash = TxHash::repeat_byte(0xab);
        let confirmed = Notice::TransferConfirmed { hash }.to_string();
        assert!(confirmed.starts_with("Transaction successful: 0xabab"));

        let failed = Notice::TransferFailed {
            reason: "reverted".to_string(),
        };
        assert_eq!(failed.to_string(), "Transaction failed: reverted");
    }
}
