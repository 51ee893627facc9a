//! Local wallet key management
//!
//! This module handles private key storage for the injected RPC wallet.
//! The private key NEVER leaves this module.

mod signer;

pub use signer::SecureWallet;
