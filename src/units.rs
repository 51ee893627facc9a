//! Ether amount formatting and parsing

use crate::{Error, Result};
use alloy::primitives::utils;
use alloy::primitives::U256;

/// Decimals of the native token
pub const ETHER_DECIMALS: u8 = 18;

/// Format a wei amount in ether, always keeping one fractional digit
///
/// `1.5 ETH` renders as `"1.5"`, `2 ETH` as `"2.0"`, zero as `"0.0"`.
pub fn format_ether(value: U256) -> String {
    format_units(value, ETHER_DECIMALS as u32)
}

/// Format a U256 value with decimals
pub fn format_units(value: U256, decimals: u32) -> String {
    let divisor = U256::from(10).pow(U256::from(decimals));
    let whole = value / divisor;
    let remainder = value % divisor;

    if remainder.is_zero() {
        return format!("{}.0", whole);
    }

    let remainder_str = format!("{:0>width$}", remainder, width = decimals as usize);
    format!("{}.{}", whole, remainder_str.trim_end_matches('0'))
}

/// Parse a decimal ether string (e.g. `"0.01"`) into wei
pub fn parse_ether(value: &str) -> Result<U256> {
    utils::parse_ether(value.trim())
        .map_err(|e| Error::InvalidArgument(format!("Invalid ether amount '{}': {}", value, e)))
}
