//! Shared Ethereum value types and display helpers.

use alloy_primitives::U256;
use alloy_primitives::utils::{format_ether, parse_ether};
use thiserror::Error;

pub use alloy_primitives::{Address, TxHash};

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("invalid decimal amount: {0}")]
    Invalid(String),
}

/// Parse a decimal ether-denominated string into wei (18-decimal base
/// units). Rejects zero and anything that does not parse as a positive
/// decimal number.
pub fn parse_eth_amount(input: &str) -> Result<U256, AmountError> {
    let wei = parse_ether(input.trim()).map_err(|e| AmountError::Invalid(e.to_string()))?;
    if wei.is_zero() {
        return Err(AmountError::NotPositive);
    }
    Ok(wei)
}

/// Format a base-unit token amount for display.
///
/// Trailing zeros of the fractional part are trimmed, keeping at least
/// one fractional digit, so `100 * 10^18` renders as `"100.0"`.
pub fn format_token(amount: U256) -> String {
    let full = format_ether(amount);
    match full.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                format!("{int}.0")
            } else {
                format!("{int}.{frac}")
            }
        }
        None => format!("{full}.0"),
    }
}

/// Truncate an address-like string to `head` leading and `tail`
/// trailing characters, ellipsis-joined. Strings that are already short
/// enough come back unchanged.
pub fn short_address(addr: &str, head: usize, tail: usize) -> String {
    if addr.len() > head + tail {
        format!("{}...{}", &addr[..head], &addr[addr.len() - tail..])
    } else {
        addr.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_address_truncates() {
        assert_eq!(short_address("0xABCDEF1234567890", 6, 4), "0xABCD...7890");
    }

    #[test]
    fn short_address_leaves_short_strings_alone() {
        assert_eq!(short_address("0xABCD", 6, 4), "0xABCD");
    }

    #[test]
    fn format_token_trims_trailing_zeros() {
        let hundred = U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_token(hundred), "100.0");
    }

    #[test]
    fn format_token_keeps_significant_fraction() {
        // 1.234 ETH in wei
        let wei = U256::from(1_234u64) * U256::from(10u64).pow(U256::from(15u64));
        assert_eq!(format_token(wei), "1.234");
    }

    #[test]
    fn format_token_zero() {
        assert_eq!(format_token(U256::ZERO), "0.0");
    }

    #[test]
    fn parse_eth_amount_accepts_positive_decimals() {
        let wei = parse_eth_amount("1.5").unwrap();
        assert_eq!(wei, U256::from(15u64) * U256::from(10u64).pow(U256::from(17u64)));
    }

    #[test]
    fn parse_eth_amount_rejects_zero() {
        assert!(matches!(parse_eth_amount("0"), Err(AmountError::NotPositive)));
    }

    #[test]
    fn parse_eth_amount_rejects_garbage_and_negatives() {
        assert!(matches!(parse_eth_amount("abc"), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_eth_amount("-1"), Err(AmountError::Invalid(_))));
    }
}
