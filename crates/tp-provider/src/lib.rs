//! Wallet-provider boundary.
//!
//! Models an injected EIP-1193 browser wallet as an object with a single
//! async JSON-RPC `request` entry point plus a notification stream.
//! Provider notifications are delivered as explicit [`ProviderEvent`]
//! values over a channel rather than implicit reactive bindings; the
//! consumer pumps the receiver on its own event loop.

use async_trait::async_trait;
use futures::channel::mpsc;
use serde_json::Value;
use thiserror::Error;

#[cfg(feature = "mock")]
pub mod mock;

/// EIP-1193 error code for a user-rejected request.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no injected wallet provider is available")]
    Unavailable,
    #[error("request rejected by the user")]
    Rejected,
    #[error("provider call failed: {0}")]
    Call(String),
    #[error("malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Notifications pushed by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The ordered account list changed; an empty list means the site
    /// lost access to all accounts.
    AccountsChanged(Vec<String>),
    ChainChanged(u64),
    Disconnect,
}

pub type EventSender = mpsc::UnboundedSender<ProviderEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<ProviderEvent>;

/// An injected wallet provider (EIP-1193 shaped).
///
/// `?Send` because the only real implementation lives on the
/// single-threaded browser event loop and holds JS handles.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Issue `request({ method, params })` and return the parsed JSON
    /// result.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Subscribe to provider notifications. The receiver yields events
    /// until the provider (or the page) goes away.
    fn subscribe(&self) -> EventReceiver;
}

/// Parse a JSON-RPC quantity (`"0xaa36a7"`) into a u64.
pub fn parse_quantity(hex: &str) -> Result<u64, ProviderError> {
    let digits = hex
        .strip_prefix("0x")
        .or_else(|| hex.strip_prefix("0X"))
        .ok_or_else(|| ProviderError::InvalidResponse(format!("not a hex quantity: {hex}")))?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| ProviderError::InvalidResponse(format!("bad hex quantity {hex}: {e}")))
}

/// Render a u64 as a JSON-RPC quantity string.
pub fn quantity(value: u64) -> String {
    format!("{value:#x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_round_trip() {
        assert_eq!(quantity(11155111), "0xaa36a7");
        assert_eq!(parse_quantity("0xaa36a7").unwrap(), 11155111);
    }

    #[test]
    fn parse_quantity_requires_prefix() {
        assert!(matches!(
            parse_quantity("aa36a7"),
            Err(ProviderError::InvalidResponse(_))
        ));
        assert!(matches!(
            parse_quantity("0xzz"),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
