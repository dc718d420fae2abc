//! Typed client for the TPTP token contract.
//!
//! The contract lives at a fixed address on the Sepolia test network and
//! exposes two entry points: a balance query and a payable `buy`. The
//! exchange rate (1 ETH = 100 TPTP) is enforced entirely by the remote
//! contract; no local rate computation happens here.

use std::rc::Rc;

use alloy_primitives::{Address, U256, address, hex};
use alloy_sol_types::{SolCall, sol};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::warn;
use tp_eth_types::{AmountError, TxHash, parse_eth_amount};
use tp_provider::{ProviderError, WalletProvider};

/// Fixed deployment on Sepolia.
pub const TPTP_ADDRESS: Address = address!("1B6C07Cb03E1B618e2E85C9AFf77035eF4e69159");

/// Sepolia chain id.
pub const TARGET_CHAIN_ID: u64 = 11155111;

sol! {
    interface ITptpToken {
        function balanceOf(address owner) external view returns (uint256);
        function buy() external payable;
    }
}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error(transparent)]
    Amount(#[from] AmountError),
    #[error("contract call reverted: {0}")]
    Reverted(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("could not decode contract response: {0}")]
    Decode(String),
}

/// Handle over the fixed token contract. Cheap to construct, stateless
/// between calls.
pub struct TokenContract<P> {
    address: Address,
    provider: Rc<P>,
}

impl<P: WalletProvider> TokenContract<P> {
    pub fn new(provider: Rc<P>) -> Self {
        Self {
            address: TPTP_ADDRESS,
            provider,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Query the raw base-unit token balance of `owner` via `eth_call`.
    pub async fn balance_of(&self, owner: Address) -> Result<U256, ContractError> {
        let calldata = ITptpToken::balanceOfCall { owner }.abi_encode();
        let params = json!([
            {
                "to": self.address.to_string(),
                "data": hex::encode_prefixed(&calldata),
            },
            "latest",
        ]);

        let result = match self.provider.request("eth_call", params).await {
            Ok(value) => value,
            Err(ProviderError::Call(reason)) => {
                warn!(%reason, owner = %owner, "balanceOf call reverted");
                return Err(ContractError::Reverted(reason));
            }
            Err(err) => return Err(err.into()),
        };

        let raw = result
            .as_str()
            .ok_or_else(|| ContractError::Decode(format!("non-string eth_call result: {result}")))?;
        let bytes = hex::decode(raw).map_err(|e| ContractError::Decode(e.to_string()))?;
        ITptpToken::balanceOfCall::abi_decode_returns(&bytes)
            .map_err(|e| ContractError::Decode(e.to_string()))
    }

    /// Submit a purchase, attaching `eth_amount` (a decimal ether
    /// string) as the transaction value. Rejects non-positive amounts
    /// before any network interaction. Fire-and-forget: returns the tx
    /// hash without waiting for confirmation.
    pub async fn buy(&self, from: Address, eth_amount: &str) -> Result<TxHash, ContractError> {
        let wei = parse_eth_amount(eth_amount)?;
        let calldata = ITptpToken::buyCall {}.abi_encode();
        let params = json!([{
            "from": from.to_string(),
            "to": self.address.to_string(),
            "value": format!("{wei:#x}"),
            "data": hex::encode_prefixed(&calldata),
        }]);

        let result = self.provider.request("eth_sendTransaction", params).await?;
        let hash = result.as_str().ok_or_else(|| {
            ContractError::Decode(format!("non-string transaction hash: {result}"))
        })?;
        hash.parse::<TxHash>()
            .map_err(|e| ContractError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use tp_provider::mock::MockProvider;

    fn owner() -> Address {
        address!("00000000000000000000000000000000000000A1")
    }

    #[test]
    fn balance_of_encodes_selector_and_decodes_uint256() {
        let provider = Rc::new(MockProvider::new());
        // 100 tokens in base units, ABI-encoded as a single uint256.
        provider.push_ok(json!(format!(
            "0x{:064x}",
            U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64))
        )));

        let contract = TokenContract::new(provider.clone());
        let balance = block_on(contract.balance_of(owner())).unwrap();
        assert_eq!(balance, U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64)));

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "eth_call");
        let data = requests[0].1[0]["data"].as_str().unwrap();
        // balanceOf(address) selector
        assert!(data.starts_with("0x70a08231"));
        assert_eq!(requests[0].1[0]["to"].as_str().unwrap(), TPTP_ADDRESS.to_string());
    }

    #[test]
    fn balance_of_surfaces_reverts() {
        let provider = Rc::new(MockProvider::new());
        provider.push_err(ProviderError::Call("execution reverted".into()));

        let contract = TokenContract::new(provider);
        let err = block_on(contract.balance_of(owner())).unwrap_err();
        assert!(matches!(err, ContractError::Reverted(_)));
    }

    #[test]
    fn buy_rejects_non_positive_amounts_before_any_request() {
        let provider = Rc::new(MockProvider::new());
        let contract = TokenContract::new(provider.clone());

        for bad in ["0", "-1", "abc", ""] {
            let err = block_on(contract.buy(owner(), bad)).unwrap_err();
            assert!(matches!(err, ContractError::Amount(_)), "amount {bad:?}");
        }
        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn buy_attaches_value_and_returns_tx_hash() {
        let provider = Rc::new(MockProvider::new());
        provider.push_ok(json!(
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        ));

        let contract = TokenContract::new(provider.clone());
        let hash = block_on(contract.buy(owner(), "1.5")).unwrap();
        assert_eq!(hash[31], 0xab);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "eth_sendTransaction");
        let tx = &requests[0].1[0];
        // 1.5 ETH in wei
        assert_eq!(tx["value"].as_str().unwrap(), "0x14d1120d7b160000");
        assert_eq!(tx["from"].as_str().unwrap(), owner().to_string());
    }
}
