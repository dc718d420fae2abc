//! Wallet connection lifecycle.
//!
//! [`WalletConnector`] is an explicitly constructed service wrapping an
//! injected wallet provider. It is the only writer of
//! [`ConnectionState`]; everything else reads it through
//! [`WalletConnector::state`].

use std::rc::Rc;
use std::str::FromStr;

use serde_json::{Value, json};
use tracing::{debug, warn};
use tp_eth_types::Address;
use tp_provider::{ProviderError, ProviderEvent, WalletProvider, parse_quantity, quantity};

/// Shown to the user on disconnect: clearing local state does not make
/// the wallet provider drop the site's authorization.
pub const DISCONNECT_NOTICE: &str = "Disconnected locally. To fully disconnect, remove this \
     site from your wallet's connected sites.";

/// Connection state, created at startup and alive for the page session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub chain_id: Option<u64>,
    /// Ordered account list; the first entry is the active account.
    pub accounts: Vec<Address>,
    pub is_active: bool,
    pub is_activating: bool,
}

impl ConnectionState {
    pub fn active_account(&self) -> Option<Address> {
        self.accounts.first().copied()
    }
}

/// What a provider event did to the connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// The active account changed; derived state (balances) is stale.
    AccountChanged,
    ChainChanged,
    Disconnected,
    Unchanged,
}

pub struct WalletConnector<P> {
    provider: Rc<P>,
    state: ConnectionState,
}

impl<P: WalletProvider> WalletConnector<P> {
    pub fn new(provider: Rc<P>) -> Self {
        Self {
            provider,
            state: ConnectionState::default(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn provider(&self) -> Rc<P> {
        Rc::clone(&self.provider)
    }

    /// Attempt a silent reconnection using the provider's cached
    /// session. Failures are logged and swallowed; the page simply
    /// stays disconnected.
    pub async fn connect_eagerly(&mut self) {
        match self.silent_connect().await {
            Ok(true) => debug!(accounts = self.state.accounts.len(), "eager reconnect"),
            Ok(false) => debug!("no cached wallet session"),
            Err(err) => debug!(%err, "eager reconnect failed"),
        }
    }

    async fn silent_connect(&mut self) -> Result<bool, ProviderError> {
        let accounts = parse_accounts(self.provider.request("eth_accounts", json!([])).await?)?;
        if accounts.is_empty() {
            return Ok(false);
        }
        let chain = self.query_chain_id().await?;
        self.state.accounts = accounts;
        self.state.chain_id = Some(chain);
        self.state.is_active = true;
        Ok(true)
    }

    /// Request an explicit connection, prompting the user if needed, and
    /// switch the wallet to `target_chain_id` when it is on another
    /// chain. Errors (user rejection, missing provider) are reported to
    /// the caller, not fatal.
    pub async fn activate(&mut self, target_chain_id: u64) -> Result<(), ProviderError> {
        self.state.is_activating = true;
        let result = self.do_activate(target_chain_id).await;
        self.state.is_activating = false;
        if result.is_err() {
            self.state.is_active = false;
        }
        result
    }

    async fn do_activate(&mut self, target_chain_id: u64) -> Result<(), ProviderError> {
        let accounts =
            parse_accounts(self.provider.request("eth_requestAccounts", json!([])).await?)?;
        if accounts.is_empty() {
            return Err(ProviderError::Rejected);
        }

        let mut chain = self.query_chain_id().await?;
        if chain != target_chain_id {
            self.provider
                .request(
                    "wallet_switchEthereumChain",
                    json!([{ "chainId": quantity(target_chain_id) }]),
                )
                .await?;
            chain = target_chain_id;
        }

        self.state.accounts = accounts;
        self.state.chain_id = Some(chain);
        self.state.is_active = true;
        Ok(())
    }

    /// Clear local connection state. The wallet provider may keep the
    /// site authorized; see [`DISCONNECT_NOTICE`].
    pub fn reset_state(&mut self) {
        self.state = ConnectionState::default();
    }

    /// Apply a provider notification and report what changed, so the
    /// caller can re-derive dependent state (a balance read per account
    /// change, exactly once).
    pub fn apply_event(&mut self, event: ProviderEvent) -> StateChange {
        match event {
            ProviderEvent::AccountsChanged(raw) => {
                let accounts = parse_account_strings(&raw);
                if accounts.is_empty() {
                    if self.state.is_active {
                        self.reset_state();
                        return StateChange::Disconnected;
                    }
                    return StateChange::Unchanged;
                }
                let unchanged = self.state.accounts.first() == accounts.first();
                self.state.accounts = accounts;
                self.state.is_active = true;
                if unchanged {
                    StateChange::Unchanged
                } else {
                    StateChange::AccountChanged
                }
            }
            ProviderEvent::ChainChanged(id) => {
                if self.state.chain_id == Some(id) {
                    return StateChange::Unchanged;
                }
                self.state.chain_id = Some(id);
                StateChange::ChainChanged
            }
            ProviderEvent::Disconnect => {
                if !self.state.is_active && self.state.accounts.is_empty() {
                    return StateChange::Unchanged;
                }
                self.reset_state();
                StateChange::Disconnected
            }
        }
    }

    async fn query_chain_id(&self) -> Result<u64, ProviderError> {
        let value = self.provider.request("eth_chainId", json!([])).await?;
        let hex = value.as_str().ok_or_else(|| {
            ProviderError::InvalidResponse(format!("non-string chain id: {value}"))
        })?;
        parse_quantity(hex)
    }
}

fn parse_accounts(value: Value) -> Result<Vec<Address>, ProviderError> {
    let list = value.as_array().ok_or_else(|| {
        ProviderError::InvalidResponse(format!("non-array account list: {value}"))
    })?;
    let raw: Vec<String> = list
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    Ok(parse_account_strings(&raw))
}

fn parse_account_strings(raw: &[String]) -> Vec<Address> {
    raw.iter()
        .filter_map(|s| match Address::from_str(s) {
            Ok(addr) => Some(addr),
            Err(err) => {
                warn!(%err, account = %s, "skipping unparseable account");
                None
            }
        })
        .collect()
}
