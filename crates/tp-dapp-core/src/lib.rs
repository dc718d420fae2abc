//! View controller for the token-purchase page.
//!
//! [`DappSession`] orchestrates the wallet connector and the contract
//! client and owns everything the presentation layer renders. The UI
//! calls the `handle_*` methods in response to user actions and pumps
//! provider notifications into [`DappSession::handle_event`]; rendering
//! is a pure function of the accessors.

use std::rc::Rc;

use tracing::{debug, warn};
use tp_connector::{DISCONNECT_NOTICE, StateChange, WalletConnector};
use tp_contract::{TARGET_CHAIN_ID, TokenContract};
use tp_eth_types::{Address, format_token};
use tp_provider::{ProviderEvent, WalletProvider};

pub use tp_connector::ConnectionState;
pub use tp_contract::TPTP_ADDRESS;

/// Connection lifecycle as the page presents it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Disconnected,
    Activating,
    Connected {
        account: Address,
        /// Formatted token balance; `None` while a read is pending or
        /// after one failed.
        balance: Option<String>,
    },
}

/// The purchase form. `is_submitting` is a best-effort single-flight
/// guard, not a lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseForm {
    pub eth_amount: String,
    pub is_submitting: bool,
}

/// Everything the page can ask the controller to do. User actions and
/// provider notifications share one queue, processed in arrival order
/// by a single owner of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    Connect,
    Disconnect,
    AmountChanged(String),
    Buy { eth_amount: String },
    Provider(ProviderEvent),
}

pub struct DappSession<P> {
    connector: WalletConnector<P>,
    contract: TokenContract<P>,
    view: ViewState,
    form: PurchaseForm,
    last_error: Option<String>,
    notice: Option<String>,
}

impl<P: WalletProvider> DappSession<P> {
    pub fn new(provider: Rc<P>) -> Self {
        Self {
            connector: WalletConnector::new(Rc::clone(&provider)),
            contract: TokenContract::new(provider),
            view: ViewState::Disconnected,
            form: PurchaseForm::default(),
            last_error: None,
            notice: None,
        }
    }

    // ── Read model ──

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn form(&self) -> &PurchaseForm {
        &self.form
    }

    pub fn connection(&self) -> &ConnectionState {
        self.connector.state()
    }

    pub fn contract_address(&self) -> Address {
        self.contract.address()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    // ── User actions ──

    /// Silent reconnection attempt on page load. Never user-visible on
    /// failure.
    pub async fn connect_eagerly(&mut self) {
        self.connector.connect_eagerly().await;
        if self.connector.state().is_active {
            self.enter_connected().await;
        }
    }

    pub async fn handle_connect(&mut self) {
        self.last_error = None;
        self.notice = None;
        self.view = ViewState::Activating;
        match self.connector.activate(TARGET_CHAIN_ID).await {
            Ok(()) => self.enter_connected().await,
            Err(err) => {
                self.view = ViewState::Disconnected;
                self.last_error = Some(err.to_string());
            }
        }
    }

    pub fn handle_disconnect(&mut self) {
        self.connector.reset_state();
        self.view = ViewState::Disconnected;
        self.form = PurchaseForm::default();
        self.notice = Some(DISCONNECT_NOTICE.to_string());
    }

    pub fn set_eth_amount(&mut self, value: &str) {
        self.form.eth_amount = value.to_string();
    }

    /// Flip the single-flight guard and report whether a submission may
    /// proceed. Re-entrant calls while one is in flight are refused, as
    /// are calls without an active account. Callers paint the
    /// submitting state, then run [`DappSession::finish_submit`].
    pub fn begin_submit(&mut self) -> bool {
        if self.form.is_submitting || self.active_account().is_none() {
            return false;
        }
        self.last_error = None;
        self.form.is_submitting = true;
        true
    }

    /// Run the purchase begun by [`DappSession::begin_submit`]. The
    /// submitting flag is cleared on every exit path.
    pub async fn finish_submit(&mut self) {
        let Some(account) = self.active_account() else {
            self.form.is_submitting = false;
            return;
        };

        let amount = self.form.eth_amount.clone();
        let result = self.contract.buy(account, &amount).await;
        self.form.is_submitting = false;

        match result {
            Ok(tx_hash) => {
                debug!(%tx_hash, "purchase submitted");
                self.form.eth_amount.clear();
                // Confirmation is not awaited; re-query the balance
                // instead of trusting transfer notifications.
                self.refresh_balance().await;
            }
            Err(err) => self.last_error = Some(err.to_string()),
        }
    }

    /// Submit a purchase for the current form amount.
    pub async fn handle_buy(&mut self) {
        if self.begin_submit() {
            self.finish_submit().await;
        }
    }

    /// Dispatch one queued action.
    pub async fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::Connect => self.handle_connect().await,
            UiAction::Disconnect => self.handle_disconnect(),
            UiAction::AmountChanged(value) => self.set_eth_amount(&value),
            UiAction::Buy { eth_amount } => {
                self.set_eth_amount(&eth_amount);
                self.handle_buy().await;
            }
            UiAction::Provider(event) => self.handle_event(event).await,
        }
    }

    /// Re-derive the balance for the active account. Failures are
    /// surfaced once and abandoned.
    pub async fn refresh_balance(&mut self) {
        let Some(account) = self.active_account() else {
            return;
        };
        match self.contract.balance_of(account).await {
            Ok(raw) => {
                self.view = ViewState::Connected {
                    account,
                    balance: Some(format_token(raw)),
                };
            }
            Err(err) => {
                warn!(%err, "balance read failed");
                self.last_error = Some("Error fetching balance".to_string());
            }
        }
    }

    // ── Provider notifications ──

    pub async fn handle_event(&mut self, event: ProviderEvent) {
        match self.connector.apply_event(event) {
            StateChange::AccountChanged => self.enter_connected().await,
            StateChange::Disconnected => {
                self.view = ViewState::Disconnected;
                self.form = PurchaseForm::default();
            }
            StateChange::ChainChanged | StateChange::Unchanged => {}
        }
    }

    async fn enter_connected(&mut self) {
        let Some(account) = self.connector.state().active_account() else {
            self.view = ViewState::Disconnected;
            return;
        };
        self.view = ViewState::Connected {
            account,
            balance: None,
        };
        self.refresh_balance().await;
    }

    fn active_account(&self) -> Option<Address> {
        match &self.view {
            ViewState::Connected { account, .. } => Some(*account),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use serde_json::json;
    use tp_provider::ProviderError;
    use tp_provider::mock::MockProvider;

    const ACCOUNT: &str = "0x00000000000000000000000000000000000000a1";
    const OTHER: &str = "0x00000000000000000000000000000000000000b2";

    fn balance_words(tokens: u64) -> serde_json::Value {
        json!(format!(
            "0x{:064x}",
            base_units(tokens)
        ))
    }

    fn base_units(tokens: u64) -> u128 {
        (tokens as u128) * 10u128.pow(18)
    }

    fn connected_session(provider: &Rc<MockProvider>) -> DappSession<MockProvider> {
        provider.push_ok(json!([ACCOUNT])); // eth_requestAccounts
        provider.push_ok(json!("0xaa36a7")); // eth_chainId
        provider.push_ok(balance_words(100)); // eth_call balanceOf

        let mut session = DappSession::new(Rc::clone(provider));
        block_on(session.handle_connect());
        session
    }

    #[test]
    fn connect_reads_balance_and_enters_connected() {
        let provider = Rc::new(MockProvider::new());
        let session = connected_session(&provider);

        assert!(session.connection().is_active);
        match session.view() {
            ViewState::Connected { balance, .. } => {
                assert_eq!(balance.as_deref(), Some("100.0"));
            }
            other => panic!("unexpected view state: {other:?}"),
        }
        assert_eq!(provider.calls_to("eth_call"), 1);
    }

    #[test]
    fn rejected_connect_returns_to_disconnected() {
        let provider = Rc::new(MockProvider::new());
        provider.push_err(ProviderError::Rejected);

        let mut session = DappSession::new(Rc::clone(&provider));
        block_on(session.handle_connect());

        assert_eq!(*session.view(), ViewState::Disconnected);
        assert!(session.last_error().is_some());
    }

    #[test]
    fn eager_connect_failure_is_silent() {
        let provider = Rc::new(MockProvider::new());
        provider.push_err(ProviderError::Unavailable);

        let mut session = DappSession::new(Rc::clone(&provider));
        block_on(session.connect_eagerly());

        assert_eq!(*session.view(), ViewState::Disconnected);
        assert!(session.last_error().is_none());
    }

    #[test]
    fn balance_read_once_per_account_change() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);
        assert_eq!(provider.calls_to("eth_call"), 1);

        // Same account again: no new read.
        block_on(session.handle_event(ProviderEvent::AccountsChanged(vec![ACCOUNT.to_string()])));
        assert_eq!(provider.calls_to("eth_call"), 1);

        // New account: exactly one more read.
        provider.push_ok(balance_words(7));
        block_on(session.handle_event(ProviderEvent::AccountsChanged(vec![OTHER.to_string()])));
        assert_eq!(provider.calls_to("eth_call"), 2);
        match session.view() {
            ViewState::Connected { balance, .. } => {
                assert_eq!(balance.as_deref(), Some("7.0"));
            }
            other => panic!("unexpected view state: {other:?}"),
        }
    }

    #[test]
    fn balance_failure_is_user_facing_but_non_fatal() {
        let provider = Rc::new(MockProvider::new());
        provider.push_ok(json!([ACCOUNT]));
        provider.push_ok(json!("0xaa36a7"));
        provider.push_err(ProviderError::Call("execution reverted".into()));

        let mut session = DappSession::new(Rc::clone(&provider));
        block_on(session.handle_connect());

        assert!(session.connection().is_active);
        assert_eq!(session.last_error(), Some("Error fetching balance"));
        match session.view() {
            ViewState::Connected { balance, .. } => assert!(balance.is_none()),
            other => panic!("unexpected view state: {other:?}"),
        }
    }

    #[test]
    fn disconnect_clears_state_and_sets_notice() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        session.handle_disconnect();

        assert_eq!(*session.view(), ViewState::Disconnected);
        assert!(!session.connection().is_active);
        assert_eq!(session.notice(), Some(DISCONNECT_NOTICE));
    }

    #[test]
    fn buy_submits_resets_form_and_requeries_balance() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        session.set_eth_amount("1");
        provider.push_ok(json!(
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        ));
        provider.push_ok(balance_words(200));
        block_on(session.handle_buy());

        assert!(!session.form().is_submitting);
        assert!(session.form().eth_amount.is_empty());
        assert_eq!(provider.calls_to("eth_sendTransaction"), 1);
        // Optimistic reconciliation is an explicit re-query.
        assert_eq!(provider.calls_to("eth_call"), 2);
        match session.view() {
            ViewState::Connected { balance, .. } => {
                assert_eq!(balance.as_deref(), Some("200.0"));
            }
            other => panic!("unexpected view state: {other:?}"),
        }
    }

    #[test]
    fn buy_with_non_positive_amount_never_reaches_provider() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);
        let before = provider.request_count();

        session.set_eth_amount("0");
        block_on(session.handle_buy());

        assert_eq!(provider.request_count(), before);
        assert!(session.last_error().is_some());
        assert!(!session.form().is_submitting);
    }

    #[test]
    fn buy_failure_clears_submitting_flag() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        session.set_eth_amount("1");
        provider.push_err(ProviderError::Rejected);
        block_on(session.handle_buy());

        assert!(!session.form().is_submitting);
        assert!(session.last_error().is_some());
        // Amount kept so the user can retry.
        assert_eq!(session.form().eth_amount, "1");
    }

    #[test]
    fn submitting_state_is_observable_before_the_provider_call() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        session.set_eth_amount("1");
        assert!(session.begin_submit());
        // The flag flips before any network interaction, so a repaint
        // here shows the disabled control.
        assert!(session.form().is_submitting);
        assert_eq!(provider.calls_to("eth_sendTransaction"), 0);

        provider.push_ok(json!(
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        ));
        provider.push_ok(balance_words(200));
        block_on(session.finish_submit());

        assert!(!session.form().is_submitting);
        assert_eq!(provider.calls_to("eth_sendTransaction"), 1);
    }

    #[test]
    fn begin_submit_refuses_reentry_and_disconnected_sessions() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        assert!(session.begin_submit());
        assert!(!session.begin_submit());

        let mut idle = DappSession::new(Rc::new(MockProvider::new()));
        idle.set_eth_amount("1");
        assert!(!idle.begin_submit());
    }

    #[test]
    fn notifications_during_a_purchase_stay_queued() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);
        let mut notifications = provider.subscribe();

        // The wallet pushes an account change while a purchase holds
        // the session.
        session.set_eth_amount("1");
        assert!(session.begin_submit());
        provider.emit(ProviderEvent::AccountsChanged(vec![OTHER.to_string()]));
        provider.push_ok(json!(
            "0x00000000000000000000000000000000000000000000000000000000000000ab"
        ));
        provider.push_ok(balance_words(200));
        block_on(session.finish_submit());

        // The event was buffered, not lost; draining the queue applies
        // it and re-derives the balance for the new account.
        let event = notifications
            .try_next()
            .expect("channel open")
            .expect("event queued");
        provider.push_ok(balance_words(9));
        block_on(session.apply_action(UiAction::Provider(event)));

        match session.view() {
            ViewState::Connected { account, balance } => {
                assert_eq!(account.to_string().to_lowercase(), OTHER);
                assert_eq!(balance.as_deref(), Some("9.0"));
            }
            other => panic!("unexpected view state: {other:?}"),
        }
    }

    #[test]
    fn buy_while_submitting_is_dropped() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);
        let before = provider.request_count();

        session.form.is_submitting = true;
        session.set_eth_amount("1");
        block_on(session.handle_buy());

        assert_eq!(provider.request_count(), before);
    }

    #[test]
    fn buy_while_disconnected_is_dropped() {
        let provider = Rc::new(MockProvider::new());
        let mut session = DappSession::new(Rc::clone(&provider));

        session.set_eth_amount("1");
        block_on(session.handle_buy());

        assert_eq!(provider.request_count(), 0);
    }

    #[test]
    fn provider_disconnect_event_resets_view() {
        let provider = Rc::new(MockProvider::new());
        let mut session = connected_session(&provider);

        block_on(session.handle_event(ProviderEvent::Disconnect));

        assert_eq!(*session.view(), ViewState::Disconnected);
        assert!(!session.connection().is_active);
    }
}
