//! Rendering.
//!
//! A pure function of the session state: every call repaints the page
//! from the controller's read model, nothing else mutates the DOM.

use tp_dapp_core::{DappSession, ViewState};
use tp_eth_types::short_address;

use crate::dom::{self, Elements};
use crate::eip1193::Eip1193Provider;

pub fn render(els: &Elements, session: &DappSession<Eip1193Provider>) {
    let connection = session.connection();
    let connected = matches!(session.view(), ViewState::Connected { .. });
    let activating = matches!(session.view(), ViewState::Activating);

    // Top bar: connect button or account chip + disconnect.
    dom::set_hidden(&els.connect_btn, connection.is_active);
    dom::set_hidden(&els.wallet_stack, !connection.is_active);
    els.connect_btn.set_disabled(activating);
    dom::set_text(
        &els.connect_btn,
        if activating { "Connecting..." } else { "Connect" },
    );

    let account = connection
        .active_account()
        .map(|a| short_address(&a.to_string(), 6, 4));
    dom::set_text(
        &els.account_chip,
        account.as_deref().unwrap_or("No account"),
    );

    // Info card.
    dom::set_text(
        &els.chain_id_txt,
        &connection
            .chain_id
            .map(|c| c.to_string())
            .unwrap_or_default(),
    );
    dom::set_text(
        &els.is_active_txt,
        if connection.is_active { "true" } else { "false" },
    );
    dom::set_text(&els.account_txt, account.as_deref().unwrap_or(""));

    // Purchase card, only while connected.
    dom::set_hidden(&els.buy_card, !connected);
    dom::set_input_value(
        &els.contract_address,
        &session.contract_address().to_string(),
    );
    let balance = match session.view() {
        ViewState::Connected { balance, .. } => balance.as_deref().unwrap_or(""),
        _ => "",
    };
    dom::set_input_value(&els.token_balance, balance);
    dom::set_input_value(&els.eth_amount, &session.form().eth_amount);
    els.buy_btn.set_disabled(session.form().is_submitting);
    dom::set_text(
        &els.buy_btn,
        if session.form().is_submitting {
            "Submitting..."
        } else {
            "Buy"
        },
    );

    // Messages.
    match session.last_error() {
        Some(msg) => {
            dom::set_hidden(&els.error_txt, false);
            dom::set_text(&els.error_txt, msg);
        }
        None => dom::set_hidden(&els.error_txt, true),
    }
    match session.notice() {
        Some(msg) => {
            dom::set_hidden(&els.notice_txt, false);
            dom::set_text(&els.notice_txt, msg);
        }
        None => dom::set_hidden(&els.notice_txt, true),
    }
}
