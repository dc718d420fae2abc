//! TokenPort browser frontend.
//!
//! Single-page WASM app: connect an injected wallet, show the TPTP
//! balance, submit purchases against the fixed Sepolia contract. All
//! state lives in `tp-dapp-core`; this crate only bridges the provider,
//! binds the DOM, and repaints.

pub mod dom;
pub mod eip1193;
pub mod events;
pub mod render;

use std::rc::Rc;

use futures::StreamExt;
use futures::channel::mpsc;
use wasm_bindgen::prelude::*;

use tp_dapp_core::{DappSession, UiAction};
use tp_provider::WalletProvider;

use crate::eip1193::Eip1193Provider;

/// WASM entry point, called when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;

    let provider = Rc::new(Eip1193Provider::discover());
    if !provider.is_available() {
        gloo_console::debug!("no injected wallet provider found");
    }

    let (actions_tx, mut actions) = mpsc::unbounded::<UiAction>();
    events::bind_events(&els, &actions_tx);

    // Provider notifications join the same queue as user actions, so an
    // event arriving mid-interaction waits its turn instead of being
    // lost.
    let mut notifications = provider.subscribe();
    {
        let tx = actions_tx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            while let Some(event) = notifications.next().await {
                let _ = tx.unbounded_send(UiAction::Provider(event));
            }
        });
    }

    let mut session = DappSession::new(provider);

    // Eager reconnection; failures stay in the console.
    session.connect_eagerly().await;
    render::render(&els, &session);

    // Sole owner of the session: processes the queue in order.
    wasm_bindgen_futures::spawn_local(async move {
        while let Some(action) = actions.next().await {
            match action {
                // No visible state change; skip the repaint so typing
                // is not disturbed.
                UiAction::AmountChanged(value) => session.set_eth_amount(&value),
                UiAction::Buy { eth_amount } => {
                    session.set_eth_amount(&eth_amount);
                    if session.begin_submit() {
                        // Paint the disabled control before the wallet
                        // prompt opens.
                        render::render(&els, &session);
                        session.finish_submit().await;
                    }
                    render::render(&els, &session);
                }
                other => {
                    session.apply_action(other).await;
                    render::render(&els, &session);
                }
            }
        }
    });

    Ok(())
}
