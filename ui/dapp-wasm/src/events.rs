//! Event binding.
//!
//! Listeners translate DOM events into [`UiAction`] values on the
//! action channel. The single consumer in `lib.rs` owns the session, so
//! actions and provider notifications are processed in arrival order
//! and never dropped while an interaction is in flight.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use futures::channel::mpsc;
use tp_dapp_core::UiAction;

use crate::dom::{self, Elements};

pub type ActionSender = mpsc::UnboundedSender<UiAction>;

/// Helper: attach a click handler that enqueues a fixed action.
macro_rules! on_click_send {
    ($el:expr, $tx:expr, $action:expr) => {{
        let tx = $tx.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let _ = tx.unbounded_send($action);
        }) as Box<dyn FnMut(_)>);
        $el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }};
}

/// Bind all UI event listeners. Call once after init.
pub fn bind_events(els: &Elements, actions: &ActionSender) {
    on_click_send!(els.connect_btn, actions, UiAction::Connect);
    on_click_send!(els.disconnect_btn, actions, UiAction::Disconnect);

    // Buy reads the amount at click time.
    {
        let els2 = els.clone();
        let tx = actions.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            let _ = tx.unbounded_send(UiAction::Buy {
                eth_amount: dom::get_input_value(&els2.eth_amount),
            });
        }) as Box<dyn FnMut(_)>);
        els.buy_btn
            .add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }

    // Keep the form amount in sync while the user types.
    {
        let els2 = els.clone();
        let tx = actions.clone();
        let cb = Closure::wrap(Box::new(move |_: web_sys::Event| {
            let _ = tx.unbounded_send(UiAction::AmountChanged(dom::get_input_value(
                &els2.eth_amount,
            )));
        }) as Box<dyn FnMut(_)>);
        els.eth_amount
            .add_event_listener_with_callback("input", cb.as_ref().unchecked_ref())
            .unwrap();
        cb.forget();
    }
}
