//! Bridge from `window.ethereum` to the [`WalletProvider`] trait.
//!
//! Calls go through the provider's EIP-1193 `request({ method, params })`
//! entry point; notifications are forwarded from `on(event, listener)`
//! into the message-passing channel the rest of the app consumes.

use async_trait::async_trait;
use futures::channel::mpsc;
use js_sys::{Function, Object, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use tp_provider::{
    EventReceiver, EventSender, ProviderError, ProviderEvent, USER_REJECTED_CODE, WalletProvider,
    parse_quantity,
};

/// Handle to the injected provider, if any. A page without a wallet
/// extension still gets a working (always-unavailable) provider.
pub struct Eip1193Provider {
    inner: Option<Object>,
}

impl Eip1193Provider {
    pub fn discover() -> Self {
        let inner = web_sys::window()
            .and_then(|w| Reflect::get(&w, &JsValue::from_str("ethereum")).ok())
            .filter(|v| v.is_object())
            .and_then(|v| v.dyn_into::<Object>().ok());
        Self { inner }
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_some()
    }
}

#[async_trait(?Send)]
impl WalletProvider for Eip1193Provider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let Some(eth) = self.inner.as_ref() else {
            return Err(ProviderError::Unavailable);
        };
        let request_fn = Reflect::get(eth, &JsValue::from_str("request"))
            .ok()
            .and_then(|v| v.dyn_into::<Function>().ok())
            .ok_or(ProviderError::Unavailable)?;

        let arg = Object::new();
        Reflect::set(&arg, &JsValue::from_str("method"), &JsValue::from_str(method))
            .map_err(map_js_error)?;
        let js_params = serde_wasm_bindgen::to_value(&params)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Reflect::set(&arg, &JsValue::from_str("params"), &js_params).map_err(map_js_error)?;

        let promise: Promise = request_fn
            .call1(eth, &arg)
            .map_err(map_js_error)?
            .dyn_into()
            .map_err(|_| {
                ProviderError::InvalidResponse("request() did not return a promise".into())
            })?;

        let result = JsFuture::from(promise).await.map_err(map_js_error)?;
        serde_wasm_bindgen::from_value(result)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded();
        if let Some(eth) = self.inner.as_ref() {
            register_listeners(eth, tx);
        }
        rx
    }
}

/// Map a JS error object to the provider taxonomy. Code 4001 is the
/// EIP-1193 user rejection.
fn map_js_error(err: JsValue) -> ProviderError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64());
    if code == Some(USER_REJECTED_CODE as f64) {
        return ProviderError::Rejected;
    }
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string());
    ProviderError::Call(message.unwrap_or_else(|| format!("{err:?}")))
}

fn register_listeners(eth: &Object, tx: EventSender) {
    let Some(on) = Reflect::get(eth, &JsValue::from_str("on"))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
    else {
        gloo_console::debug!("provider has no on(); notifications disabled");
        return;
    };

    {
        let tx = tx.clone();
        let cb = Closure::wrap(Box::new(move |accounts: JsValue| {
            let list: Vec<String> = js_sys::Array::from(&accounts)
                .iter()
                .filter_map(|v| v.as_string())
                .collect();
            let _ = tx.unbounded_send(ProviderEvent::AccountsChanged(list));
        }) as Box<dyn FnMut(JsValue)>);
        let _ = on.call2(eth, &JsValue::from_str("accountsChanged"), cb.as_ref());
        cb.forget();
    }

    {
        let tx = tx.clone();
        let cb = Closure::wrap(Box::new(move |chain: JsValue| {
            match chain.as_string().map(|h| parse_quantity(&h)) {
                Some(Ok(id)) => {
                    let _ = tx.unbounded_send(ProviderEvent::ChainChanged(id));
                }
                other => gloo_console::debug!(format!("ignoring chainChanged payload: {other:?}")),
            }
        }) as Box<dyn FnMut(JsValue)>);
        let _ = on.call2(eth, &JsValue::from_str("chainChanged"), cb.as_ref());
        cb.forget();
    }

    {
        let cb = Closure::wrap(Box::new(move |_: JsValue| {
            let _ = tx.unbounded_send(ProviderEvent::Disconnect);
        }) as Box<dyn FnMut(JsValue)>);
        let _ = on.call2(eth, &JsValue::from_str("disconnect"), cb.as_ref());
        cb.forget();
    }
}
