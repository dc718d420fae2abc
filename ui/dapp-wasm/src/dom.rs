//! DOM element bindings.
//!
//! All references are resolved once at startup into [`Elements`].
//! To add UI, add a field here, bind it in `Elements::bind()`, and wire
//! it in `events.rs`.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlInputElement};

fn doc() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().get_element_by_id(id)
}

pub fn by_id_typed<T: JsCast>(id: &str) -> Option<T> {
    by_id(id).and_then(|e| e.dyn_into::<T>().ok())
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn get_input_value(el: &HtmlInputElement) -> String {
    el.value().trim().to_string()
}

pub fn set_input_value(el: &HtmlInputElement, val: &str) {
    el.set_value(val);
}

/// Show or hide an element via the `hidden` class.
pub fn set_hidden(el: &Element, hidden: bool) {
    let _ = el.class_list().toggle_with_force("hidden", hidden);
}

// ── Elements struct ──

/// All DOM references used by the page. Clone-friendly (inner types are
/// JS handles).
#[derive(Clone)]
pub struct Elements {
    // Top bar
    pub connect_btn: HtmlButtonElement,
    pub disconnect_btn: HtmlButtonElement,
    pub account_chip: Element,
    pub wallet_stack: Element,

    // Connection info card
    pub chain_id_txt: Element,
    pub is_active_txt: Element,
    pub account_txt: Element,

    // Purchase card
    pub buy_card: Element,
    pub contract_address: HtmlInputElement,
    pub token_balance: HtmlInputElement,
    pub eth_amount: HtmlInputElement,
    pub buy_btn: HtmlButtonElement,

    // Messages
    pub error_txt: Element,
    pub notice_txt: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

macro_rules! get_input {
    ($id:expr) => {
        by_id_typed::<HtmlInputElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing input #{}", $id)))?
    };
}

macro_rules! get_button {
    ($id:expr) => {
        by_id_typed::<HtmlButtonElement>($id)
            .ok_or_else(|| JsValue::from_str(&format!("missing button #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            connect_btn: get_button!("connectBtn"),
            disconnect_btn: get_button!("disconnectBtn"),
            account_chip: get_el!("accountChip"),
            wallet_stack: get_el!("walletStack"),

            chain_id_txt: get_el!("chainIdTxt"),
            is_active_txt: get_el!("isActiveTxt"),
            account_txt: get_el!("accountTxt"),

            buy_card: get_el!("buyCard"),
            contract_address: get_input!("contractAddress"),
            token_balance: get_input!("tokenBalance"),
            eth_amount: get_input!("ethAmount"),
            buy_btn: get_button!("buyBtn"),

            error_txt: get_el!("errorTxt"),
            notice_txt: get_el!("noticeTxt"),
        })
    }
}
