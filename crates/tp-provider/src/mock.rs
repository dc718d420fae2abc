//! Scriptable in-memory provider for tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use async_trait::async_trait;
use futures::channel::mpsc;
use serde_json::Value;

use crate::{EventReceiver, EventSender, ProviderError, ProviderEvent, WalletProvider};

/// Records every request and answers from a queue of scripted
/// responses. An unscripted request fails with `Unavailable`.
#[derive(Default)]
pub struct MockProvider {
    responses: RefCell<VecDeque<Result<Value, ProviderError>>>,
    requests: RefCell<Vec<(String, Value)>>,
    event_tx: RefCell<Option<EventSender>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, value: Value) {
        self.responses.borrow_mut().push_back(Ok(value));
    }

    pub fn push_err(&self, err: ProviderError) {
        self.responses.borrow_mut().push_back(Err(err));
    }

    /// All `(method, params)` pairs seen so far.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    /// Push a provider notification to the subscriber, if any.
    pub fn emit(&self, event: ProviderEvent) {
        if let Some(tx) = self.event_tx.borrow().as_ref() {
            let _ = tx.unbounded_send(event);
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.requests
            .borrow_mut()
            .push((method.to_string(), params));
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or(Err(ProviderError::Unavailable))
    }

    fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded();
        *self.event_tx.borrow_mut() = Some(tx);
        rx
    }
}
