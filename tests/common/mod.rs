//! In-memory transport for driving the client without a network

#![allow(dead_code)]

use async_trait::async_trait;
use bfx_rest::core::errors::ExchangeError;
use bfx_rest::core::kernel::RestClient;
use bfx_rest::exchanges::bitfinex::BitfinexClient;
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub authenticated: bool,
}

impl RecordedCall {
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Replays queued responses in order and records every request it receives
#[derive(Debug, Default)]
pub struct MockRest {
    responses: Mutex<VecDeque<Result<Value, ExchangeError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, value: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(value));
        self
    }

    pub fn fail(self, error: ExchangeError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestClient for MockRest {
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query_params: &[(&str, &str)],
        body: Option<&Value>,
        authenticated: bool,
    ) -> Result<Value, ExchangeError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            path: endpoint.to_string(),
            query: query_params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body: body.cloned(),
            authenticated,
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExchangeError::NetworkError("no response queued".to_string())))
    }
}

pub fn client(rest: MockRest) -> BitfinexClient<MockRest> {
    init_tracing();
    BitfinexClient::new(rest)
}
