// Scripted in-memory wallet used by unit tests.

use async_trait::async_trait;
use ethers::abi::Token;
use ethers::types::U256;
use ethers::utils::hex;
use std::sync::Mutex;
use std::time::Duration;

use super::provider::{ProviderError, WalletProvider};

type Handler = Box<
    dyn Fn(&str, &serde_json::Value) -> std::result::Result<serde_json::Value, ProviderError>
        + Send
        + Sync,
>;

pub struct MockWalletProvider {
    handler: Handler,
    calls: Mutex<Vec<(String, serde_json::Value)>>,
    delay: Option<Duration>,
}

impl MockWalletProvider {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &serde_json::Value) -> std::result::Result<serde_json::Value, ProviderError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Every request sleeps first, so callers can overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|(method, _)| method).collect()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }
}

#[async_trait]
impl WalletProvider for MockWalletProvider {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method.to_string(), params.clone()));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.handler)(method, &params)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// ABI-encoded return value as the `0x` string `eth_call` yields.
pub fn abi_return(tokens: &[Token]) -> serde_json::Value {
    serde_json::json!(format!("0x{}", hex::encode(ethers::abi::encode(tokens))))
}

pub fn uint_return(value: u128) -> serde_json::Value {
    abi_return(&[Token::Uint(U256::from(value))])
}

/// `0x`-prefixed four-byte selector of a canonical signature.
pub fn selector(signature: &str) -> String {
    format!("0x{}", hex::encode(ethers::utils::id(signature)))
}

/// Calldata of the first transaction/call object in `params`.
pub fn calldata(params: &serde_json::Value) -> Vec<u8> {
    params[0]["data"]
        .as_str()
        .and_then(|data| hex::decode(data.trim_start_matches("0x")).ok())
        .unwrap_or_default()
}

/// Selector of the calldata in `params`, `0x`-prefixed.
pub fn selector_of(params: &serde_json::Value) -> String {
    let data = calldata(params);
    if data.len() < 4 {
        return String::new();
    }
    format!("0x{}", hex::encode(&data[..4]))
}

pub fn tx_hash(fill: char) -> String {
    format!("0x{}", fill.to_string().repeat(64))
}
