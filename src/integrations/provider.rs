use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// EIP-1193 error code: numeric for wallets, named for some client libraries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcCode {
    Numeric(i64),
    Named(String),
}

impl RpcCode {
    pub fn as_numeric(&self) -> Option<i64> {
        match self {
            RpcCode::Numeric(code) => Some(*code),
            RpcCode::Named(name) => name.trim().parse().ok(),
        }
    }
}

/// Raw error returned by a wallet provider request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderError {
    #[serde(default)]
    pub code: Option<RpcCode>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ProviderError {
    #[cfg(test)]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code: Some(RpcCode::Numeric(code)),
            message: message.into(),
            data: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            data: None,
        }
    }

    pub fn numeric_code(&self) -> Option<i64> {
        self.code.as_ref().and_then(RpcCode::as_numeric)
    }

    /// Code wrapped by wallets that re-raise errors as -32603.
    pub fn nested_code(&self) -> Option<i64> {
        self.data
            .as_ref()?
            .get("originalError")?
            .get("code")?
            .as_i64()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(RpcCode::Numeric(code)) => write!(f, "[{}] {}", code, self.message),
            Some(RpcCode::Named(code)) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Request surface of an injected wallet (EIP-1193 `request`).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError>;

    fn name(&self) -> &str {
        "wallet"
    }
}

fn rpc_request(id: u64, method: &str, params: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id
    })
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ProviderError>,
}

fn unwrap_envelope(
    envelope: RpcEnvelope,
) -> std::result::Result<serde_json::Value, ProviderError> {
    if let Some(error) = envelope.error {
        return Err(error);
    }
    Ok(envelope.result.unwrap_or(serde_json::Value::Null))
}

/// Wallet reachable over JSON-RPC (e.g. a desktop wallet exposing its
/// EIP-1193 surface on localhost). Signing prompts happen inside the wallet.
pub struct HttpWalletProvider {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpWalletProvider {
    pub fn new(endpoint: String, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self {
            endpoint,
            client,
            next_id: AtomicU64::new(1),
        }
    }

    /// Probes the endpoint; `None` means no wallet is present.
    pub async fn detect(endpoint: &str, request_timeout: Duration) -> Option<Self> {
        let provider = Self::new(endpoint.to_string(), request_timeout);
        match provider.request("eth_chainId", serde_json::json!([])).await {
            Ok(chain) => {
                tracing::info!("Wallet provider detected at {} (chain {})", endpoint, chain);
                Some(provider)
            }
            Err(e) if e.code.is_some() => {
                // Reachable but unhappy still counts as present.
                tracing::warn!("Wallet provider at {} answered with error: {}", endpoint, e);
                Some(provider)
            }
            Err(e) => {
                tracing::warn!("No wallet provider at {}: {}", endpoint, e);
                None
            }
        }
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("wallet request #{} {}", id, method);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&rpc_request(id, method, params))
            .send()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::transport(e.to_string()))?;

        unwrap_envelope(envelope)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_request_sets_method_and_id() {
        let req = rpc_request(7, "eth_requestAccounts", serde_json::json!([]));
        assert_eq!(req.get("method").and_then(|v| v.as_str()), Some("eth_requestAccounts"));
        assert_eq!(req.get("id").and_then(|v| v.as_u64()), Some(7));
        assert_eq!(req.get("jsonrpc").and_then(|v| v.as_str()), Some("2.0"));
    }

    #[test]
    fn envelope_error_wins_over_result() {
        let envelope: RpcEnvelope = serde_json::from_value(serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." }
        }))
        .expect("envelope");
        let err = unwrap_envelope(envelope).expect_err("should be error");
        assert_eq!(err.numeric_code(), Some(4001));
        assert_eq!(err.message, "User rejected the request.");
    }

    #[test]
    fn envelope_without_result_is_null() {
        let envelope: RpcEnvelope =
            serde_json::from_value(serde_json::json!({ "jsonrpc": "2.0", "id": 1 }))
                .expect("envelope");
        assert_eq!(unwrap_envelope(envelope), Ok(serde_json::Value::Null));
    }

    #[test]
    fn named_codes_deserialize_and_parse_numeric_strings() {
        let err: ProviderError = serde_json::from_value(serde_json::json!({
            "code": "ACTION_REJECTED",
            "message": "user rejected transaction"
        }))
        .expect("provider error");
        assert_eq!(err.code, Some(RpcCode::Named("ACTION_REJECTED".into())));
        assert_eq!(err.numeric_code(), None);
        assert_eq!(RpcCode::Named("-32603".into()).as_numeric(), Some(-32603));
    }

    #[test]
    fn nested_code_reads_original_error() {
        let err = ProviderError {
            code: Some(RpcCode::Numeric(-32603)),
            message: "Internal JSON-RPC error.".into(),
            data: Some(serde_json::json!({ "originalError": { "code": 4902 } })),
        };
        assert_eq!(err.nested_code(), Some(4902));
        assert_eq!(ProviderError::new(4902, "x").nested_code(), None);
    }
}
