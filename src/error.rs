use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::{
    constants::{
        CODE_ACTION_REJECTED, CODE_RPC_INTERNAL, CODE_UNRECOGNIZED_CHAIN, CODE_USER_REJECTED,
        CODE_USER_REJECTED_NAMED, MAX_RAW_ERROR_MESSAGE_LEN, NETWORK,
    },
    integrations::provider::{ProviderError, RpcCode},
};

/// Which wallet prompt the user declined while assuring the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStep {
    Switch,
    AddChain,
}

impl fmt::Display for SwitchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchStep::Switch => write!(f, "switch"),
            SwitchStep::AddChain => write!(f, "add chain"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("No wallet provider detected")]
    ProviderMissing,

    #[error("User rejected the request")]
    UserRejected,

    #[error("User cancelled the request")]
    UserCancelled,

    #[error("Network {0} request rejected")]
    NetworkSwitchRejected(SwitchStep),

    #[error("Unrecognized chain: {0}")]
    UnrecognizedChain(String),

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),

    #[error("Execution reverted: {0}")]
    ExecutionReverted(String),

    #[error("Transient RPC error: {message}")]
    RpcTransientError { code: Option<i64>, message: String },

    #[error("Unknown failure: {0}")]
    UnknownFailure(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("No account selected")]
    NoAccount,

    #[error("Contract not available")]
    ContractUnavailable,

    #[error("Another transaction is already in progress")]
    TransactionInFlight,

    #[error("Transaction {0} was not confirmed in time")]
    ConfirmationTimeout(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text shown to the user for a failed action.
    pub fn user_message(&self) -> String {
        match self {
            AppError::ProviderMissing => {
                "No Ethereum Wallet detected. Please install MetaMask or Trust Wallet".to_string()
            }
            AppError::UserRejected => "Transaction was rejected by user".to_string(),
            AppError::UserCancelled => "Transaction was cancelled".to_string(),
            AppError::NetworkSwitchRejected(SwitchStep::Switch) => format!(
                "Please approve the network switch to {} in your wallet",
                NETWORK.chain_name
            ),
            AppError::NetworkSwitchRejected(SwitchStep::AddChain) => {
                format!("Please approve adding {} to your wallet", NETWORK.chain_name)
            }
            AppError::UnrecognizedChain(_) => {
                format!("Please add {} to your wallet", NETWORK.chain_name)
            }
            AppError::InsufficientFunds => "Insufficient funds for transaction".to_string(),
            AppError::GasEstimationFailed(_) => "Gas estimation failed".to_string(),
            AppError::ExecutionReverted(_) => "Transaction reverted - check your input".to_string(),
            AppError::RpcTransientError { code: Some(_), .. } => {
                "RPC Error - Please check your network connection and try again".to_string()
            }
            AppError::RpcTransientError { code: None, .. } => {
                "Network error - Please try again".to_string()
            }
            AppError::UnknownFailure(message) => {
                let trimmed = message.trim();
                if trimmed.is_empty() {
                    "Transaction failed".to_string()
                } else if trimmed.len() > MAX_RAW_ERROR_MESSAGE_LEN {
                    "Transaction failed - please try again".to_string()
                } else {
                    trimmed.to_string()
                }
            }
            AppError::NotConnected => "Please connect your wallet first".to_string(),
            AppError::NoAccount => "No account selected".to_string(),
            AppError::ContractUnavailable => "Contract not available".to_string(),
            AppError::TransactionInFlight => "A transaction is already in progress".to_string(),
            AppError::ConfirmationTimeout(_) => {
                "Transaction submitted but not yet confirmed".to_string()
            }
            AppError::BadRequest(message) => message.clone(),
            AppError::Internal(_) => "Transaction failed".to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ProviderMissing => "PROVIDER_MISSING",
            AppError::UserRejected => "USER_REJECTED",
            AppError::UserCancelled => "USER_CANCELLED",
            AppError::NetworkSwitchRejected(_) => "NETWORK_SWITCH_REJECTED",
            AppError::UnrecognizedChain(_) => "UNRECOGNIZED_CHAIN",
            AppError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            AppError::GasEstimationFailed(_) => "GAS_ESTIMATION_FAILED",
            AppError::ExecutionReverted(_) => "EXECUTION_REVERTED",
            AppError::RpcTransientError { .. } => "RPC_TRANSIENT_ERROR",
            AppError::UnknownFailure(_) => "UNKNOWN_FAILURE",
            AppError::NotConnected => "NOT_CONNECTED",
            AppError::NoAccount => "NO_ACCOUNT",
            AppError::ContractUnavailable => "CONTRACT_UNAVAILABLE",
            AppError::TransactionInFlight => "TRANSACTION_IN_FLIGHT",
            AppError::ConfirmationTimeout(_) => "CONFIRMATION_TIMEOUT",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, AppError::UserRejected | AppError::UserCancelled)
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::ProviderMissing => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UserRejected
            | AppError::UserCancelled
            | AppError::NetworkSwitchRejected(_)
            | AppError::UnrecognizedChain(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotConnected | AppError::NoAccount => StatusCode::PRECONDITION_FAILED,
            AppError::TransactionInFlight => StatusCode::CONFLICT,
            AppError::InsufficientFunds
            | AppError::GasEstimationFailed(_)
            | AppError::ExecutionReverted(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RpcTransientError { .. } => StatusCode::BAD_GATEWAY,
            AppError::ConfirmationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::ContractUnavailable
            | AppError::UnknownFailure(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a raw wallet/RPC error onto the typed taxonomy. Known codes win;
/// unknown or absent codes fall through to matching the message text.
impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        classify_provider_error(&err)
    }
}

pub fn classify_provider_error(err: &ProviderError) -> AppError {
    if let Some(code) = &err.code {
        match code {
            RpcCode::Named(name) if name == CODE_ACTION_REJECTED => return AppError::UserRejected,
            RpcCode::Named(name) if name == CODE_USER_REJECTED_NAMED => {
                return AppError::UserCancelled
            }
            _ => {}
        }

        match err.numeric_code() {
            Some(CODE_USER_REJECTED) => return AppError::UserRejected,
            Some(CODE_UNRECOGNIZED_CHAIN) => {
                return AppError::UnrecognizedChain(err.message.clone())
            }
            Some(CODE_RPC_INTERNAL) => {
                if err.nested_code() == Some(CODE_UNRECOGNIZED_CHAIN) {
                    return AppError::UnrecognizedChain(err.message.clone());
                }
                return AppError::RpcTransientError {
                    code: Some(CODE_RPC_INTERNAL),
                    message: err.message.clone(),
                };
            }
            _ => {}
        }
    }

    classify_error_text(&err.message)
}

pub fn classify_error_text(message: &str) -> AppError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("user rejected") || lower.contains("user denied") {
        AppError::UserRejected
    } else if lower.contains("insufficient funds") {
        AppError::InsufficientFunds
    } else if lower.contains("gas") {
        AppError::GasEstimationFailed(message.to_string())
    } else if lower.contains("execution reverted") {
        AppError::ExecutionReverted(message.to_string())
    } else if lower.contains("internal json-rpc error") {
        AppError::RpcTransientError {
            code: None,
            message: message.to_string(),
        }
    } else {
        AppError::UnknownFailure(message.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            AppError::ProviderMissing
            | AppError::UserRejected
            | AppError::UserCancelled
            | AppError::NotConnected
            | AppError::BadRequest(_) => None,
            other => Some(serde_json::json!({ "raw": other.to_string() })),
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.user_message(),
                details,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn coded(code: RpcCode, message: &str) -> ProviderError {
        ProviderError {
            code: Some(code),
            message: message.to_string(),
            data: None,
        }
    }

    fn text(message: &str) -> ProviderError {
        ProviderError {
            code: None,
            message: message.to_string(),
            data: None,
        }
    }

    #[test]
    fn classifier_maps_documented_cases_to_exact_messages() {
        let long = "x".repeat(MAX_RAW_ERROR_MESSAGE_LEN + 1);
        let cases: Vec<(ProviderError, &str)> = vec![
            (
                coded(RpcCode::Named("ACTION_REJECTED".into()), "user rejected transaction"),
                "Transaction was rejected by user",
            ),
            (
                coded(RpcCode::Named("USER_REJECTED".into()), "cancelled"),
                "Transaction was cancelled",
            ),
            (
                coded(RpcCode::Numeric(4001), "User denied transaction signature."),
                "Transaction was rejected by user",
            ),
            (
                coded(RpcCode::Numeric(-32603), "Internal JSON-RPC error."),
                "RPC Error - Please check your network connection and try again",
            ),
            (
                coded(RpcCode::Named("-32603".into()), "boom"),
                "RPC Error - Please check your network connection and try again",
            ),
            (
                text("insufficient funds for gas * price + value"),
                "Insufficient funds for transaction",
            ),
            (
                text("cannot estimate gas; transaction may fail"),
                "Gas estimation failed",
            ),
            (
                text("execution reverted: not admin"),
                "Transaction reverted - check your input",
            ),
            (
                text("Internal JSON-RPC error."),
                "Network error - Please try again",
            ),
            (text("nonce too low"), "nonce too low"),
            (text(&long), "Transaction failed - please try again"),
            (text(""), "Transaction failed"),
        ];

        for (err, expected) in cases {
            let classified = AppError::from(err.clone());
            assert_eq!(classified.user_message(), expected, "input: {:?}", err);
        }
    }

    #[test]
    fn code_checks_take_priority_over_text() {
        let err = coded(RpcCode::Numeric(-32603), "insufficient funds for transfer");
        assert!(matches!(
            AppError::from(err),
            AppError::RpcTransientError { code: Some(-32603), .. }
        ));
    }

    #[test]
    fn unknown_code_falls_through_to_text() {
        let err = coded(RpcCode::Numeric(-32000), "execution reverted");
        assert!(matches!(AppError::from(err), AppError::ExecutionReverted(_)));
    }

    #[test]
    fn unrecognized_chain_detected_directly_and_nested() {
        let direct = coded(RpcCode::Numeric(4902), "Unrecognized chain ID");
        assert!(matches!(AppError::from(direct), AppError::UnrecognizedChain(_)));

        let nested = ProviderError {
            code: Some(RpcCode::Numeric(-32603)),
            message: "Internal JSON-RPC error.".to_string(),
            data: Some(serde_json::json!({ "originalError": { "code": 4902 } })),
        };
        assert!(matches!(AppError::from(nested), AppError::UnrecognizedChain(_)));
    }

    #[test]
    fn switch_rejections_name_the_network() {
        assert_eq!(
            AppError::NetworkSwitchRejected(SwitchStep::Switch).user_message(),
            "Please approve the network switch to BSC Testnet in your wallet"
        );
        assert_eq!(
            AppError::NetworkSwitchRejected(SwitchStep::AddChain).user_message(),
            "Please approve adding BSC Testnet to your wallet"
        );
    }

    #[test]
    fn status_codes_follow_error_family() {
        assert_eq!(AppError::ProviderMissing.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(AppError::TransactionInFlight.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::RpcTransientError { code: None, message: String::new() }.status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
