use chrono::{DateTime, Utc};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{AppError, Result};

// ==================== NETWORK ====================
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct NetworkDescriptor {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub rpc_url: &'static str,
    pub fallback_rpc_urls: &'static [&'static str],
    pub explorer_url: &'static str,
    pub native_currency: NativeCurrency,
}

impl NetworkDescriptor {
    /// Chain id in the `0x`-prefixed form wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    /// Primary endpoint first, then fallbacks in declared order.
    pub fn rpc_urls(&self) -> Vec<&'static str> {
        std::iter::once(self.rpc_url)
            .chain(self.fallback_rpc_urls.iter().copied())
            .collect()
    }

    /// Parameter object for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> serde_json::Value {
        serde_json::json!({
            "chainId": self.chain_id_hex(),
            "chainName": self.chain_name,
            "nativeCurrency": {
                "name": self.native_currency.name,
                "symbol": self.native_currency.symbol,
                "decimals": self.native_currency.decimals,
            },
            "rpcUrls": self.rpc_urls(),
            "blockExplorerUrls": [self.explorer_url],
        })
    }
}

// ==================== CONTRACTS ====================
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ContractAddresses {
    pub payment_contract: &'static str,
    pub usdt_token: &'static str,
    pub admin: &'static str,
}

impl ContractAddresses {
    pub fn payment(&self) -> Result<Address> {
        parse_address(self.payment_contract)
    }

    pub fn token(&self) -> Result<Address> {
        parse_address(self.usdt_token)
    }

    #[cfg(test)]
    pub fn admin(&self) -> Result<Address> {
        parse_address(self.admin)
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid address {}: {}", value, e)))
}

/// Lowercase, full-length `0x` form.
pub fn address_to_string(address: &Address) -> String {
    format!("{:?}", address)
}

/// `0x1234...abcd`
pub fn short_address(address: &str) -> String {
    shorten(address, 6, 4)
}

fn shorten(value: &str, head: usize, tail: usize) -> String {
    if value.len() <= head + tail || !value.is_ascii() {
        return value.to_string();
    }
    format!("{}...{}", &value[..head], &value[value.len() - tail..])
}

// ==================== WALLET ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub balance: String,
    pub is_connected: bool,
}

impl WalletInfo {
    pub fn connected(address: &Address, balance: String) -> Self {
        Self {
            address: address_to_string(address),
            balance,
            is_connected: true,
        }
    }
}

// ==================== TRANSACTION ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Pending,
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub hash: String,
    pub status: TxState,
    pub message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionStatus {
    pub fn pending(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_state(hash.into(), TxState::Pending, Some(message.into()))
    }

    pub fn success(hash: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_state(hash.into(), TxState::Success, Some(message.into()))
    }

    /// Failed statuses never carry a hash.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::with_state(String::new(), TxState::Failed, Some(message.into()))
    }

    fn with_state(hash: String, status: TxState, message: Option<String>) -> Self {
        Self {
            hash,
            status,
            message,
            updated_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == TxState::Pending
    }

    /// `0x12345678...abcdef12`, or `None` before submission.
    pub fn short_hash(&self) -> Option<String> {
        if self.hash.is_empty() {
            return None;
        }
        Some(shorten(&self.hash, 10, 8))
    }
}

// ==================== TOKEN ====================
#[derive(Debug, Clone, Serialize)]
pub struct AllowanceInfo {
    pub owner: String,
    pub spender: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractOverview {
    pub payment_contract: String,
    pub token_address: String,
    pub admin_address: String,
    pub total_deposited_native: String,
    pub token_balance: String,
    pub token_symbol: String,
    pub token_decimals: u8,
}

/// Token metadata plus the caller's balance, formatted with the token decimals.
#[derive(Debug, Clone, Serialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub total_supply: String,
    pub balance: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DepositBalances {
    pub contract_balance: String,
    pub user_deposit: Option<String>,
}

// ==================== API ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{CONTRACT_ADDRESSES, NETWORK};

    #[test]
    fn api_response_success_sets_flag() {
        let response = ApiResponse::success("ok");
        assert!(response.success);
        assert_eq!(response.data, "ok");
    }

    #[test]
    fn chain_id_hex_is_lowercase_prefixed() {
        assert_eq!(NETWORK.chain_id_hex(), "0x61");
    }

    #[test]
    fn add_chain_params_list_primary_rpc_first() {
        let params = NETWORK.add_chain_params();
        let urls = params["rpcUrls"].as_array().expect("rpcUrls array");
        assert_eq!(urls.len(), 4);
        assert_eq!(urls[0].as_str(), Some(NETWORK.rpc_url));
        assert_eq!(params["nativeCurrency"]["decimals"], 18);
        assert_eq!(params["blockExplorerUrls"][0], NETWORK.explorer_url);
    }

    #[test]
    fn contract_addresses_parse_and_render_lowercase() {
        let payment = CONTRACT_ADDRESSES.payment().expect("payment address");
        assert_eq!(
            address_to_string(&payment),
            CONTRACT_ADDRESSES.payment_contract.to_ascii_lowercase()
        );
        assert!(CONTRACT_ADDRESSES.token().is_ok());
        assert!(CONTRACT_ADDRESSES.admin().is_ok());
    }

    #[test]
    fn parse_address_rejects_garbage() {
        assert!(matches!(parse_address("0x123"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn short_forms_keep_head_and_tail() {
        assert_eq!(
            short_address("0x754cda8029484677f63016b979ed3107056ef008"),
            "0x754c...f008"
        );
        let status = TransactionStatus::success(
            "0xaaaaaaaabbbbbbbbccccccccddddddddeeeeeeeeffffffff0000000011111111",
            "done",
        );
        assert_eq!(status.short_hash().as_deref(), Some("0xaaaaaaaa...11111111"));
    }

    #[test]
    fn failed_status_has_no_hash() {
        let status = TransactionStatus::failed("Transaction failed");
        assert_eq!(status.status, TxState::Failed);
        assert!(status.hash.is_empty());
        assert!(status.short_hash().is_none());
        assert!(!status.is_pending());
    }

    #[test]
    fn tx_state_serializes_lowercase() {
        let json = serde_json::to_value(TxState::Pending).expect("serialize");
        assert_eq!(json, "pending");
    }
}
