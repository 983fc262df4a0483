use ethers::abi::{parse_abi, Abi, Detokenize, Tokenize};
use ethers::contract::BaseContract;
use ethers::types::{Address, Bytes, H256, U256, U64};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    constants::{PAYMENT_CONTRACT_ABI, USDT_TOKEN_ABI},
    error::{AppError, Result},
    integrations::provider::WalletProvider,
    models::{address_to_string, ContractAddresses},
    services::wallet_service::WalletService,
};

/// How long and how often to poll for a receipt.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

/// Subset of the receipt the orchestration needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSummary {
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
}

/// A submitted transaction awaiting confirmation.
pub struct PendingTransaction {
    hash: H256,
    provider: Arc<dyn WalletProvider>,
}

impl PendingTransaction {
    pub fn hash_hex(&self) -> String {
        format!("{:?}", self.hash)
    }

    /// Polls until the receipt appears. A zero status means the call reverted.
    pub async fn wait(&self, policy: ConfirmationPolicy) -> Result<ReceiptSummary> {
        let deadline = tokio::time::Instant::now() + policy.timeout;
        loop {
            let raw = self
                .provider
                .request(
                    "eth_getTransactionReceipt",
                    serde_json::json!([self.hash_hex()]),
                )
                .await?;

            if !raw.is_null() {
                let receipt: ReceiptSummary = serde_json::from_value(raw)
                    .map_err(|e| AppError::Internal(format!("Malformed receipt: {}", e)))?;
                if receipt.status == Some(U64::zero()) {
                    return Err(AppError::ExecutionReverted(format!(
                        "transaction {} reverted",
                        self.hash_hex()
                    )));
                }
                tracing::debug!(
                    "Transaction {} confirmed in block {:?} (gas used {:?})",
                    self.hash_hex(),
                    receipt.block_number,
                    receipt.gas_used
                );
                return Ok(receipt);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::ConfirmationTimeout(self.hash_hex()));
            }
            tokio::time::sleep(policy.poll_interval).await;
        }
    }
}

/// Callable contract bound to a provider and, when connected, a signer.
pub struct ContractHandle {
    address: Address,
    abi: BaseContract,
    provider: Arc<dyn WalletProvider>,
    from: Option<Address>,
}

impl ContractHandle {
    pub async fn call<T: Tokenize, D: Detokenize>(&self, method: &str, args: T) -> Result<D> {
        let data = self.encode(method, args)?;
        let mut request = serde_json::json!({
            "to": address_to_string(&self.address),
            "data": data,
        });
        if let Some(from) = self.from {
            request["from"] = serde_json::json!(address_to_string(&from));
        }

        let raw = self
            .provider
            .request("eth_call", serde_json::json!([request, "latest"]))
            .await?;
        let output: Bytes = serde_json::from_value(raw)
            .map_err(|e| AppError::Internal(format!("Malformed {} output: {}", method, e)))?;
        self.abi
            .decode_output(method, output)
            .map_err(|e| AppError::Internal(format!("Failed to decode {}: {}", method, e)))
    }

    /// Asks the wallet to sign and broadcast; returns as soon as a hash exists.
    pub async fn send<T: Tokenize>(
        &self,
        method: &str,
        args: T,
        value: Option<U256>,
    ) -> Result<PendingTransaction> {
        let from = self.from.ok_or(AppError::NotConnected)?;
        let data = self.encode(method, args)?;
        let mut tx = serde_json::json!({
            "from": address_to_string(&from),
            "to": address_to_string(&self.address),
            "data": data,
        });
        if let Some(value) = value {
            tx["value"] = serde_json::json!(value);
        }

        tracing::info!(
            "Submitting {} to {} from {}",
            method,
            address_to_string(&self.address),
            address_to_string(&from)
        );
        let raw = self
            .provider
            .request("eth_sendTransaction", serde_json::json!([tx]))
            .await?;
        let hash: H256 = serde_json::from_value(raw)
            .map_err(|e| AppError::Internal(format!("Malformed transaction hash: {}", e)))?;

        Ok(PendingTransaction {
            hash,
            provider: self.provider.clone(),
        })
    }

    fn encode<T: Tokenize>(&self, method: &str, args: T) -> Result<Bytes> {
        self.abi
            .encode(method, args)
            .map_err(|e| AppError::Internal(format!("Failed to encode {}: {}", method, e)))
    }
}

/// Static addresses and minimal ABIs of the payment and token contracts.
pub struct ContractRegistry {
    payment: Address,
    token: Address,
    payment_abi: Abi,
    token_abi: Abi,
}

impl ContractRegistry {
    pub fn new(addresses: &ContractAddresses) -> Result<Self> {
        Ok(Self {
            payment: addresses.payment()?,
            token: addresses.token()?,
            payment_abi: load_abi(PAYMENT_CONTRACT_ABI)?,
            token_abi: load_abi(USDT_TOKEN_ABI)?,
        })
    }

    pub fn payment_address(&self) -> Address {
        self.payment
    }

    /// `None` when no provider is available; callers must check.
    pub fn bind(
        &self,
        address: Address,
        abi: &Abi,
        provider: Option<Arc<dyn WalletProvider>>,
        signer: Option<Address>,
    ) -> Option<ContractHandle> {
        let provider = provider?;
        Some(ContractHandle {
            address,
            abi: BaseContract::from(abi.clone()),
            provider,
            from: signer,
        })
    }

    /// Uses the connected session as signer, else the bare provider for reads.
    pub async fn payment_contract(&self, wallet: &WalletService) -> Option<PaymentContract> {
        let (provider, signer) = signer_or_provider(wallet).await;
        self.bind(self.payment, &self.payment_abi, provider, signer)
            .map(PaymentContract)
    }

    pub async fn token_contract(&self, wallet: &WalletService) -> Option<TokenContract> {
        let (provider, signer) = signer_or_provider(wallet).await;
        self.bind(self.token, &self.token_abi, provider, signer)
            .map(TokenContract)
    }
}

async fn signer_or_provider(
    wallet: &WalletService,
) -> (Option<Arc<dyn WalletProvider>>, Option<Address>) {
    match wallet.session().await {
        Some(session) => (Some(session.provider), Some(session.account)),
        None => (wallet.provider(), None),
    }
}

fn load_abi(fragments: &[&str]) -> Result<Abi> {
    parse_abi(fragments).map_err(|e| AppError::Internal(format!("Invalid ABI fragment: {}", e)))
}

/// Payment/escrow contract holding native deposits and charging tokens.
pub struct PaymentContract(ContractHandle);

impl PaymentContract {
    pub async fn admin(&self) -> Result<Address> {
        self.0.call("getAdmin", ()).await
    }

    pub async fn token_address(&self) -> Result<Address> {
        self.0.call("getUSDTToken", ()).await
    }

    pub async fn total_deposited_native(&self) -> Result<U256> {
        self.0.call("getTotalDepositedBNB", ()).await
    }

    pub async fn user_native_balance(&self, user: Address) -> Result<U256> {
        self.0.call("getUserBNBBalance", user).await
    }

    pub async fn contract_balance(&self) -> Result<U256> {
        self.0.call("getContractBalance", ()).await
    }

    pub async fn deposit(&self, value: U256) -> Result<PendingTransaction> {
        self.0.send("depositBNB", (), Some(value)).await
    }

    pub async fn withdraw(&self, amount: U256) -> Result<PendingTransaction> {
        self.0.send("withdrawBNB", amount, None).await
    }

    pub async fn charge_token(&self, user: Address, amount: U256) -> Result<PendingTransaction> {
        self.0.send("chargeUSDT", (user, amount), None).await
    }

    pub async fn charge_native(&self, user: Address, amount: U256) -> Result<PendingTransaction> {
        self.0.send("chargeBNB", (user, amount), None).await
    }

    pub async fn update_token(&self, token: Address) -> Result<PendingTransaction> {
        self.0.send("updateUSDTToken", token, None).await
    }

    pub async fn transfer_admin(&self, new_admin: Address) -> Result<PendingTransaction> {
        self.0.send("transferAdmin", new_admin, None).await
    }

    pub async fn recover_token(&self, token: Address, amount: U256) -> Result<PendingTransaction> {
        self.0.send("recoverToken", (token, amount), None).await
    }
}

/// ERC-20 surface of the stablecoin. Amounts are raw units; format them with
/// `decimals()`, never with the native 18.
pub struct TokenContract(ContractHandle);

impl TokenContract {
    pub async fn name(&self) -> Result<String> {
        self.0.call("name", ()).await
    }

    pub async fn symbol(&self) -> Result<String> {
        self.0.call("symbol", ()).await
    }

    pub async fn decimals(&self) -> Result<u8> {
        self.0.call("decimals", ()).await
    }

    pub async fn total_supply(&self) -> Result<U256> {
        self.0.call("totalSupply", ()).await
    }

    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        self.0.call("balanceOf", account).await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.0.call("allowance", (owner, spender)).await
    }

    pub async fn approve(&self, spender: Address, amount: U256) -> Result<PendingTransaction> {
        self.0.send("approve", (spender, amount), None).await
    }

    pub async fn transfer(&self, to: Address, amount: U256) -> Result<PendingTransaction> {
        self.0.send("transfer", (to, amount), None).await
    }
}
