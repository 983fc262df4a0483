use ethers::types::{Address, U256};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::{
    error::{AppError, Result, SwitchStep},
    integrations::provider::{ProviderError, WalletProvider},
    models::{address_to_string, parse_address, NetworkDescriptor, WalletInfo},
    utils::format_units,
};

type SharedHandshake = Shared<BoxFuture<'static, Result<WalletInfo>>>;

/// Provider handle plus the account it authorized; the signer for contract calls.
#[derive(Clone)]
pub struct WalletSession {
    pub provider: Arc<dyn WalletProvider>,
    pub account: Address,
}

/// Owns the connection to the injected wallet. Cheap to clone; clones share
/// the same session.
#[derive(Clone)]
pub struct WalletService {
    inner: Arc<WalletInner>,
}

struct WalletInner {
    provider: Option<Arc<dyn WalletProvider>>,
    network: NetworkDescriptor,
    session: RwLock<Option<WalletSession>>,
    in_flight: Mutex<Option<(u64, SharedHandshake)>>,
    next_attempt: AtomicU64,
    // Bumped on disconnect so a handshake started earlier cannot revive the session.
    epoch: AtomicU64,
}

impl WalletService {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, network: NetworkDescriptor) -> Self {
        Self {
            inner: Arc::new(WalletInner {
                provider,
                network,
                session: RwLock::new(None),
                in_flight: Mutex::new(None),
                next_attempt: AtomicU64::new(1),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn network(&self) -> &NetworkDescriptor {
        &self.inner.network
    }

    pub fn is_provider_present(&self) -> bool {
        self.inner.provider.is_some()
    }

    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> {
        self.inner.provider.clone()
    }

    pub async fn session(&self) -> Option<WalletSession> {
        self.inner.session.read().await.clone()
    }

    pub async fn account(&self) -> Option<Address> {
        self.inner.session.read().await.as_ref().map(|s| s.account)
    }

    /// Full handshake: account access, network assurance, native balance.
    /// Overlapping callers join the attempt already in flight.
    pub async fn connect(&self) -> Result<WalletInfo> {
        let (attempt, handshake) = {
            let mut slot = self.inner.in_flight.lock().await;
            match slot.as_ref() {
                Some((attempt, handshake)) => {
                    tracing::debug!("Joining in-flight wallet connection #{}", attempt);
                    (*attempt, handshake.clone())
                }
                None => {
                    let attempt = self.inner.next_attempt.fetch_add(1, Ordering::Relaxed);
                    let inner = self.inner.clone();
                    let handshake = async move { inner.handshake(attempt).await }
                        .boxed()
                        .shared();
                    *slot = Some((attempt, handshake.clone()));
                    (attempt, handshake)
                }
            }
        };

        let result = handshake.await;

        let mut slot = self.inner.in_flight.lock().await;
        if matches!(slot.as_ref(), Some((current, _)) if *current == attempt) {
            *slot = None;
        }
        result
    }

    /// Never fails: read errors are logged and reported as "0".
    pub async fn read_native_balance(&self, address: &Address) -> String {
        self.inner.read_native_balance(address).await
    }

    /// Local reset only; the wallet keeps whatever permissions it granted.
    pub async fn disconnect(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        // A handshake abandoned by its caller would otherwise be joined by the next connect.
        self.inner.in_flight.lock().await.take();
        let previous = self.inner.session.write().await.take();
        match previous {
            Some(session) => tracing::info!(
                "Wallet {} disconnected",
                address_to_string(&session.account)
            ),
            None => tracing::debug!("Disconnect requested without an active session"),
        }
    }

    /// Current wallet info, or `None` when nothing is connected.
    pub async fn wallet_info(&self) -> Option<WalletInfo> {
        let account = self.account().await?;
        let balance = self.read_native_balance(&account).await;
        Some(WalletInfo::connected(&account, balance))
    }
}

impl WalletInner {
    fn require_provider(&self) -> Result<Arc<dyn WalletProvider>> {
        self.provider.clone().ok_or(AppError::ProviderMissing)
    }

    async fn handshake(self: Arc<Self>, attempt: u64) -> Result<WalletInfo> {
        let epoch = self.epoch.load(Ordering::SeqCst);
        let provider = self.require_provider()?;
        tracing::info!("Wallet connection #{} via {}", attempt, provider.name());

        let account = self.request_account().await?;
        ensure_network(provider.as_ref(), &self.network).await?;
        let balance = self.read_native_balance(&account).await;

        let mut session = self.session.write().await;
        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::warn!("Wallet connection #{} superseded by disconnect", attempt);
            return Err(AppError::NotConnected);
        }
        *session = Some(WalletSession {
            provider,
            account,
        });
        drop(session);
        tracing::info!(
            "Wallet connected: {} on chain {}",
            address_to_string(&account),
            self.network.chain_id
        );
        Ok(WalletInfo::connected(&account, balance))
    }

    /// First account the wallet authorizes.
    async fn request_account(&self) -> Result<Address> {
        let provider = self.require_provider()?;
        let accounts = provider
            .request("eth_requestAccounts", serde_json::json!([]))
            .await?;
        let accounts: Vec<String> = serde_json::from_value(accounts)
            .map_err(|e| AppError::Internal(format!("Malformed account list: {}", e)))?;
        let first = accounts.first().ok_or(AppError::NoAccount)?;
        parse_address(first)
    }

    async fn read_native_balance(&self, address: &Address) -> String {
        let Some(provider) = self.provider.as_ref() else {
            tracing::warn!("Balance read skipped: no wallet provider");
            return "0".to_string();
        };
        match fetch_native_balance(provider.as_ref(), address, &self.network).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(
                    "Error fetching balance for {}: {}",
                    address_to_string(address),
                    e
                );
                "0".to_string()
            }
        }
    }
}

async fn fetch_native_balance(
    provider: &dyn WalletProvider,
    address: &Address,
    network: &NetworkDescriptor,
) -> Result<String> {
    let raw = provider
        .request(
            "eth_getBalance",
            serde_json::json!([address_to_string(address), "latest"]),
        )
        .await?;
    let wei: U256 = serde_json::from_value(raw)
        .map_err(|e| AppError::Internal(format!("Malformed balance: {}", e)))?;
    format_units(wei, network.native_currency.decimals)
}

/// Switch-then-add-then-switch. Wallets cannot add and switch atomically, so
/// an unknown chain on the first switch is recoverable.
pub async fn ensure_network(
    provider: &dyn WalletProvider,
    descriptor: &NetworkDescriptor,
) -> Result<()> {
    let active = provider.request("eth_chainId", serde_json::json!([])).await?;
    let active = parse_chain_id(&active)?;
    if active == descriptor.chain_id {
        tracing::debug!("Wallet already on chain {}", active);
        return Ok(());
    }

    tracing::info!(
        "Switching wallet from chain {} to {} ({})",
        active,
        descriptor.chain_id,
        descriptor.chain_name
    );

    let err = match switch_chain(provider, descriptor).await {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };

    match AppError::from(err.clone()) {
        AppError::UnrecognizedChain(_) => {
            tracing::warn!(
                "Wallet does not know chain {}; requesting add",
                descriptor.chain_id
            );
            provider
                .request(
                    "wallet_addEthereumChain",
                    serde_json::json!([descriptor.add_chain_params()]),
                )
                .await
                .map_err(|e| rejected_as(e, SwitchStep::AddChain))?;
            switch_chain(provider, descriptor)
                .await
                .map_err(|e| rejected_as(e, SwitchStep::Switch))
        }
        _ => Err(rejected_as(err, SwitchStep::Switch)),
    }
}

async fn switch_chain(
    provider: &dyn WalletProvider,
    descriptor: &NetworkDescriptor,
) -> std::result::Result<(), ProviderError> {
    provider
        .request(
            "wallet_switchEthereumChain",
            serde_json::json!([{ "chainId": descriptor.chain_id_hex() }]),
        )
        .await
        .map(|_| ())
}

fn rejected_as(err: ProviderError, step: SwitchStep) -> AppError {
    let classified = AppError::from(err);
    if classified.is_user_rejection() {
        AppError::NetworkSwitchRejected(step)
    } else {
        classified
    }
}

fn parse_chain_id(value: &serde_json::Value) -> Result<u64> {
    let parsed = match value {
        serde_json::Value::String(text) => {
            let text = text.trim();
            match text.strip_prefix("0x") {
                Some(hex) => u64::from_str_radix(hex, 16).ok(),
                None => text.parse().ok(),
            }
        }
        serde_json::Value::Number(number) => number.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::Internal(format!("Malformed chain id: {}", value)))
}
