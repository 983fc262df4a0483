// src/api/mod.rs

pub mod admin;
pub mod contract;
pub mod health;
pub mod page;
pub mod transactions;
pub mod wallet;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{PageController, TransactionService, WalletService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub wallet: WalletService,
    pub transactions: TransactionService,
    pub page: PageController,
}

impl AppState {
    pub fn new(config: Config, wallet: WalletService, transactions: TransactionService) -> Self {
        let page = PageController::new(
            wallet.clone(),
            transactions.clone(),
            config.alert_timing(),
        );
        Self {
            config: Arc::new(config),
            wallet,
            transactions,
            page,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::constants::{CONTRACT_ADDRESSES, NETWORK};
    use crate::integrations::mock_provider::MockWalletProvider;
    use crate::integrations::provider::WalletProvider;
    use crate::services::ContractRegistry;
    use std::time::Duration;

    pub fn state_with(provider: Option<Arc<MockWalletProvider>>) -> AppState {
        let mut config = Config::from_lookup(|_| None).expect("config");
        config.tx_poll_interval_ms = 10;
        let wallet = WalletService::new(provider.map(|p| p as Arc<dyn WalletProvider>), NETWORK);
        let registry = Arc::new(ContractRegistry::new(&CONTRACT_ADDRESSES).expect("registry"));
        let mut policy = config.confirmation_policy();
        policy.timeout = Duration::from_secs(5);
        let transactions = TransactionService::new(wallet.clone(), registry, policy);
        AppState::new(config, wallet, transactions)
    }
}
