use ethers::types::Address;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

use crate::{
    constants::USDT_DECIMALS_FALLBACK,
    error::{AppError, Result},
    models::{
        address_to_string, parse_address, AllowanceInfo, ContractOverview, DepositBalances,
        TokenInfo, TransactionStatus,
    },
    services::contracts::{
        ConfirmationPolicy, ContractRegistry, PaymentContract, PendingTransaction, TokenContract,
    },
    services::wallet_service::WalletService,
    utils::{format_units, parse_positive_amount},
};

const NATIVE_DECIMALS: u8 = 18;

/// User-visible actions that end up as a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxAction {
    ApproveFullBalance,
    Transfer,
    Deposit,
    Withdraw,
    ChargeToken,
    ChargeNative,
    TransferAdmin,
    RecoverToken,
    UpdateToken,
}

impl TxAction {
    pub fn pending_message(&self) -> &'static str {
        match self {
            TxAction::ApproveFullBalance => "Approving USDT...",
            TxAction::Transfer => "Transferring USDT...",
            TxAction::Deposit => "Depositing BNB...",
            TxAction::Withdraw => "Withdrawing BNB...",
            TxAction::ChargeToken => "Charging USDT...",
            TxAction::ChargeNative => "Charging BNB...",
            TxAction::TransferAdmin => "Transferring admin rights...",
            TxAction::RecoverToken => "Recovering tokens...",
            TxAction::UpdateToken => "Updating token address...",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            TxAction::ApproveFullBalance => "Full USDT balance approved successfully!",
            TxAction::Transfer => "USDT transferred successfully!",
            TxAction::Deposit => "BNB deposited successfully!",
            TxAction::Withdraw => "BNB withdrawn successfully!",
            TxAction::ChargeToken => "USDT charged successfully!",
            TxAction::ChargeNative => "BNB charged successfully!",
            TxAction::TransferAdmin => "Admin transferred successfully!",
            TxAction::RecoverToken => "Tokens recovered successfully!",
            TxAction::UpdateToken => "Token address updated successfully!",
        }
    }
}

/// Result of the approve-full-balance flow.
#[derive(Debug, Clone)]
pub enum ApproveOutcome {
    /// Zero token balance; nothing was submitted.
    NoBalance,
    /// Terminal status of the attempt, success or failure.
    Settled(TransactionStatus),
}

/// Runs contract actions one at a time and keeps the single shared status slot.
#[derive(Clone)]
pub struct TransactionService {
    wallet: WalletService,
    registry: Arc<ContractRegistry>,
    policy: ConfirmationPolicy,
    status: Arc<watch::Sender<Option<TransactionStatus>>>,
    busy: Arc<Mutex<()>>,
}

impl TransactionService {
    pub fn new(
        wallet: WalletService,
        registry: Arc<ContractRegistry>,
        policy: ConfirmationPolicy,
    ) -> Self {
        let (status, _) = watch::channel(None);
        Self {
            wallet,
            registry,
            policy,
            status: Arc::new(status),
            busy: Arc::new(Mutex::new(())),
        }
    }

    pub fn status(&self) -> Option<TransactionStatus> {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<TransactionStatus>> {
        self.status.subscribe()
    }

    /// Clears a finished status. A pending one stays until it settles.
    pub fn dismiss_status(&self) -> bool {
        self.status.send_if_modified(|slot| match slot {
            Some(status) if !status.is_pending() => {
                *slot = None;
                true
            }
            _ => false,
        })
    }

    /// Drops the status unconditionally, used when the session goes away.
    pub fn clear_status(&self) {
        self.set_status(None);
    }

    /// Approves the payment contract for the caller's entire token balance.
    pub async fn approve_full_balance(&self) -> Result<ApproveOutcome> {
        let owner = self.require_account().await?;
        let _guard = self.busy.try_lock().map_err(|_| AppError::TransactionInFlight)?;
        self.set_status(None);

        let token = self.token().await?;
        let balance = match token.balance_of(owner).await {
            Ok(balance) => balance,
            Err(e) => return Ok(ApproveOutcome::Settled(self.fail(TxAction::ApproveFullBalance, e))),
        };
        if balance.is_zero() {
            tracing::info!("No USDT balance to approve for {}", address_to_string(&owner));
            return Ok(ApproveOutcome::NoBalance);
        }

        let spender = self.registry.payment_address();
        tracing::info!(
            "Approving {} raw USDT units for {}",
            balance,
            address_to_string(&spender)
        );
        let status = self
            .track(TxAction::ApproveFullBalance, token.approve(spender, balance))
            .await;
        Ok(ApproveOutcome::Settled(status))
    }

    /// Sends tokens to `recipient`, scaling `amount` by the token's own decimals.
    pub async fn transfer(&self, recipient: &str, amount: &str) -> Result<TransactionStatus> {
        let to = parse_address(recipient.trim()).map_err(|_| invalid_transfer())?;
        self.require_account().await?;
        let _guard = self.busy.try_lock().map_err(|_| AppError::TransactionInFlight)?;

        let token = self.token().await?;
        let decimals = self.token_decimals(&token).await;
        let value = parse_positive_amount(amount, decimals).map_err(|_| invalid_transfer())?;
        self.set_status(None);
        Ok(self.track(TxAction::Transfer, token.transfer(to, value)).await)
    }

    pub async fn deposit(&self, amount: &str) -> Result<TransactionStatus> {
        let value = parse_positive_amount(amount, NATIVE_DECIMALS)?;
        self.run_payment(TxAction::Deposit, |payment| async move {
            payment.deposit(value).await
        })
        .await
    }

    pub async fn withdraw(&self, amount: &str) -> Result<TransactionStatus> {
        let value = parse_positive_amount(amount, NATIVE_DECIMALS)?;
        self.run_payment(TxAction::Withdraw, |payment| async move {
            payment.withdraw(value).await
        })
        .await
    }

    pub async fn charge_token(&self, user: &str, amount: &str) -> Result<TransactionStatus> {
        let user = parse_address(user.trim())?;
        let token = self.token().await?;
        let decimals = self.token_decimals(&token).await;
        let value = parse_positive_amount(amount, decimals)?;
        self.run_payment(TxAction::ChargeToken, |payment| async move {
            payment.charge_token(user, value).await
        })
        .await
    }

    pub async fn charge_native(&self, user: &str, amount: &str) -> Result<TransactionStatus> {
        let user = parse_address(user.trim())?;
        let value = parse_positive_amount(amount, NATIVE_DECIMALS)?;
        self.run_payment(TxAction::ChargeNative, |payment| async move {
            payment.charge_native(user, value).await
        })
        .await
    }

    pub async fn transfer_admin(&self, new_admin: &str) -> Result<TransactionStatus> {
        let new_admin = parse_address(new_admin.trim())?;
        self.run_payment(TxAction::TransferAdmin, |payment| async move {
            payment.transfer_admin(new_admin).await
        })
        .await
    }

    /// `amount` is in raw units since the stray token's decimals are unknown.
    pub async fn recover_token(&self, token: &str, amount: &str) -> Result<TransactionStatus> {
        let token = parse_address(token.trim())?;
        let value = parse_positive_amount(amount, 0)?;
        self.run_payment(TxAction::RecoverToken, |payment| async move {
            payment.recover_token(token, value).await
        })
        .await
    }

    pub async fn update_token(&self, token: &str) -> Result<TransactionStatus> {
        let token = parse_address(token.trim())?;
        self.run_payment(TxAction::UpdateToken, |payment| async move {
            payment.update_token(token).await
        })
        .await
    }

    /// Display read of the token balance; failures log and show "0".
    pub async fn token_balance(&self, owner: &Address) -> String {
        match self.read_token_balance(owner).await {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!(
                    "Error loading USDT balance for {}: {}",
                    address_to_string(owner),
                    e
                );
                "0".to_string()
            }
        }
    }

    async fn read_token_balance(&self, owner: &Address) -> Result<String> {
        let token = self.token().await?;
        let (raw, decimals) = tokio::try_join!(token.balance_of(*owner), token.decimals())?;
        format_units(raw, decimals)
    }

    pub async fn allowance(&self) -> Result<AllowanceInfo> {
        let owner = self.require_account().await?;
        let token = self.token().await?;
        let spender = self.registry.payment_address();
        let (raw, decimals) = tokio::try_join!(token.allowance(owner, spender), token.decimals())?;
        Ok(AllowanceInfo {
            owner: address_to_string(&owner),
            spender: address_to_string(&spender),
            amount: format_units(raw, decimals)?,
        })
    }

    /// Token metadata; the balance is the connected account's, or "0".
    pub async fn token_info(&self) -> Result<TokenInfo> {
        let token = self.token().await?;
        let (symbol, name, decimals, total_supply) = tokio::try_join!(
            token.symbol(),
            token.name(),
            token.decimals(),
            token.total_supply(),
        )?;
        let balance = match self.wallet.account().await {
            Some(owner) => format_units(token.balance_of(owner).await?, decimals)?,
            None => "0".to_string(),
        };
        Ok(TokenInfo {
            symbol,
            name,
            decimals,
            total_supply: format_units(total_supply, decimals)?,
            balance,
        })
    }

    /// Native currency held by the payment contract and, when connected,
    /// the caller's own deposit.
    pub async fn deposit_balances(&self) -> Result<DepositBalances> {
        let payment = self.payment().await?;
        let contract_balance = format_units(payment.contract_balance().await?, NATIVE_DECIMALS)?;
        let user_deposit = match self.wallet.account().await {
            Some(user) => Some(format_units(
                payment.user_native_balance(user).await?,
                NATIVE_DECIMALS,
            )?),
            None => None,
        };
        Ok(DepositBalances {
            contract_balance,
            user_deposit,
        })
    }

    /// Reads the payment contract panel concurrently.
    pub async fn contract_overview(&self) -> Result<ContractOverview> {
        let payment = self.payment().await?;
        let token = self.token().await?;
        let payment_address = self.registry.payment_address();

        let (total_deposited, admin, token_address, token_balance, symbol, decimals) = tokio::try_join!(
            payment.total_deposited_native(),
            payment.admin(),
            payment.token_address(),
            token.balance_of(payment_address),
            token.symbol(),
            token.decimals(),
        )?;

        Ok(ContractOverview {
            payment_contract: address_to_string(&payment_address),
            token_address: address_to_string(&token_address),
            admin_address: address_to_string(&admin),
            total_deposited_native: format_units(total_deposited, NATIVE_DECIMALS)?,
            token_balance: format_units(token_balance, decimals)?,
            token_symbol: symbol,
            token_decimals: decimals,
        })
    }

    /// Fails unless the connected account is the payment contract's admin.
    pub async fn require_admin(&self) -> Result<Address> {
        let account = self.require_account().await?;
        let admin = self.payment().await?.admin().await?;
        if admin != account {
            tracing::warn!(
                "Admin action refused for {} (admin is {})",
                address_to_string(&account),
                address_to_string(&admin)
            );
            return Err(AppError::BadRequest(
                "Only the contract admin can perform this action".to_string(),
            ));
        }
        Ok(account)
    }

    async fn run_payment<F, Fut>(&self, action: TxAction, submit: F) -> Result<TransactionStatus>
    where
        F: FnOnce(PaymentContract) -> Fut,
        Fut: Future<Output = Result<PendingTransaction>>,
    {
        self.require_account().await?;
        let _guard = self.busy.try_lock().map_err(|_| AppError::TransactionInFlight)?;
        let payment = self.payment().await?;
        self.set_status(None);
        Ok(self.track(action, submit(payment)).await)
    }

    /// Submission yields `pending` with the hash; confirmation yields `success`.
    /// Any failure lands in the slot as `failed` with the classified message.
    async fn track<Fut>(&self, action: TxAction, submission: Fut) -> TransactionStatus
    where
        Fut: Future<Output = Result<PendingTransaction>>,
    {
        let pending = match submission.await {
            Ok(pending) => pending,
            Err(e) => return self.fail(action, e),
        };

        let hash = pending.hash_hex();
        tracing::info!("{:?} submitted: {}", action, hash);
        self.set_status(Some(TransactionStatus::pending(
            hash.clone(),
            action.pending_message(),
        )));

        match pending.wait(self.policy).await {
            Ok(_) => {
                let status = TransactionStatus::success(hash, action.success_message());
                self.set_status(Some(status.clone()));
                status
            }
            Err(e) => self.fail(action, e),
        }
    }

    fn fail(&self, action: TxAction, err: AppError) -> TransactionStatus {
        tracing::error!("{:?} failed: {}", action, err);
        let status = TransactionStatus::failed(err.user_message());
        self.set_status(Some(status.clone()));
        status
    }

    fn set_status(&self, status: Option<TransactionStatus>) {
        self.status.send_replace(status);
    }

    async fn require_account(&self) -> Result<Address> {
        self.wallet.account().await.ok_or(AppError::NotConnected)
    }

    async fn payment(&self) -> Result<PaymentContract> {
        self.registry
            .payment_contract(&self.wallet)
            .await
            .ok_or(AppError::ContractUnavailable)
    }

    async fn token(&self) -> Result<TokenContract> {
        self.registry
            .token_contract(&self.wallet)
            .await
            .ok_or(AppError::ContractUnavailable)
    }

    async fn token_decimals(&self, token: &TokenContract) -> u8 {
        match token.decimals().await {
            Ok(decimals) => decimals,
            Err(e) => {
                tracing::warn!(
                    "Token decimals unavailable ({}); assuming {}",
                    e,
                    USDT_DECIMALS_FALLBACK
                );
                USDT_DECIMALS_FALLBACK
            }
        }
    }
}

fn invalid_transfer() -> AppError {
    AppError::BadRequest("Please enter valid amount and recipient address".to_string())
}
