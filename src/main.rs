use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod integrations;
mod models;
mod services;
mod utils;
mod websocket;

use config::Config;
use constants::{API_VERSION, CONTRACT_ADDRESSES, NETWORK};
use integrations::{HttpWalletProvider, WalletProvider};
use services::{ContractRegistry, TransactionService, WalletService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinguard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting CoinGuard wallet service");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);
    tracing::info!(
        "Target network: {} (chain {}) via {}",
        NETWORK.chain_name,
        NETWORK.chain_id,
        NETWORK.rpc_url
    );

    // Wallet provider is optional; without one the page shows the missing-wallet banner
    let provider: Option<Arc<dyn WalletProvider>> = match &config.wallet_provider_url {
        Some(url) => HttpWalletProvider::detect(url, config.wallet_request_timeout())
            .await
            .map(|p| Arc::new(p) as Arc<dyn WalletProvider>),
        None => None,
    };

    let wallet = WalletService::new(provider, NETWORK);
    let registry = Arc::new(ContractRegistry::new(&CONTRACT_ADDRESSES)?);
    let transactions = TransactionService::new(
        wallet.clone(),
        registry,
        config.confirmation_policy(),
    );
    let app_state = api::AppState::new(config.clone(), wallet, transactions);
    app_state.page.detect_wallet();

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    if config.is_development() {
        tracing::debug!("Development mode; CORS origins: {}", config.cors_allowed_origins);
    }

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Page
        .route("/api/v1/page", get(api::page::get_page))
        .route("/api/v1/page/check", post(api::page::check))
        .route("/api/v1/page/modal/open", post(api::page::open_modal))
        .route("/api/v1/page/modal/close", post(api::page::close_modal))
        .route(
            "/api/v1/page/alerts/{kind}/dismiss",
            post(api::page::dismiss_alert),
        )
        // Wallet
        .route("/api/v1/wallet/connect", post(api::wallet::connect_wallet))
        .route(
            "/api/v1/wallet/disconnect",
            post(api::wallet::disconnect_wallet),
        )
        .route("/api/v1/wallet/info", get(api::wallet::get_wallet_info))
        // Transactions
        .route(
            "/api/v1/transactions/approve",
            post(api::transactions::approve_full_balance),
        )
        .route(
            "/api/v1/transactions/transfer",
            post(api::transactions::transfer),
        )
        .route(
            "/api/v1/transactions/deposit",
            post(api::transactions::deposit),
        )
        .route(
            "/api/v1/transactions/withdraw",
            post(api::transactions::withdraw),
        )
        .route(
            "/api/v1/transactions/status",
            get(api::transactions::get_status),
        )
        .route(
            "/api/v1/transactions/dismiss",
            post(api::transactions::dismiss_status),
        )
        // Contract
        .route("/api/v1/contract/info", get(api::contract::get_contract_info))
        .route(
            "/api/v1/contract/allowance",
            get(api::contract::get_allowance),
        )
        .route("/api/v1/contract/token", get(api::contract::get_token_info))
        .route("/api/v1/contract/deposits", get(api::contract::get_deposits))
        // Admin
        .route("/api/v1/admin/charge-token", post(api::admin::charge_token))
        .route("/api/v1/admin/charge-native", post(api::admin::charge_native))
        .route(
            "/api/v1/admin/transfer-admin",
            post(api::admin::transfer_admin),
        )
        .route("/api/v1/admin/recover-token", post(api::admin::recover_token))
        .route("/api/v1/admin/update-token", post(api::admin::update_token))
        // WebSocket endpoints
        .route("/ws/page", get(websocket::page::handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
