use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub chain_id: u64,
    pub wallet_provider: String,
    pub wallet: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let wallet_provider = if state.wallet.is_provider_present() {
        "detected".to_string()
    } else {
        "missing".to_string()
    };

    let wallet = if state.wallet.account().await.is_some() {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.wallet.network().chain_id,
        wallet_provider,
        wallet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;

    #[tokio::test]
    async fn reports_missing_provider() {
        let Json(health) = health_check(State(state_with(None))).await;
        assert_eq!(health.status, "ok");
        assert_eq!(health.chain_id, 97);
        assert_eq!(health.wallet_provider, "missing");
        assert_eq!(health.wallet, "disconnected");
    }
}
