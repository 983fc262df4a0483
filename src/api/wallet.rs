use axum::{extract::State, Json};

use super::AppState;
use crate::{error::Result, models::ApiResponse, models::WalletInfo};

/// POST /api/v1/wallet/connect
pub async fn connect_wallet(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<WalletInfo>>> {
    let info = state.page.connect().await?;
    Ok(Json(ApiResponse::success(info)))
}

/// POST /api/v1/wallet/disconnect
pub async fn disconnect_wallet(State(state): State<AppState>) -> Json<ApiResponse<bool>> {
    state.page.disconnect().await;
    Json(ApiResponse::success(true))
}

/// GET /api/v1/wallet/info
///
/// `data` is null while no wallet is connected.
pub async fn get_wallet_info(
    State(state): State<AppState>,
) -> Json<ApiResponse<Option<WalletInfo>>> {
    Json(ApiResponse::success(state.wallet.wallet_info().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;
    use crate::error::AppError;
    use crate::integrations::mock_provider::MockWalletProvider;
    use std::sync::Arc;

    const ACCOUNT: &str = "0x5555555555555555555555555555555555555555";

    #[tokio::test]
    async fn connect_then_disconnect_round_trip() {
        let provider = Arc::new(MockWalletProvider::new(|method, _| match method {
            "eth_requestAccounts" => Ok(serde_json::json!([ACCOUNT])),
            "eth_chainId" => Ok(serde_json::json!("0x61")),
            "eth_getBalance" => Ok(serde_json::json!("0x6f05b59d3b20000")),
            _ => Ok(serde_json::json!("0x")),
        }));
        let state = state_with(Some(provider));

        let Json(connected) = connect_wallet(State(state.clone())).await.expect("connect");
        assert_eq!(connected.data.address, ACCOUNT);
        assert_eq!(connected.data.balance, "0.5");

        let Json(info) = get_wallet_info(State(state.clone())).await;
        assert!(info.data.is_some());

        disconnect_wallet(State(state.clone())).await;
        let Json(info) = get_wallet_info(State(state)).await;
        assert!(info.data.is_none());
    }

    #[tokio::test]
    async fn connect_without_provider_fails() {
        let err = connect_wallet(State(state_with(None))).await.expect_err("missing");
        assert_eq!(err, AppError::ProviderMissing);
    }
}
