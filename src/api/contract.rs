use axum::{extract::State, Json};

use super::AppState;
use crate::{
    error::Result,
    models::{AllowanceInfo, ApiResponse, ContractOverview, DepositBalances, TokenInfo},
};

/// GET /api/v1/contract/info
pub async fn get_contract_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ContractOverview>>> {
    let overview = state.transactions.contract_overview().await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// GET /api/v1/contract/allowance
pub async fn get_allowance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AllowanceInfo>>> {
    let allowance = state.transactions.allowance().await?;
    Ok(Json(ApiResponse::success(allowance)))
}

/// GET /api/v1/contract/token
pub async fn get_token_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<TokenInfo>>> {
    let info = state.transactions.token_info().await?;
    Ok(Json(ApiResponse::success(info)))
}

/// GET /api/v1/contract/deposits
pub async fn get_deposits(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DepositBalances>>> {
    let balances = state.transactions.deposit_balances().await?;
    Ok(Json(ApiResponse::success(balances)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;
    use crate::error::AppError;

    #[tokio::test]
    async fn info_without_provider_is_unavailable() {
        let err = get_contract_info(State(state_with(None)))
            .await
            .expect_err("no provider");
        assert_eq!(err, AppError::ContractUnavailable);

        let err = get_allowance(State(state_with(None))).await.expect_err("no wallet");
        assert_eq!(err, AppError::NotConnected);

        let err = get_token_info(State(state_with(None))).await.expect_err("no provider");
        assert_eq!(err, AppError::ContractUnavailable);
        let err = get_deposits(State(state_with(None))).await.expect_err("no provider");
        assert_eq!(err, AppError::ContractUnavailable);
    }
}
