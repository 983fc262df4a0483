use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, TransactionStatus},
    services::ApproveOutcome,
};

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub recipient: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApproveResponse {
    NoBalance,
    Settled { transaction: TransactionStatus },
}

impl From<ApproveOutcome> for ApproveResponse {
    fn from(outcome: ApproveOutcome) -> Self {
        match outcome {
            ApproveOutcome::NoBalance => ApproveResponse::NoBalance,
            ApproveOutcome::Settled(transaction) => ApproveResponse::Settled { transaction },
        }
    }
}

/// POST /api/v1/transactions/approve
///
/// Always approves the full token balance; there is no amount input.
pub async fn approve_full_balance(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ApproveResponse>>> {
    let outcome = state.page.approve().await?;
    Ok(Json(ApiResponse::success(outcome.into())))
}

/// POST /api/v1/transactions/transfer
pub async fn transfer(
    State(state): State<AppState>,
    Json(req): Json<TransferRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    let status = state.transactions.transfer(&req.recipient, &req.amount).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/transactions/deposit
pub async fn deposit(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    let status = state.transactions.deposit(&req.amount).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/transactions/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    Json(req): Json<AmountRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    let status = state.transactions.withdraw(&req.amount).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// GET /api/v1/transactions/status
pub async fn get_status(
    State(state): State<AppState>,
) -> Json<ApiResponse<Option<TransactionStatus>>> {
    Json(ApiResponse::success(state.transactions.status()))
}

/// POST /api/v1/transactions/dismiss
pub async fn dismiss_status(State(state): State<AppState>) -> Json<ApiResponse<bool>> {
    Json(ApiResponse::success(state.transactions.dismiss_status()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;
    use crate::error::AppError;

    #[test]
    fn approve_response_is_tagged() {
        let json = serde_json::to_value(ApproveResponse::NoBalance).expect("serialize");
        assert_eq!(json, serde_json::json!({ "outcome": "no_balance" }));

        let settled = ApproveResponse::from(ApproveOutcome::Settled(TransactionStatus::failed(
            "Transaction was rejected by user",
        )));
        let json = serde_json::to_value(settled).expect("serialize");
        assert_eq!(json["outcome"], "settled");
        assert_eq!(json["transaction"]["status"], "failed");
        assert_eq!(json["transaction"]["hash"], "");
    }

    #[tokio::test]
    async fn actions_need_a_connection() {
        let state = state_with(None);
        let err = deposit(
            State(state.clone()),
            Json(AmountRequest {
                amount: "1".into(),
            }),
        )
        .await
        .expect_err("not connected");
        assert_eq!(err, AppError::NotConnected);

        let Json(status) = get_status(State(state)).await;
        assert!(status.data.is_none());
    }
}
