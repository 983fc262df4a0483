use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, TransactionStatus},
};
use axum::{extract::State, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    pub user_address: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverTokenRequest {
    pub token_address: String,
    /// Raw token units.
    pub amount: String,
}

/// POST /api/v1/admin/charge-token
pub async fn charge_token(
    State(state): State<AppState>,
    Json(req): Json<ChargeRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    state.transactions.require_admin().await?;
    let status = state
        .transactions
        .charge_token(&req.user_address, &req.amount)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/admin/charge-native
pub async fn charge_native(
    State(state): State<AppState>,
    Json(req): Json<ChargeRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    state.transactions.require_admin().await?;
    let status = state
        .transactions
        .charge_native(&req.user_address, &req.amount)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/admin/transfer-admin
pub async fn transfer_admin(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    state.transactions.require_admin().await?;
    let status = state.transactions.transfer_admin(&req.address).await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/admin/recover-token
pub async fn recover_token(
    State(state): State<AppState>,
    Json(req): Json<RecoverTokenRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    state.transactions.require_admin().await?;
    let status = state
        .transactions
        .recover_token(&req.token_address, &req.amount)
        .await?;
    Ok(Json(ApiResponse::success(status)))
}

/// POST /api/v1/admin/update-token
pub async fn update_token(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<ApiResponse<TransactionStatus>>> {
    state.transactions.require_admin().await?;
    let status = state.transactions.update_token(&req.address).await?;
    Ok(Json(ApiResponse::success(status)))
}
