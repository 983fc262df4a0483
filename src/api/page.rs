use axum::{
    extract::{Path, State},
    Json,
};

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::ApiResponse,
    services::{AlertKind, PageView},
};

/// GET /api/v1/page
pub async fn get_page(State(state): State<AppState>) -> Json<ApiResponse<PageView>> {
    Json(ApiResponse::success(state.page.view()))
}

/// POST /api/v1/page/check
pub async fn check(State(state): State<AppState>) -> Result<Json<ApiResponse<PageView>>> {
    let view = state.page.check().await?;
    Ok(Json(ApiResponse::success(view)))
}

/// POST /api/v1/page/modal/open
pub async fn open_modal(State(state): State<AppState>) -> Json<ApiResponse<PageView>> {
    state.page.open_modal();
    Json(ApiResponse::success(state.page.view()))
}

/// POST /api/v1/page/modal/close
pub async fn close_modal(State(state): State<AppState>) -> Json<ApiResponse<PageView>> {
    state.page.close_modal();
    Json(ApiResponse::success(state.page.view()))
}

/// POST /api/v1/page/alerts/{kind}/dismiss
pub async fn dismiss_alert(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<PageView>>> {
    let kind = AlertKind::parse(&kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown alert: {}", kind)))?;
    state.page.dismiss_alert(kind);
    Ok(Json(ApiResponse::success(state.page.view())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::state_with;
    use crate::services::alerts::AlertPhase;

    #[tokio::test(start_paused = true)]
    async fn dismiss_route_accepts_known_kinds_only() {
        let state = state_with(None);
        state.page.detect_wallet();

        let Json(response) = dismiss_alert(State(state.clone()), Path("wallet-missing".into()))
            .await
            .expect("dismissed");
        assert_eq!(response.data.alerts[0].phase, AlertPhase::SlidingOut);

        let err = dismiss_alert(State(state), Path("fireworks".into()))
            .await
            .expect_err("unknown kind");
        assert_eq!(err, AppError::BadRequest("Unknown alert: fireworks".into()));
    }

    #[tokio::test]
    async fn modal_routes_toggle_flag() {
        let state = state_with(None);
        let Json(opened) = open_modal(State(state.clone())).await;
        assert!(opened.data.modal_open);
        let Json(closed) = close_modal(State(state)).await;
        assert!(!closed.data.modal_open);
    }
}
