use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::services::WalletService;
use crate::AppState;

/// `GET /wallet` — the owner's balance; an owner without earnings reads as an
/// all-zero wallet.
pub async fn get_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let wallet = WalletService::new(state.db.clone())
        .get_balance(principal.owner_id)
        .await?;

    Ok(Json(wallet))
}

#[derive(Debug, Deserialize)]
pub struct MovimientosParams {
    pub limit: Option<i64>,
}

/// `GET /wallet/movimientos` — the wallet journal, newest first.
pub async fn list_movimientos(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<MovimientosParams>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let movimientos = WalletService::new(state.db.clone())
        .list_movimientos(principal.owner_id, limit)
        .await?;

    Ok(Json(movimientos))
}
