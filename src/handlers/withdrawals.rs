use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::error::AppError;
use crate::services::WithdrawalService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    #[serde(rename = "destinationId")]
    pub destination_id: Uuid,
    pub amount: BigDecimal,
    #[serde(rename = "isAdvance", default)]
    pub is_advance: bool,
}

/// `POST /withdrawals` — admits a withdrawal request for the authenticated
/// owner.
pub async fn create_withdrawal(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateWithdrawalRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let withdrawal = WithdrawalService::new(state.db.clone())
        .request_withdrawal(
            principal.owner_id,
            body.destination_id,
            body.amount,
            body.is_advance,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(withdrawal)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
}

/// `GET /withdrawals` — the owner's recent withdrawals, newest first.
pub async fn list_withdrawals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let withdrawals = WithdrawalService::new(state.db.clone())
        .list_withdrawals(principal.owner_id, limit)
        .await?;

    Ok(Json(withdrawals))
}
