use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::domain::DestinationSpec;
use crate::error::AppError;
use crate::services::DestinationService;
use crate::AppState;

/// `POST /destinations` — registers a manually entered payout destination.
pub async fn create_destination(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(spec): Json<DestinationSpec>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let cuenta = DestinationService::new(state.db.clone())
        .create(principal.owner_id, spec)
        .await?;

    Ok((StatusCode::CREATED, Json(cuenta)))
}

/// `GET /destinations` — the owner's payout destinations, newest first.
pub async fn list_destinations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let cuentas = DestinationService::new(state.db.clone())
        .list(principal.owner_id)
        .await?;

    Ok(Json(cuentas))
}

/// `DELETE /destinations/:id` — removes a manually entered destination.
pub async fn delete_destination(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    DestinationService::new(state.db.clone())
        .delete(principal.owner_id, id)
        .await?;

    Ok(Json(json!({ "success": true })))
}
