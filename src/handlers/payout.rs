//! OAuth linking endpoints.
//!
//! The browser-facing endpoints (`/payout/auth`, `/payout/callback`) never
//! return JSON errors: every outcome ends in a redirect, with failures
//! collapsed into the `mp_linked=error` flag.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::bearer_token;
use crate::db::queries;
use crate::error::AppError;
use crate::services::{DisconnectService, OauthLinker};
use crate::AppState;

fn dashboard_redirect(state: &AppState, flag: &str) -> Redirect {
    let url = format!(
        "{}/dashboard/cobros?mp_linked={}",
        state.config.app_url.trim_end_matches('/'),
        flag
    );
    Redirect::temporary(&url)
}

/// `GET /payout/auth` — redirects an authenticated owner to the provider
/// authorization page; unauthenticated sessions go to the login page.
pub async fn auth_redirect(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    let principal = match bearer_token(&headers) {
        Ok(token) => state.verifier.verify(token).await,
        Err(e) => Err(e),
    };

    let principal = match principal {
        Ok(p) => p,
        Err(_) => {
            let login = format!("{}/auth/login", state.config.app_url.trim_end_matches('/'));
            return Redirect::temporary(&login);
        }
    };

    let linker = OauthLinker::new(
        state.db.clone(),
        state.mp_client.clone(),
        state.config.state_secret.clone(),
    );

    match linker.begin_link(principal.owner_id) {
        Ok(url) => Redirect::temporary(&url),
        Err(e) => {
            tracing::error!("Error initiating MP OAuth: {}", e);
            dashboard_redirect(&state, "error")
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// `GET /payout/callback` — public provider callback. Always redirects to the
/// dashboard with a success or error flag.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let (code, oauth_state) = match (params.code, params.state) {
        (Some(c), Some(s)) => (c, s),
        _ => return dashboard_redirect(&state, "error"),
    };

    let linker = OauthLinker::new(
        state.db.clone(),
        state.mp_client.clone(),
        state.config.state_secret.clone(),
    );

    match linker.complete_link(&code, &oauth_state).await {
        Ok(_) => dashboard_redirect(&state, "success"),
        Err(e) => {
            tracing::error!("Error in MP callback: {}", e);
            dashboard_redirect(&state, "error")
        }
    }
}

/// Credential view with the legacy `user_id` column normalized to
/// `propietario_id`. Tokens never leave the service.
#[derive(Debug, Serialize)]
pub struct AccountView {
    pub id: Uuid,
    pub propietario_id: Uuid,
    pub mp_user_id: String,
    pub mp_email: String,
    pub is_active: bool,
    pub token_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// `GET /payout/account` — the owner's active credential, or null.
pub async fn account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    let account = queries::get_active_mp_account(&state.db, principal.owner_id)
        .await?
        .map(|a| AccountView {
            id: a.id,
            propietario_id: a.user_id,
            mp_user_id: a.mp_user_id,
            mp_email: a.mp_email,
            is_active: a.is_active,
            token_expires_at: a.token_expires_at,
            created_at: a.created_at,
        });

    Ok(Json(json!({ "account": account })))
}

#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    #[serde(rename = "ownerId")]
    pub owner_id: Uuid,
}

/// `POST /payout/disconnect` — guarded credential removal. The body's owner
/// must match the authenticated principal.
pub async fn disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DisconnectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer_token(&headers)?;
    let principal = state.verifier.verify(token).await?;

    if body.owner_id != principal.owner_id {
        return Err(AppError::Forbidden);
    }

    DisconnectService::new(state.db.clone())
        .disconnect(principal.owner_id)
        .await?;

    Ok(Json(json!({ "success": true })))
}
