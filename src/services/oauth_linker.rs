//! Mercado Pago OAuth linking.
//!
//! `begin_link` issues the provider authorization URL with a signed state
//! token; `complete_link` runs the authorization-code exchange, fetches the
//! provider identity, and persists the credential plus its payout
//! destination. The credential upsert is keyed on the owner id, so callback
//! redelivery is idempotent and an owner never holds two active credentials.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::db::models::MpAccount;
use crate::error::AppError;
use crate::mercadopago::MpClient;
use crate::utils::state_token;

pub struct OauthLinker {
    pool: PgPool,
    mp_client: MpClient,
    state_secret: String,
}

#[derive(Debug)]
pub struct LinkResult {
    pub account: MpAccount,
}

impl OauthLinker {
    pub fn new(pool: PgPool, mp_client: MpClient, state_secret: String) -> Self {
        Self {
            pool,
            mp_client,
            state_secret,
        }
    }

    /// Builds the provider authorization URL for an authenticated owner.
    pub fn begin_link(&self, owner_id: Uuid) -> Result<String, AppError> {
        let state = state_token::sign(&self.state_secret, owner_id);
        self.mp_client
            .authorization_url(&state)
            .map_err(|e| AppError::InternalError(format!("authorization URL: {}", e)))
    }

    /// Completes the link from the provider callback. No partial state is
    /// visible as "linked": nothing is written until both the token exchange
    /// and the identity fetch have succeeded.
    pub async fn complete_link(&self, code: &str, state: &str) -> Result<LinkResult, AppError> {
        let owner_id = state_token::verify(&self.state_secret, state).map_err(|e| {
            // Distinct log line: a failed state check is a potential abuse signal.
            warn!("OAuth state verification failed: {}", e);
            AppError::InvalidState
        })?;

        let tokens = self.mp_client.exchange_code(code).await.map_err(|e| {
            error!(owner_id = %owner_id, "MP token exchange failed: {}", e);
            AppError::TokenExchangeFailed
        })?;

        let mp_user = self
            .mp_client
            .get_user(&tokens.access_token)
            .await
            .map_err(|e| {
                error!(owner_id = %owner_id, "MP identity fetch failed: {}", e);
                AppError::IdentityFetchFailed
            })?;

        let token_expires_at = Utc::now() + Duration::seconds(tokens.expires_in);

        // The credential row must exist before the destination that
        // references it.
        let account = sqlx::query_as::<_, MpAccount>(
            r#"
            INSERT INTO mp_accounts_propietarios (
                user_id, mp_user_id, mp_email, access_token, refresh_token,
                token_expires_at, is_active
            ) VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            ON CONFLICT (user_id) DO UPDATE SET
                mp_user_id = EXCLUDED.mp_user_id,
                mp_email = EXCLUDED.mp_email,
                access_token = EXCLUDED.access_token,
                refresh_token = EXCLUDED.refresh_token,
                token_expires_at = EXCLUDED.token_expires_at,
                is_active = TRUE,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(mp_user.id.to_string())
        .bind(&mp_user.email)
        .bind(&tokens.access_token)
        .bind(&tokens.refresh_token)
        .bind(token_expires_at)
        .fetch_one(&self.pool)
        .await?;

        // Destination upsert is secondary: a failure here leaves the
        // credential linked and is repaired by reconciliation.
        if let Err(e) = self.upsert_destination(&account).await {
            warn!(
                owner_id = %owner_id,
                account_id = %account.id,
                "Payout destination upsert failed, leaving to reconciliation: {}",
                e
            );
        }

        info!(owner_id = %owner_id, mp_user_id = %account.mp_user_id, "Mercado Pago account linked");
        Ok(LinkResult { account })
    }

    async fn upsert_destination(&self, account: &MpAccount) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO cuentas_cobro (
                propietario_id, tipo, mp_email, mp_account_id,
                verificada, activa, es_principal
            ) VALUES ($1, 'mercado_pago', $2, $3, TRUE, TRUE, TRUE)
            ON CONFLICT (mp_account_id) DO UPDATE SET
                mp_email = EXCLUDED.mp_email,
                verificada = TRUE,
                activa = TRUE,
                es_principal = TRUE,
                updated_at = NOW()
            "#,
        )
        .bind(account.user_id)
        .bind(&account.mp_email)
        .bind(account.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
