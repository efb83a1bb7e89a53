//! Disconnect Guard: blocks credential removal while withdrawals are in
//! flight.
//!
//! The pending-withdrawal check and the credential deactivation run in one
//! transaction with the credential row locked, so the guard is re-evaluated
//! immediately before the deactivation takes effect.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::MpAccount;
use crate::db::queries;
use crate::error::AppError;

pub struct DisconnectService {
    pool: PgPool,
}

impl DisconnectService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// True when the owner has no withdrawal in `pendiente` or `procesando`.
    pub async fn can_disconnect(&self, owner_id: Uuid) -> Result<bool, AppError> {
        let count = queries::count_pending_withdrawals(&self.pool, owner_id).await?;
        Ok(count == 0)
    }

    /// Deactivates the owner's credential (rows are kept for audit) and then
    /// best-effort deactivates the linked Mercado Pago destinations. The
    /// credential deactivation is the safety-critical action; a destination
    /// failure is logged and repaired later by reconciliation.
    pub async fn disconnect(&self, owner_id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let account = match sqlx::query_as::<_, MpAccount>(
            "SELECT * FROM mp_accounts_propietarios WHERE user_id = $1 AND is_active = TRUE FOR UPDATE",
        )
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        {
            Some(account) => account,
            None => {
                // Nothing linked; disconnect is idempotent.
                info!(owner_id = %owner_id, "Disconnect requested with no active credential");
                return Ok(());
            }
        };

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM withdrawals WHERE propietario_id = $1 AND estado IN ('pendiente', 'procesando')",
        )
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        if count > 0 {
            return Err(AppError::PendingWithdrawalsExist { count });
        }

        sqlx::query(
            "UPDATE mp_accounts_propietarios SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(account.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(owner_id = %owner_id, "Mercado Pago credential deactivated");

        let result = sqlx::query(
            r#"
            UPDATE cuentas_cobro
            SET activa = FALSE, updated_at = NOW()
            WHERE propietario_id = $1 AND tipo = 'mercado_pago' AND mp_account_id IS NOT NULL
            "#,
        )
        .bind(owner_id)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(
                owner_id = %owner_id,
                "Destination deactivation failed, leaving to reconciliation: {}",
                e
            );
        }

        Ok(())
    }
}
