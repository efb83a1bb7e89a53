//! Withdrawal workflow: admission, pricing, and state transitions.
//!
//! Admission reserves the requested amount out of `saldo_disponible` in the
//! same transaction that inserts the withdrawal row, with the wallet row
//! locked `FOR UPDATE`. Two concurrent requests against the same balance
//! therefore serialize, and the second sees the post-reservation balance.

use bigdecimal::BigDecimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::db::models::{Billetera, CuentaCobro, Withdrawal};
use crate::db::queries;
use crate::domain::withdrawal::{validate_amount, validate_minimum, WithdrawalPricing};
use crate::domain::WithdrawalState;
use crate::error::AppError;

pub struct WithdrawalService {
    pool: PgPool,
}

impl WithdrawalService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Admits a withdrawal request. Validation order: destination, amount,
    /// funds, minimum. On success the amount moves from `saldo_disponible`
    /// to `saldo_retenido` atomically with the insert.
    pub async fn request_withdrawal(
        &self,
        owner_id: Uuid,
        cuenta_cobro_id: Uuid,
        monto: BigDecimal,
        es_adelantado: bool,
    ) -> Result<Withdrawal, AppError> {
        let mut tx = self.pool.begin().await?;

        let destino = sqlx::query_as::<_, CuentaCobro>(
            "SELECT * FROM cuentas_cobro WHERE id = $1 AND propietario_id = $2 AND activa = TRUE",
        )
        .bind(cuenta_cobro_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::InvalidDestination)?;

        validate_amount(&monto)?;

        let wallet = lock_wallet(&mut tx, owner_id).await?;
        if monto > wallet.saldo_disponible {
            return Err(AppError::InsufficientFunds);
        }

        validate_minimum(&monto)?;

        let pricing = WithdrawalPricing::price(&monto, es_adelantado);

        sqlx::query(
            r#"
            UPDATE billetera_propietarios
            SET saldo_disponible = saldo_disponible - $2,
                saldo_retenido = saldo_retenido + $2,
                updated_at = NOW()
            WHERE propietario_id = $1
            "#,
        )
        .bind(owner_id)
        .bind(&monto)
        .execute(&mut *tx)
        .await?;

        let withdrawal = sqlx::query_as::<_, Withdrawal>(
            r#"
            INSERT INTO withdrawals (
                propietario_id, cuenta_cobro_id, monto, es_adelantado,
                porcentaje_cargo_adicional, monto_cargo_adicional, monto_neto,
                estado, fecha_solicitada
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'pendiente', NOW())
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(destino.id)
        .bind(&monto)
        .bind(es_adelantado)
        .bind(&pricing.porcentaje_cargo_adicional)
        .bind(&pricing.monto_cargo_adicional)
        .bind(&pricing.monto_neto)
        .fetch_one(&mut *tx)
        .await?;

        record_movimiento(
            &mut tx,
            owner_id,
            "retiro_solicitado",
            &monto,
            "Reserva por solicitud de retiro",
            withdrawal.id,
        )
        .await?;

        tx.commit().await?;

        info!(
            withdrawal_id = %withdrawal.id,
            owner_id = %owner_id,
            monto = %withdrawal.monto,
            es_adelantado = withdrawal.es_adelantado,
            "Withdrawal request admitted"
        );

        Ok(withdrawal)
    }

    pub async fn list_withdrawals(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Withdrawal>, AppError> {
        Ok(queries::list_withdrawals(&self.pool, owner_id, limit).await?)
    }

    pub async fn pending_count(&self, owner_id: Uuid) -> Result<i64, AppError> {
        Ok(queries::count_pending_withdrawals(&self.pool, owner_id).await?)
    }

    /// Moves a pending withdrawal into `procesando`. Invoked by the external
    /// settlement collaborator when it picks the request up.
    pub async fn mark_processing(&self, id: Uuid) -> Result<Withdrawal, AppError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = lock_withdrawal(&mut tx, id).await?;
        ensure_transition(&withdrawal, WithdrawalState::Procesando)?;

        let updated = sqlx::query_as::<_, Withdrawal>(
            "UPDATE withdrawals SET estado = 'procesando' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Settles a withdrawal: releases the reservation and counts the net
    /// amount towards `total_retirado`.
    pub async fn complete(&self, id: Uuid) -> Result<Withdrawal, AppError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = lock_withdrawal(&mut tx, id).await?;
        ensure_transition(&withdrawal, WithdrawalState::Completado)?;

        sqlx::query(
            r#"
            UPDATE billetera_propietarios
            SET saldo_retenido = saldo_retenido - $2,
                total_retirado = total_retirado + $3,
                updated_at = NOW()
            WHERE propietario_id = $1
            "#,
        )
        .bind(withdrawal.propietario_id)
        .bind(&withdrawal.monto)
        .bind(&withdrawal.monto_neto)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Withdrawal>(
            "UPDATE withdrawals SET estado = 'completado', fecha_completado = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        record_movimiento(
            &mut tx,
            withdrawal.propietario_id,
            "retiro_completado",
            &withdrawal.monto_neto,
            "Retiro acreditado en la cuenta de cobro",
            id,
        )
        .await?;

        tx.commit().await?;

        info!(withdrawal_id = %id, owner_id = %withdrawal.propietario_id, "Withdrawal completed");
        Ok(updated)
    }

    /// Rejects a withdrawal, returning the reserved funds to the available
    /// balance.
    pub async fn reject(&self, id: Uuid, motivo: &str) -> Result<Withdrawal, AppError> {
        self.release(id, WithdrawalState::Rechazado, Some(motivo)).await
    }

    /// Cancels a withdrawal, returning the reserved funds.
    pub async fn cancel(&self, id: Uuid) -> Result<Withdrawal, AppError> {
        self.release(id, WithdrawalState::Cancelado, None).await
    }

    async fn release(
        &self,
        id: Uuid,
        target: WithdrawalState,
        motivo: Option<&str>,
    ) -> Result<Withdrawal, AppError> {
        let mut tx = self.pool.begin().await?;
        let withdrawal = lock_withdrawal(&mut tx, id).await?;
        ensure_transition(&withdrawal, target)?;

        sqlx::query(
            r#"
            UPDATE billetera_propietarios
            SET saldo_retenido = saldo_retenido - $2,
                saldo_disponible = saldo_disponible + $2,
                updated_at = NOW()
            WHERE propietario_id = $1
            "#,
        )
        .bind(withdrawal.propietario_id)
        .bind(&withdrawal.monto)
        .execute(&mut *tx)
        .await?;

        let updated = sqlx::query_as::<_, Withdrawal>(
            "UPDATE withdrawals SET estado = $2, motivo_rechazo = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(target.as_str())
        .bind(motivo)
        .fetch_one(&mut *tx)
        .await?;

        record_movimiento(
            &mut tx,
            withdrawal.propietario_id,
            "retiro_liberado",
            &withdrawal.monto,
            "Fondos liberados por retiro no concretado",
            id,
        )
        .await?;

        tx.commit().await?;

        info!(
            withdrawal_id = %id,
            owner_id = %withdrawal.propietario_id,
            estado = target.as_str(),
            "Withdrawal released"
        );
        Ok(updated)
    }
}

/// Locks the owner's wallet row, creating the zero row first if the owner has
/// never earned anything.
async fn lock_wallet(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
) -> Result<Billetera, AppError> {
    sqlx::query(
        "INSERT INTO billetera_propietarios (propietario_id) VALUES ($1) ON CONFLICT DO NOTHING",
    )
    .bind(owner_id)
    .execute(&mut **tx)
    .await?;

    let wallet = sqlx::query_as::<_, Billetera>(
        "SELECT * FROM billetera_propietarios WHERE propietario_id = $1 FOR UPDATE",
    )
    .bind(owner_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(wallet)
}

async fn lock_withdrawal(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> Result<Withdrawal, AppError> {
    sqlx::query_as::<_, Withdrawal>("SELECT * FROM withdrawals WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Withdrawal {} not found", id)))
}

fn ensure_transition(withdrawal: &Withdrawal, target: WithdrawalState) -> Result<(), AppError> {
    let current = WithdrawalState::parse(&withdrawal.estado).ok_or_else(|| {
        AppError::InternalError(format!("unknown withdrawal state: {}", withdrawal.estado))
    })?;
    if !current.can_transition_to(target) {
        return Err(AppError::Conflict(format!(
            "withdrawal {} cannot move from {} to {}",
            withdrawal.id,
            current.as_str(),
            target.as_str()
        )));
    }
    Ok(())
}

async fn record_movimiento(
    tx: &mut Transaction<'_, Postgres>,
    owner_id: Uuid,
    tipo: &str,
    monto: &BigDecimal,
    descripcion: &str,
    withdrawal_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO movimientos_billetera (propietario_id, tipo, monto, descripcion, withdrawal_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(owner_id)
    .bind(tipo)
    .bind(monto)
    .bind(descripcion)
    .bind(withdrawal_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
