use sqlx::{PgPool, Result};
use uuid::Uuid;

use crate::db::models::{CuentaCobro, MovimientoBilletera, MpAccount, Withdrawal};

pub async fn get_active_mp_account(pool: &PgPool, owner_id: Uuid) -> Result<Option<MpAccount>> {
    sqlx::query_as::<_, MpAccount>(
        "SELECT * FROM mp_accounts_propietarios WHERE user_id = $1 AND is_active = TRUE",
    )
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_withdrawal(pool: &PgPool, id: Uuid) -> Result<Withdrawal> {
    sqlx::query_as::<_, Withdrawal>("SELECT * FROM withdrawals WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn list_withdrawals(
    pool: &PgPool,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<Withdrawal>> {
    sqlx::query_as::<_, Withdrawal>(
        "SELECT * FROM withdrawals WHERE propietario_id = $1 ORDER BY fecha_solicitada DESC LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn count_pending_withdrawals(pool: &PgPool, owner_id: Uuid) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM withdrawals WHERE propietario_id = $1 AND estado IN ('pendiente', 'procesando')",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn list_cuentas_cobro(pool: &PgPool, owner_id: Uuid) -> Result<Vec<CuentaCobro>> {
    sqlx::query_as::<_, CuentaCobro>(
        "SELECT * FROM cuentas_cobro WHERE propietario_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn list_movimientos(
    pool: &PgPool,
    owner_id: Uuid,
    limit: i64,
) -> Result<Vec<MovimientoBilletera>> {
    sqlx::query_as::<_, MovimientoBilletera>(
        "SELECT * FROM movimientos_billetera WHERE propietario_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(owner_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
