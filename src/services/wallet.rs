//! Wallet ledger reads.
//!
//! Balances are mutated exclusively inside withdrawal transactions (see
//! `withdrawals.rs`); this service only exposes the owner-facing views.

use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Billetera, MovimientoBilletera};
use crate::db::queries;
use crate::error::AppError;

pub struct WalletService {
    pool: PgPool,
}

impl WalletService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// An owner with no completed bookings has no wallet row yet; that reads
    /// as an all-zero wallet, not an error.
    pub async fn get_balance(&self, owner_id: Uuid) -> Result<Billetera, AppError> {
        let row = sqlx::query_as::<_, Billetera>(
            "SELECT * FROM billetera_propietarios WHERE propietario_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.unwrap_or_else(|| empty_wallet(owner_id)))
    }

    pub async fn list_movimientos(
        &self,
        owner_id: Uuid,
        limit: i64,
    ) -> Result<Vec<MovimientoBilletera>, AppError> {
        Ok(queries::list_movimientos(&self.pool, owner_id, limit).await?)
    }
}

fn empty_wallet(owner_id: Uuid) -> Billetera {
    let now = Utc::now();
    Billetera {
        propietario_id: owner_id,
        saldo_disponible: BigDecimal::from(0),
        saldo_pendiente: BigDecimal::from(0),
        saldo_retenido: BigDecimal::from(0),
        total_ganado: BigDecimal::from(0),
        total_retirado: BigDecimal::from(0),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_wallet_is_all_zero() {
        let owner = Uuid::new_v4();
        let wallet = empty_wallet(owner);
        assert_eq!(wallet.propietario_id, owner);
        assert_eq!(wallet.saldo_disponible, BigDecimal::from(0));
        assert_eq!(wallet.saldo_retenido, BigDecimal::from(0));
        assert_eq!(wallet.total_ganado, BigDecimal::from(0));
        assert_eq!(wallet.total_retirado, BigDecimal::from(0));
    }
}
