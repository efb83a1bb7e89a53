//! Manual payout destination management (bank accounts and manually entered
//! Mercado Pago emails). Credential-backed destinations are created by the
//! OAuth linker and removed via disconnect, never through this service.

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::CuentaCobro;
use crate::db::queries;
use crate::domain::destination::TIPO_CUENTA_BANCARIA;
use crate::domain::DestinationSpec;
use crate::error::AppError;

pub struct DestinationService {
    pool: PgPool,
}

impl DestinationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        spec: DestinationSpec,
    ) -> Result<CuentaCobro, AppError> {
        spec.validate()?;

        let (banco, tipo_cuenta, cbu, alias, titular, cuit_cuil) =
            if spec.tipo == TIPO_CUENTA_BANCARIA {
                (spec.banco, spec.tipo_cuenta, spec.cbu, spec.alias, spec.titular, spec.cuit_cuil)
            } else {
                (None, None, None, None, None, None)
            };

        let cuenta = sqlx::query_as::<_, CuentaCobro>(
            r#"
            INSERT INTO cuentas_cobro (
                propietario_id, tipo, mp_email, banco, tipo_cuenta, cbu,
                alias, titular, cuit_cuil, verificada, activa, es_principal
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, TRUE, FALSE)
            RETURNING *
            "#,
        )
        .bind(owner_id)
        .bind(&spec.tipo)
        .bind(&spec.mp_email)
        .bind(banco)
        .bind(tipo_cuenta)
        .bind(cbu)
        .bind(alias)
        .bind(titular)
        .bind(cuit_cuil)
        .fetch_one(&self.pool)
        .await?;

        Ok(cuenta)
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<CuentaCobro>, AppError> {
        Ok(queries::list_cuentas_cobro(&self.pool, owner_id).await?)
    }

    /// Deletes a manually entered destination. Credential-backed rows are
    /// refused, as is any row a withdrawal still references.
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), AppError> {
        let cuenta = sqlx::query_as::<_, CuentaCobro>(
            "SELECT * FROM cuentas_cobro WHERE id = $1 AND propietario_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cuenta de cobro {} not found", id)))?;

        if cuenta.mp_account_id.is_some() {
            return Err(AppError::Conflict(
                "La cuenta de Mercado Pago se desvincula desde Desconectar".to_string(),
            ));
        }

        let (referenced,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM withdrawals WHERE cuenta_cobro_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if referenced > 0 {
            return Err(AppError::Conflict(
                "La cuenta tiene retiros asociados y no puede eliminarse".to_string(),
            ));
        }

        sqlx::query("DELETE FROM cuentas_cobro WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
