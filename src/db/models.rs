use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Linked Mercado Pago credential. One active row per owner; rows are
/// deactivated on disconnect, never deleted.
#[derive(Debug, Clone, FromRow)]
pub struct MpAccount {
    pub id: Uuid,
    /// Legacy column name; exposed at the API boundary as `propietario_id`.
    pub user_id: Uuid,
    pub mp_user_id: String,
    pub mp_email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payout destination: either a credential-backed Mercado Pago account or a
/// manually entered bank account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CuentaCobro {
    pub id: Uuid,
    pub propietario_id: Uuid,
    pub tipo: String,
    pub mp_email: Option<String>,
    pub mp_account_id: Option<Uuid>,
    pub banco: Option<String>,
    pub tipo_cuenta: Option<String>,
    pub cbu: Option<String>,
    pub alias: Option<String>,
    pub titular: Option<String>,
    pub cuit_cuil: Option<String>,
    pub verificada: bool,
    pub activa: bool,
    pub es_principal: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Billetera {
    pub propietario_id: Uuid,
    pub saldo_disponible: BigDecimal,
    pub saldo_pendiente: BigDecimal,
    pub saldo_retenido: BigDecimal,
    pub total_ganado: BigDecimal,
    pub total_retirado: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: Uuid,
    pub propietario_id: Uuid,
    pub cuenta_cobro_id: Uuid,
    pub monto: BigDecimal,
    pub es_adelantado: bool,
    pub porcentaje_cargo_adicional: BigDecimal,
    pub monto_cargo_adicional: BigDecimal,
    pub monto_neto: BigDecimal,
    pub estado: String,
    pub fecha_solicitada: DateTime<Utc>,
    pub fecha_programada_pago: Option<DateTime<Utc>>,
    pub fecha_completado: Option<DateTime<Utc>>,
    pub motivo_rechazo: Option<String>,
}

/// Append-only wallet journal entry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MovimientoBilletera {
    pub id: Uuid,
    pub propietario_id: Uuid,
    pub tipo: String,
    pub monto: BigDecimal,
    pub descripcion: String,
    pub withdrawal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
