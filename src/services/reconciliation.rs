//! Credential / destination reconciliation.
//!
//! The destination writes that follow a credential change are best-effort
//! (see `oauth_linker.rs` and `disconnect.rs`). This job repairs the drift
//! they can leave behind: active credentials with a missing destination get
//! one created, active credentials whose destination was left inactive (a
//! relink after disconnect where the upsert failed) get it reactivated, and
//! destinations whose credential was deactivated get deactivated too.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use uuid::Uuid;

const RECONCILE_INTERVAL_SECS: u64 = 300;

#[derive(Debug, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub destinations_created: Vec<Uuid>,
    pub destinations_reactivated: Vec<Uuid>,
    pub destinations_deactivated: Vec<Uuid>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.destinations_created.is_empty()
            && self.destinations_reactivated.is_empty()
            && self.destinations_deactivated.is_empty()
    }
}

pub struct ReconciliationService {
    pool: PgPool,
}

impl ReconciliationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn reconcile(&self) -> anyhow::Result<ReconciliationReport> {
        let created = self.create_missing_destinations().await?;
        let reactivated = self.reactivate_stale_destinations().await?;
        let deactivated = self.deactivate_orphaned_destinations().await?;

        let report = ReconciliationReport {
            destinations_created: created,
            destinations_reactivated: reactivated,
            destinations_deactivated: deactivated,
        };

        if !report.is_clean() {
            info!(
                created = report.destinations_created.len(),
                reactivated = report.destinations_reactivated.len(),
                deactivated = report.destinations_deactivated.len(),
                "Reconciliation repaired credential/destination drift"
            );
        }

        Ok(report)
    }

    /// Active credentials missing an active mercado_pago destination.
    async fn create_missing_destinations(&self) -> anyhow::Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO cuentas_cobro (
                propietario_id, tipo, mp_email, mp_account_id,
                verificada, activa, es_principal
            )
            SELECT a.user_id, 'mercado_pago', a.mp_email, a.id, TRUE, TRUE, TRUE
            FROM mp_accounts_propietarios a
            LEFT JOIN cuentas_cobro c ON c.mp_account_id = a.id
            WHERE a.is_active = TRUE AND c.id IS NULL
            RETURNING id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Destinations left inactive although their credential is active again.
    /// Happens when an owner relinks after a disconnect and the destination
    /// upsert fails; without this pass the destination row already exists, so
    /// it is never recreated and withdrawals to it keep being refused.
    async fn reactivate_stale_destinations(&self) -> anyhow::Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE cuentas_cobro c
            SET activa = TRUE, verificada = TRUE, updated_at = NOW()
            FROM mp_accounts_propietarios a
            WHERE c.mp_account_id = a.id AND a.is_active = TRUE AND c.activa = FALSE
            RETURNING c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Destinations still marked active although their credential has been
    /// deactivated.
    async fn deactivate_orphaned_destinations(&self) -> anyhow::Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE cuentas_cobro c
            SET activa = FALSE, updated_at = NOW()
            FROM mp_accounts_propietarios a
            WHERE c.mp_account_id = a.id AND a.is_active = FALSE AND c.activa = TRUE
            RETURNING c.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

/// Periodic reconciliation loop, spawned next to the HTTP server.
pub async fn run_reconciler(pool: PgPool) {
    info!("Reconciliation loop started");
    let service = ReconciliationService::new(pool);

    loop {
        if let Err(e) = service.reconcile().await {
            error!("Reconciliation pass failed: {}", e);
        }
        sleep(Duration::from_secs(RECONCILE_INTERVAL_SECS)).await;
    }
}
