mod cli;

use clap::Parser;
use sqlx::migrate::Migrator;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use cli::{Cli, Commands, WithdrawalCommands};
use parkit_payouts::auth::HttpSessionVerifier;
use parkit_payouts::config::Config;
use parkit_payouts::mercadopago::MpClient;
use parkit_payouts::services::{reconciliation, ReconciliationService, WithdrawalService};
use parkit_payouts::{db, handlers, AppState};

/// OpenAPI schema for the Parkit Payouts API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
    ),
    components(
        schemas(
            handlers::HealthStatus,
        )
    ),
    info(
        title = "Parkit Payouts API",
        version = "0.1.0",
        description = "Payout ledger, withdrawal workflow and Mercado Pago OAuth linking for parking-lot owners",
        contact(name = "Parkit Team")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let config_info = Config::from_env()?;
    let config = config_info.config;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Config => {
            println!("profile: {}", config_info.profile.as_str());
            println!("server_port: {}", config.server_port);
            println!("app_url: {}", config.app_url);
            println!("auth_url: {}", config.auth_url);
            println!("mp_auth_url: {}", config.mp_auth_url);
            println!("mp_api_url: {}", config.mp_api_url);
            println!("mp_redirect_uri: {}", config.mp_redirect_uri);
            if config_info.overrides.is_empty() {
                println!("overrides: none");
            } else {
                println!("overrides: {}", config_info.overrides.join(", "));
            }
            Ok(())
        }
        Commands::Openapi => {
            println!("{}", ApiDoc::openapi().to_pretty_json()?);
            Ok(())
        }
        Commands::Reconcile => {
            let pool = db::create_pool(&config).await?;
            let report = ReconciliationService::new(pool).reconcile().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Withdrawal(cmd) => {
            let pool = db::create_pool(&config).await?;
            let service = WithdrawalService::new(pool);
            let withdrawal = match cmd {
                WithdrawalCommands::MarkProcessing { withdrawal_id } => {
                    service.mark_processing(withdrawal_id).await?
                }
                WithdrawalCommands::ForceComplete { withdrawal_id } => {
                    service.complete(withdrawal_id).await?
                }
                WithdrawalCommands::ForceReject {
                    withdrawal_id,
                    motivo,
                } => service.reject(withdrawal_id, &motivo).await?,
                WithdrawalCommands::ForceCancel { withdrawal_id } => {
                    service.cancel(withdrawal_id).await?
                }
            };
            println!(
                "withdrawal {} -> {} (neto {})",
                withdrawal.id, withdrawal.estado, withdrawal.monto_neto
            );
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = db::create_pool(&config).await?;

    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(&pool).await?;
    tracing::info!("Database migrations completed");

    let mp_client = MpClient::new(&config);
    let verifier = Arc::new(HttpSessionVerifier::new(config.auth_url.clone()));

    let state = AppState {
        db: pool.clone(),
        mp_client,
        verifier,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    };

    // Repairs credential/destination drift left by best-effort writes.
    tokio::spawn(reconciliation::run_reconciler(pool));

    let app = parkit_payouts::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
