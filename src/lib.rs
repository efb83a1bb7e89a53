pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod mercadopago;
pub mod middleware;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Instant;

use axum::http::HeaderValue;
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::auth::SessionVerifier;
use crate::config::Config;
use crate::mercadopago::MpClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub mp_client: MpClient,
    pub verifier: Arc<dyn SessionVerifier>,
    pub config: Arc<Config>,
    pub start_time: Instant,
}

pub fn create_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/payout/auth", get(handlers::payout::auth_redirect))
        .route("/payout/callback", get(handlers::payout::callback))
        .route("/payout/account", get(handlers::payout::account))
        .route("/payout/disconnect", post(handlers::payout::disconnect))
        .route(
            "/withdrawals",
            post(handlers::withdrawals::create_withdrawal)
                .get(handlers::withdrawals::list_withdrawals),
        )
        .route("/wallet", get(handlers::wallet::get_wallet))
        .route("/wallet/movimientos", get(handlers::wallet::list_movimientos))
        .route(
            "/destinations",
            post(handlers::destinations::create_destination)
                .get(handlers::destinations::list_destinations),
        )
        .route(
            "/destinations/:id",
            delete(handlers::destinations::delete_destination),
        )
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new().allow_origin(origins)
        }
        None => CorsLayer::new(),
    }
}
