use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("El monto ingresado no es válido")]
    InvalidAmount,
    #[error("El monto mínimo de retiro es ${0}")]
    BelowMinimum(i64),
    #[error("La cuenta de cobro seleccionada no existe o no está activa")]
    InvalidDestination,
    #[error("No tenés saldo suficiente")]
    InsufficientFunds,
    #[error("No podés desconectar tu cuenta mientras tenés retiros pendientes")]
    PendingWithdrawalsExist { count: i64 },
    #[error("Invalid OAuth state parameter")]
    InvalidState,
    #[error("Token exchange with the payment provider failed")]
    TokenExchangeFailed,
    #[error("Could not fetch the provider account identity")]
    IdentityFetchFailed,
    #[error("No autenticado")]
    Unauthorized,
    #[error("No autorizado")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Stable machine-readable code, independent of the display message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidAmount => "invalid_amount",
            AppError::BelowMinimum(_) => "below_minimum",
            AppError::InvalidDestination => "invalid_destination",
            AppError::InsufficientFunds => "insufficient_funds",
            AppError::PendingWithdrawalsExist { .. } => "pending_withdrawals_exist",
            AppError::InvalidState => "invalid_state",
            AppError::TokenExchangeFailed => "token_exchange_failed",
            AppError::IdentityFetchFailed => "identity_fetch_failed",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Database(_) => "database_error",
            AppError::InternalError(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidAmount
            | AppError::BelowMinimum(_)
            | AppError::InvalidDestination
            | AppError::InsufficientFunds
            | AppError::PendingWithdrawalsExist { .. }
            | AppError::InvalidState
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TokenExchangeFailed | AppError::IdentityFetchFailed => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Database(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Never leak database/internal details to the client.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Error interno".to_string()
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Error interno".to_string()
            }
            other => other.to_string(),
        };

        let body = match &self {
            AppError::PendingWithdrawalsExist { count } => Json(json!({
                "error": message,
                "code": self.code(),
                "pendingCount": count,
            })),
            _ => Json(json!({
                "error": message,
                "code": self.code(),
            })),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_request() {
        for err in [
            AppError::InvalidAmount,
            AppError::BelowMinimum(20000),
            AppError::InvalidDestination,
            AppError::InsufficientFunds,
            AppError::InvalidState,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_provider_errors_are_bad_gateway() {
        assert_eq!(
            AppError::TokenExchangeFailed.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::IdentityFetchFailed.into_response().status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AppError::InsufficientFunds.code(), "insufficient_funds");
        assert_eq!(
            AppError::PendingWithdrawalsExist { count: 2 }.code(),
            "pending_withdrawals_exist"
        );
    }
}
