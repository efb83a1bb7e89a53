//! Request-scoped principal resolution.
//!
//! Session storage itself is owned by the external auth collaborator; this
//! module consults it once per request to turn a bearer token into an owner
//! id, which every service operation then receives explicitly.

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;

/// Authenticated owner identity for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub owner_id: Uuid,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Resolves a bearer token to the owner it belongs to, or
    /// `AppError::Unauthorized`.
    async fn verify(&self, bearer_token: &str) -> Result<Principal, AppError>;
}

/// Verifier backed by the auth provider's user-info endpoint.
pub struct HttpSessionVerifier {
    client: Client,
    auth_url: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    id: Uuid,
}

impl HttpSessionVerifier {
    pub fn new(auth_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self { client, auth_url }
    }
}

#[async_trait]
impl SessionVerifier for HttpSessionVerifier {
    async fn verify(&self, bearer_token: &str) -> Result<Principal, AppError> {
        let url = format!("{}/user", self.auth_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", bearer_token))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Auth provider unreachable: {}", e);
                AppError::Unauthorized
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized);
        }

        let user: UserInfo = response.json().await.map_err(|_| AppError::Unauthorized)?;
        Ok(Principal { owner_id: user.id })
    }
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        let headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc123"));
        assert!(bearer_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());
    }

    #[tokio::test]
    async fn test_http_verifier_resolves_user() {
        let mut server = mockito::Server::new_async().await;
        let owner = Uuid::new_v4();
        let _mock = server
            .mock("GET", "/user")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"{{"id":"{}"}}"#, owner))
            .create_async()
            .await;

        let verifier = HttpSessionVerifier::new(server.url());
        let principal = verifier.verify("some-token").await.unwrap();
        assert_eq!(principal.owner_id, owner);
    }

    #[tokio::test]
    async fn test_http_verifier_rejects_invalid_session() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/user")
            .with_status(401)
            .create_async()
            .await;

        let verifier = HttpSessionVerifier::new(server.url());
        let result = verifier.verify("bad-token").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
