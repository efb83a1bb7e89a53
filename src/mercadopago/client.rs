use failsafe::futures::CircuitBreaker;
use failsafe::{backoff, failure_policy, Config as FailsafeConfig, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;

#[derive(Error, Debug)]
pub enum MpError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("token exchange rejected: {0}")]
    TokenExchange(String),
    #[error("identity fetch rejected: {0}")]
    IdentityFetch(String),
    #[error("circuit breaker open - Mercado Pago API unavailable")]
    CircuitBreakerOpen,
}

/// Token set returned by the OAuth token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Subset of the `/users/me` identity response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpUser {
    pub id: i64,
    pub email: String,
}

/// HTTP client for the Mercado Pago OAuth and identity endpoints.
pub struct MpClient {
    client: Client,
    auth_base_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>,
}

impl MpClient {
    pub fn new(config: &Config) -> Self {
        Self::with_urls(
            config.mp_auth_url.clone(),
            config.mp_api_url.clone(),
            config.mp_client_id.clone(),
            config.mp_client_secret.clone(),
            config.mp_redirect_uri.clone(),
        )
    }

    /// Builds a client against explicit base URLs (tests point this at a mock
    /// server).
    pub fn with_urls(
        auth_base_url: String,
        api_base_url: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let backoff = backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));
        let policy = failure_policy::consecutive_failures(5, backoff);
        let circuit_breaker = FailsafeConfig::new().failure_policy(policy).build();

        MpClient {
            client,
            auth_base_url,
            api_base_url,
            client_id,
            client_secret,
            redirect_uri,
            circuit_breaker,
        }
    }

    /// Provider authorization URL the owner's browser is redirected to.
    pub fn authorization_url(&self, state: &str) -> Result<String, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}/authorization",
            self.auth_base_url.trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("state", state);
        Ok(url.to_string())
    }

    /// Server-to-server exchange of the authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet, MpError> {
        let url = format!("{}/oauth/token", self.api_base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let body = json!({
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "code": code,
            "grant_type": "authorization_code",
            "redirect_uri": self.redirect_uri,
        });

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.post(&url).json(&body).send().await?;

                if !response.status().is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(MpError::TokenExchange(detail));
                }

                let tokens = response.json::<TokenSet>().await?;
                Ok(tokens)
            })
            .await;

        match result {
            Ok(tokens) => Ok(tokens),
            Err(FailsafeError::Rejected) => Err(MpError::CircuitBreakerOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    /// Fetches the identity of the account the access token belongs to.
    pub async fn get_user(&self, access_token: &str) -> Result<MpUser, MpError> {
        let url = format!("{}/users/me", self.api_base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let bearer = format!("Bearer {}", access_token);

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).header("Authorization", bearer).send().await?;

                if !response.status().is_success() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(MpError::IdentityFetch(detail));
                }

                let user = response.json::<MpUser>().await?;
                Ok(user)
            })
            .await;

        match result {
            Ok(user) => Ok(user),
            Err(FailsafeError::Rejected) => Err(MpError::CircuitBreakerOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

impl Clone for MpClient {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            auth_base_url: self.auth_base_url.clone(),
            api_base_url: self.api_base_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            circuit_breaker: self.circuit_breaker.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(api_url: &str) -> MpClient {
        MpClient::with_urls(
            "https://auth.mercadopago.com.ar".to_string(),
            api_url.to_string(),
            "client-id".to_string(),
            "client-secret".to_string(),
            "https://app.example.com/payout/callback".to_string(),
        )
    }

    #[test]
    fn test_authorization_url_parameters() {
        let client = test_client("https://api.mercadopago.com");
        let url = client.authorization_url("opaque-state").unwrap();
        let parsed = Url::parse(&url).unwrap();

        assert!(url.starts_with("https://auth.mercadopago.com.ar/authorization?"));
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), "client-id".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("state".to_string(), "opaque-state".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://app.example.com/payout/callback".to_string()
        )));
    }

    #[tokio::test]
    async fn test_exchange_code_success() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"APP_USR-token","refresh_token":"TG-refresh","expires_in":21600}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let tokens = client.exchange_code("auth-code").await.unwrap();
        assert_eq!(tokens.access_token, "APP_USR-token");
        assert_eq!(tokens.expires_in, 21600);
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.exchange_code("bad-code").await;
        assert!(matches!(result, Err(MpError::TokenExchange(_))));
    }

    #[tokio::test]
    async fn test_get_user_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/me")
            .with_status(401)
            .with_body(r#"{"error":"unauthorized"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let result = client.get_user("stale-token").await;
        assert!(matches!(result, Err(MpError::IdentityFetch(_))));
    }
}
