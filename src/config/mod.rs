pub mod profiles;

use dotenvy::dotenv;
use profiles::{Profile, ProfileDefaults};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Base URL of the dashboard, used for building redirect targets.
    pub app_url: String,
    /// Base URL of the external auth collaborator that resolves bearer tokens.
    pub auth_url: String,
    pub mp_client_id: String,
    pub mp_client_secret: String,
    pub mp_redirect_uri: String,
    pub mp_auth_url: String,
    pub mp_api_url: String,
    /// HMAC key for signing the OAuth state parameter.
    pub state_secret: String,
    pub cors_allowed_origins: Option<String>,
}

pub struct ConfigInfo {
    pub config: Config,
    pub profile: Profile,
    pub overrides: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<ConfigInfo> {
        dotenv().ok();

        let profile = Profile::from_env();
        let defaults = ProfileDefaults::for_profile(profile);
        let mut overrides = Vec::new();

        let mut optional = |name: &str, default: String| -> String {
            match env::var(name) {
                Ok(v) => {
                    overrides.push(name.to_string());
                    v
                }
                Err(_) => default,
            }
        };

        let server_port = optional("SERVER_PORT", defaults.server_port.to_string())
            .parse()
            .unwrap_or(defaults.server_port);
        let app_url = optional("APP_URL", defaults.app_url);
        let auth_url = optional("AUTH_URL", defaults.auth_url);
        let mp_auth_url = optional("MP_AUTH_URL", defaults.mp_auth_url);
        let mp_api_url = optional("MP_API_URL", defaults.mp_api_url);
        let mp_redirect_uri = optional(
            "MP_REDIRECT_URI",
            format!("{}/payout/callback", app_url.trim_end_matches('/')),
        );
        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(v) => {
                overrides.push("CORS_ALLOWED_ORIGINS".to_string());
                Some(v)
            }
            Err(_) => defaults.cors_allowed_origins,
        };

        let required = |name: &str| -> anyhow::Result<String> {
            env::var(name).map_err(|_| anyhow::anyhow!("{} must be set", name))
        };

        let database_url = required("DATABASE_URL")?;
        let mp_client_id = required("MP_CLIENT_ID")?;
        let mp_client_secret = required("MP_CLIENT_SECRET")?;
        let state_secret = required("STATE_SECRET")?;

        Ok(ConfigInfo {
            config: Config {
                server_port,
                database_url,
                app_url,
                auth_url,
                mp_client_id,
                mp_client_secret,
                mp_redirect_uri,
                mp_auth_url,
                mp_api_url,
                state_secret,
                cors_allowed_origins,
            },
            profile,
            overrides,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::profiles::{Profile, ProfileDefaults};

    #[test]
    fn test_profile_defaults() {
        let dev = ProfileDefaults::for_profile(Profile::Development);
        assert_eq!(dev.server_port, 3000);
        assert!(dev.cors_allowed_origins.is_none());

        let prod = ProfileDefaults::for_profile(Profile::Production);
        assert_eq!(prod.server_port, 8080);
        assert!(prod.cors_allowed_origins.is_some());
    }

    #[test]
    fn test_profile_as_str() {
        assert_eq!(Profile::Development.as_str(), "development");
        assert_eq!(Profile::Staging.as_str(), "staging");
        assert_eq!(Profile::Production.as_str(), "production");
    }
}
