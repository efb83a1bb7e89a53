#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Staging,
    Production,
}

impl Profile {
    pub fn from_env() -> Self {
        std::env::var("APP_PROFILE")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "development" | "dev" => Some(Self::Development),
                "staging" | "stage" => Some(Self::Staging),
                "production" | "prod" => Some(Self::Production),
                _ => None,
            })
            .unwrap_or(Self::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProfileDefaults {
    pub server_port: u16,
    pub app_url: String,
    pub auth_url: String,
    pub mp_auth_url: String,
    pub mp_api_url: String,
    pub cors_allowed_origins: Option<String>,
}

impl ProfileDefaults {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Development => Self {
                server_port: 3000,
                app_url: "http://localhost:3000".to_string(),
                auth_url: "http://localhost:9999".to_string(),
                mp_auth_url: "https://auth.mercadopago.com.ar".to_string(),
                mp_api_url: "https://api.mercadopago.com".to_string(),
                cors_allowed_origins: None,
            },
            Profile::Staging => Self {
                server_port: 8080,
                app_url: "https://staging.parkit.example.com".to_string(),
                auth_url: "https://auth.staging.parkit.example.com".to_string(),
                mp_auth_url: "https://auth.mercadopago.com.ar".to_string(),
                mp_api_url: "https://api.mercadopago.com".to_string(),
                cors_allowed_origins: Some("https://staging.parkit.example.com".to_string()),
            },
            Profile::Production => Self {
                server_port: 8080,
                app_url: "https://app.parkit.example.com".to_string(),
                auth_url: "https://auth.parkit.example.com".to_string(),
                mp_auth_url: "https://auth.mercadopago.com.ar".to_string(),
                mp_api_url: "https://api.mercadopago.com".to_string(),
                cors_allowed_origins: Some("https://app.parkit.example.com".to_string()),
            },
        }
    }
}
