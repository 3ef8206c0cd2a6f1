use serde::Deserialize;

/// Signing configuration for the two token scopes. The app and api secrets
/// must be distinct: a token minted for one scope must never verify under
/// the other scope's key.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub app_secret: String,
    pub api_secret: String,
    pub token_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            app_secret: std::env::var("APP_SECRET_KEY")?,
            api_secret: std::env::var("API_SECRET_KEY")?,
            token_ttl_days: std::env::var("ACCESS_TOKEN_EXPIRE_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
        };
        anyhow::ensure!(
            auth.app_secret != auth.api_secret,
            "APP_SECRET_KEY and API_SECRET_KEY must differ"
        );
        Ok(Self { database_url, auth })
    }
}
