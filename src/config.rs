use std::env;
use std::time::Duration;

use crate::errors::AppError;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Owner recorded on courts registered without an explicit owner.
    pub owner_email: String,
    pub store_timeout: Duration,
    pub cors_allow_any: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "courtbook.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            owner_email: env::var("OWNER_EMAIL").unwrap_or_default(),
            store_timeout: Duration::from_millis(
                env::var("STORE_TIMEOUT_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5000),
            ),
            cors_allow_any: env::var("CORS_ALLOW_ANY")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.admin_token.trim().is_empty() {
            return Err(AppError::Config("ADMIN_TOKEN must not be empty".into()));
        }
        if self.store_timeout.is_zero() {
            return Err(AppError::Config("STORE_TIMEOUT_MS must be greater than zero".into()));
        }
        Ok(())
    }
}
