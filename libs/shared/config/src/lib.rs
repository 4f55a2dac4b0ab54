use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub identity_provider_url: String,
    pub identity_provider_api_key: String,
    pub encryption_master_key: String,
    pub redis_url: Option<String>,
    pub audit_flush_threshold: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            identity_provider_url: env::var("IDENTITY_PROVIDER_URL")
                .unwrap_or_else(|_| {
                    warn!("IDENTITY_PROVIDER_URL not set, using empty value");
                    String::new()
                }),
            identity_provider_api_key: env::var("IDENTITY_PROVIDER_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("IDENTITY_PROVIDER_API_KEY not set, using empty value");
                    String::new()
                }),
            encryption_master_key: env::var("ENCRYPTION_MASTER_KEY")
                .unwrap_or_else(|_| {
                    warn!("ENCRYPTION_MASTER_KEY not set, using empty value");
                    String::new()
                }),
            redis_url: env::var("REDIS_URL").ok(),
            audit_flush_threshold: env::var("AUDIT_FLUSH_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(100),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.identity_provider_url.is_empty()
            && !self.identity_provider_api_key.is_empty()
            && !self.encryption_master_key.is_empty()
    }

    pub fn is_shared_store_configured(&self) -> bool {
        self.redis_url.is_some()
    }
}
