use std::time::Duration;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// SQLite connection string, e.g. "sqlite:./quicklink.db"
    pub database_url: String,

    /// Upper bound on pooled SQLite connections
    pub database_max_connections: u32,

    /// Host to bind the HTTP server to, e.g. "0.0.0.0"
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public base URL used when building short and analytics links,
    /// e.g. "https://go.example.com". Never has a trailing slash.
    pub base_url: String,

    /// Where visitors hitting "/" are sent. `None` answers 404.
    pub root_redirect_url: Option<String>,

    /// How many generated codes to try before giving up.
    pub code_max_attempts: u32,

    /// Bound on each click-recording store call made behind a redirect.
    pub click_record_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./quicklink.db".into(),
            database_max_connections: 10,
            host: "0.0.0.0".into(),
            port: 3000,
            base_url: "http://localhost:3000".into(),
            root_redirect_url: None,
            code_max_attempts: 10,
            click_record_timeout: Duration::from_millis(2000),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables (populated by dotenvy before this is called).
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| defaults.port.to_string())
            .parse::<u16>()
            .context("PORT must be a valid port number (1–65535)")?;

        let database_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| defaults.database_max_connections.to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let code_max_attempts = std::env::var("CODE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| defaults.code_max_attempts.to_string())
            .parse::<u32>()
            .context("CODE_MAX_ATTEMPTS must be a positive integer")?;
        if code_max_attempts == 0 {
            anyhow::bail!("CODE_MAX_ATTEMPTS must be at least 1");
        }

        let click_record_timeout_ms = std::env::var("CLICK_RECORD_TIMEOUT_MS")
            .unwrap_or_else(|_| "2000".into())
            .parse::<u64>()
            .context("CLICK_RECORD_TIMEOUT_MS must be a number of milliseconds")?;

        let base_url = std::env::var("BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();

        let root_redirect_url = std::env::var("ROOT_REDIRECT_URL")
            .ok()
            .map(|u| u.trim().trim_end_matches('/').to_owned())
            .filter(|u| !u.is_empty());

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections,
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port,
            base_url,
            root_redirect_url,
            code_max_attempts,
            click_record_timeout: Duration::from_millis(click_record_timeout_ms),
        })
    }

    /// Public URL a visitor follows for `short_code`.
    pub fn short_url(&self, short_code: &str) -> String {
        format!("{}/{}", self.base_url, short_code)
    }

    /// Public URL of the analytics endpoint for `token`.
    pub fn analytics_url(&self, token: &str) -> String {
        format!("{}/analytics?token={}", self.base_url, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_built_from_base_url() {
        let config = AppConfig {
            base_url: "https://go.example.com".into(),
            ..AppConfig::default()
        };

        assert_eq!(config.short_url("aB3xY9"), "https://go.example.com/aB3xY9");
        assert_eq!(
            config.analytics_url("deadbeef"),
            "https://go.example.com/analytics?token=deadbeef"
        );
    }
}
