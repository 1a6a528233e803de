//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// Bearer session lifetime: 30 days.
pub const SESSION_TTL_SECONDS: i64 = 30 * 24 * 3600;

/// Password reset token lifetime: 1 hour.
pub const RESET_TOKEN_TTL_SECONDS: i64 = 3600;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Shared secret expected on payment webhook calls. Verification is
    /// skipped (with a warning) when unset.
    pub webhook_secret: Option<String>,
    /// Front-end base URL, used in password reset emails.
    pub frontend_url: String,
    /// Admin account seeded at startup, if both are set.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// SMTP relay for transactional email. Log-only mailer when unset.
    pub smtp: Option<SmtpConfig>,
}

/// SMTP relay settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8080` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:care.db?mode=rwc` |
    /// | `PAYMENT_WEBHOOK_SECRET` | Webhook shared secret | (unset: skip check) |
    /// | `APP_FRONTEND_URL` | Front-end base URL | `http://localhost:5173` |
    /// | `ADMIN_EMAIL` / `ADMIN_PASSWORD` | Seeded admin account | (unset: no seed) |
    /// | `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM` | SMTP relay | (unset: log-only) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:care.db?mode=rwc".to_string());

        let webhook_secret = env::var("PAYMENT_WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        let frontend_url =
            env::var("APP_FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let admin_email = env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty());
        let admin_password = env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty());

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) if !host.is_empty() => {
                let port = env::var("SMTP_PORT")
                    .unwrap_or_else(|_| "587".to_string())
                    .parse()
                    .map_err(|_| ConfigError::InvalidSmtpPort)?;
                let username = env::var("SMTP_USERNAME").unwrap_or_default();
                let password = env::var("SMTP_PASSWORD").unwrap_or_default();
                let from = env::var("EMAIL_FROM")
                    .ok()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| username.clone());
                Some(SmtpConfig {
                    host,
                    port,
                    username,
                    password,
                    from,
                })
            }
            _ => None,
        };

        Ok(Self {
            addr,
            database_url,
            webhook_secret,
            frontend_url,
            admin_email,
            admin_password,
            smtp,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("Invalid SMTP_PORT value")]
    InvalidSmtpPort,
}
