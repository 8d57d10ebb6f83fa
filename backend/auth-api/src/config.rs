//! Configuration for the auth API
//!
//! Loads settings from:
//! 1. Environment variables
//! 2. .env file (local development)
//!
//! `Settings` is built once in `main` and handed to each component
//! constructor; nothing reads the environment after startup.

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use std::env;

/// Application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub security: SecuritySettings,
    pub cors: CorsSettings,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Settings {
            server: ServerSettings::from_env()?,
            database: DatabaseSettings::from_env()?,
            security: SecuritySettings::from_env()?,
            cors: CorsSettings::from_env(),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    /// Seconds an idle connection is kept before being closed
    pub idle_timeout: u64,
    /// Seconds to wait when acquiring a connection
    pub connection_timeout: u64,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
            idle_timeout: env::var("DATABASE_IDLE_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid DATABASE_IDLE_TIMEOUT")?,
            connection_timeout: env::var("DATABASE_CONNECTION_TIMEOUT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("Invalid DATABASE_CONNECTION_TIMEOUT")?,
        })
    }
}

/// Token signing and password hashing settings
#[derive(Debug, Clone)]
pub struct SecuritySettings {
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub bcrypt_cost: u32,
}

impl SecuritySettings {
    fn from_env() -> Result<Self> {
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.is_empty() {
            return Err(anyhow!("JWT_SECRET must not be empty"));
        }

        let expires_in = env::var("JWT_EXPIRES_IN").unwrap_or_else(|_| "1h".to_string());

        let bcrypt_cost: u32 = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("Invalid BCRYPT_COST")?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(anyhow!("BCRYPT_COST must be between 4 and 31"));
        }

        Ok(Self {
            jwt_secret,
            jwt_expires_in: parse_duration(&expires_in)
                .with_context(|| format!("Invalid JWT_EXPIRES_IN: {expires_in}"))?,
            bcrypt_cost,
        })
    }
}

/// Cross-origin settings for the browser client
#[derive(Debug, Clone)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl CorsSettings {
    fn from_env() -> Self {
        let origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".to_string());

        Self {
            allowed_origins: origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

/// Parse a token lifetime such as `"1h"`, `"30m"`, `"7d"`, `"45s"` or a bare
/// number of seconds.
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (amount, unit) = raw.split_at(split);

    let amount: i64 = amount
        .parse()
        .map_err(|_| anyhow!("expected a leading number in {raw:?}"))?;

    let duration = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Duration::seconds(amount),
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::minutes(amount),
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::hours(amount),
        "d" | "day" | "days" => Duration::days(amount),
        "w" | "week" | "weeks" => Duration::weeks(amount),
        other => return Err(anyhow!("unknown duration unit {other:?}")),
    };

    if duration <= Duration::zero() {
        return Err(anyhow!("duration must be positive"));
    }

    Ok(duration)
}
