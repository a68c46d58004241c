use crate::errors::{AppError, AppResult};
use dotenvy::dotenv;
use std::{env, str::FromStr};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// When unset the service runs against the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub sweep_interval_secs: u64,
    pub expiry_warning_days: i64,
    pub conflict_retry_attempts: u32,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenv().ok();

        Ok(Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: parse_or("SERVER_PORT", 3000)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 20)?,
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| AppError::Validation("JWT_SECRET must be set".to_string()))?,
            jwt_expiry_hours: parse_or("JWT_EXPIRY_HOURS", 24)?,
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 86_400)?,
            expiry_warning_days: parse_or("EXPIRY_WARNING_DAYS", 30)?,
            conflict_retry_attempts: parse_or("CONFLICT_RETRY_ATTEMPTS", 3)?,
        })
    }

    /// Settings for tests and local tooling: in-memory storage, short-lived secret.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            database_url: None,
            database_max_connections: 1,
            jwt_secret: jwt_secret.to_string(),
            jwt_expiry_hours: 1,
            sweep_interval_secs: 86_400,
            expiry_warning_days: 30,
            conflict_retry_attempts: 3,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("{key} must be a valid number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}
