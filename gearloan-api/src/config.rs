/// Configuration management
///
/// All settings come from environment variables (a `.env` file is loaded first
/// when present).
///
/// # Environment Variables
///
/// | Variable | Default | Notes |
/// |---|---|---|
/// | `API_HOST` | `0.0.0.0` | |
/// | `API_PORT` | `8080` | |
/// | `API_PRODUCTION` | `false` | Enables HSTS |
/// | `CORS_ORIGINS` | `*` | Comma-separated list |
/// | `DATABASE_URL` | required | |
/// | `DATABASE_MAX_CONNECTIONS` | `10` | |
/// | `JWT_SECRET` | required | At least 32 characters |
/// | `LOAN_DURATION_HOURS` | `8` | |
/// | `BOOTSTRAP_ADMIN_EMAIL` | unset | Registers this email as admin |
/// | `LOG_FORMAT` | `pretty` | `pretty` or `json` |

use serde::{Deserialize, Serialize};
use std::env;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub lending: LendingConfig,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode (adds Strict-Transport-Security)
    pub production: bool,

    /// Allowed CORS origins (`*` allows any)
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing)]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LendingConfig {
    /// How long a borrow lasts before it is overdue
    pub loan_duration_hours: i64,

    /// Email that is made admin when it registers
    pub bootstrap_admin_email: Option<String>,
}

impl LendingConfig {
    pub fn loan_duration(&self) -> chrono::Duration {
        chrono::Duration::hours(self.loan_duration_hours)
    }

    /// Whether `email` is the bootstrap admin (case-insensitive)
    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.bootstrap_admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = get_or("API_HOST", "0.0.0.0");
        let port = get_or("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let production = parse_bool(&get_or("API_PRODUCTION", "false"))
            .ok_or_else(|| anyhow::anyhow!("API_PRODUCTION must be true or false"))?;

        let cors_origins = get_or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = get_or("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let loan_duration_hours = get_or("LOAN_DURATION_HOURS", "8")
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("LOAN_DURATION_HOURS is invalid: {}", e))?;

        if loan_duration_hours <= 0 {
            anyhow::bail!("LOAN_DURATION_HOURS must be positive");
        }

        let bootstrap_admin_email = lookup("BOOTSTRAP_ADMIN_EMAIL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let log_format = match get_or("LOG_FORMAT", "pretty").to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "json" => LogFormat::Json,
            other => anyhow::bail!("LOG_FORMAT must be pretty or json, got {}", other),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            lending: LendingConfig {
                loan_duration_hours,
                bootstrap_admin_email,
            },
            log_format,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
