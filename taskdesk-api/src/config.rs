/// Configuration management for the API server
///
/// Configuration is loaded from environment variables, with a `.env` file
/// read first when present (development).
///
/// # Environment Variables
///
/// | Variable | Default | Notes |
/// |---|---|---|
/// | `API_HOST` | `0.0.0.0` | |
/// | `API_PORT` | `8080` | |
/// | `APP_ENV` | `development` | `development` or `production` |
/// | `DATABASE_URL` | | required |
/// | `DATABASE_MAX_CONNECTIONS` | `10` | |
/// | `JWT_SECRET` | | required, at least 32 characters |
/// | `JWT_EXPIRES_HOURS` | `24` | 1 to 8760 |
/// | `JWT_ISSUER` | `taskdesk` | |
/// | `JWT_AUDIENCE` | `taskdesk-clients` | |
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::config::Config;
///
/// let config = Config::from_env().expect("Failed to load configuration");
/// println!("Server will listen on {}", config.bind_address());
/// ```

use std::env;
use std::str::FromStr;

use taskdesk_shared::auth::jwt::{JwtConfig, DEFAULT_AUDIENCE, DEFAULT_EXPIRES_HOURS, DEFAULT_ISSUER, MAX_EXPIRES_HOURS};
use taskdesk_shared::db::pool::DatabaseConfig;

/// Minimum signing key length
pub const MIN_SECRET_LENGTH: usize = 32;

/// Deployment environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Environment {
    /// Detailed error messages in responses
    #[default]
    Development,

    /// Server errors are reported generically
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => anyhow::bail!("APP_ENV must be development or production, got {}", other),
        }
    }
}

/// Complete API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    pub database: DatabaseConfig,

    pub jwt: JwtConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,

    pub port: u16,

    pub environment: Environment,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a value does not
    /// parse, or `JWT_SECRET` is shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("API_PORT", "8080").parse::<u16>()?;
        let environment = var("APP_ENV", "development").parse::<Environment>()?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10").parse::<u32>()?;

        let secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if secret.len() < MIN_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_SECRET_LENGTH);
        }

        let expires_hours = var("JWT_EXPIRES_HOURS", &DEFAULT_EXPIRES_HOURS.to_string()).parse::<i64>()?;
        if !(1..=MAX_EXPIRES_HOURS).contains(&expires_hours) {
            anyhow::bail!("JWT_EXPIRES_HOURS must be between 1 and {}", MAX_EXPIRES_HOURS);
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port,
                environment,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                ..Default::default()
            },
            jwt: JwtConfig {
                secret_key: secret,
                expires_hours,
                issuer: var("JWT_ISSUER", DEFAULT_ISSUER),
                audience: var("JWT_AUDIENCE", DEFAULT_AUDIENCE),
            },
        })
    }

    /// `host:port` to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
