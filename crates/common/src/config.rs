//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
    /// Administrator accounts seeded at boot.
    #[serde(default)]
    pub seed_admins: Vec<SeedAdminConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Authentication configuration.
///
/// The signing secret is injected into the auth service at construction;
/// nothing reads it from ambient process state after startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret used to sign access and refresh tokens.
    pub secret: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: i64,
    /// Refresh token lifetime in seconds.
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: i64,
}

/// An administrator account created at boot when its email is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdminConfig {
    /// Display name.
    pub username: String,
    /// Login email.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

/// One day.
const fn default_access_ttl_secs() -> i64 {
    24 * 60 * 60
}

/// Thirty days.
const fn default_refresh_ttl_secs() -> i64 {
    30 * 24 * 60 * 60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `COHORT_ENV`)
    /// 3. Environment variables with `COHORT_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("COHORT_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("COHORT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("COHORT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
