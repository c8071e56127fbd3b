use std::env;
use std::fmt;
use std::time::Duration;

use auth::HashingCost;
use auth::ThrottleConfig;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    pub throttle: ThrottleSettings,
    pub users: UsersConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

/// Credential store target.
///
/// A `postgres://` URL selects PostgreSQL, `memory://` the in-process store.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl DatabaseConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with("memory://")
    }
}

/// Longest accepted token lifetime: one year.
const MAX_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

impl JwtConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds)
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

/// Argon2id cost applied to newly hashed passwords.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl PasswordConfig {
    pub fn cost(&self) -> HashingCost {
        HashingCost {
            memory_kib: self.memory_kib,
            iterations: self.iterations,
            parallelism: self.parallelism,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThrottleSettings {
    pub window_seconds: u64,
    pub max_requests: u32,
    /// Use the first `X-Forwarded-For` entry as client identity.
    /// Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_header: bool,
}

impl ThrottleSettings {
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig {
            window: Duration::from_secs(self.window_seconds),
            max_requests: self.max_requests,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UsersConfig {
    pub enforce_unique_email: bool,
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (IDENTITY__JWT__SECRET, IDENTITY__DATABASE__URL, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    /// 4. Built-in defaults (everything except the database URL and signing secret)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .set_default("server.http_port", 5000)?
            .set_default("jwt.ttl_seconds", 3600)?
            .set_default("password.memory_kib", HashingCost::default().memory_kib)?
            .set_default("password.iterations", HashingCost::default().iterations)?
            .set_default("password.parallelism", HashingCost::default().parallelism)?
            .set_default("throttle.window_seconds", 900)?
            .set_default("throttle.max_requests", 100)?
            .set_default("throttle.trust_forwarded_header", false)?
            .set_default("users.enforce_unique_email", true)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: IDENTITY__JWT__SECRET=... overrides jwt.secret
            .add_source(
                Environment::with_prefix("IDENTITY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values that would silently disable a guarantee.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message(
                "jwt.secret must be provided (IDENTITY__JWT__SECRET)".to_string(),
            ));
        }
        if self.jwt.ttl_seconds <= 0 || self.jwt.ttl_seconds > MAX_TTL_SECONDS {
            return Err(ConfigError::Message(format!(
                "jwt.ttl_seconds must be between 1 and {}",
                MAX_TTL_SECONDS
            )));
        }
        if self.throttle.window_seconds == 0 || self.throttle.max_requests == 0 {
            return Err(ConfigError::Message(
                "throttle.window_seconds and throttle.max_requests must be positive".to_string(),
            ));
        }
        if self.database.url.is_empty() {
            return Err(ConfigError::Message("database.url must be provided".to_string()));
        }
        Ok(())
    }
}
