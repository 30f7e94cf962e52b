//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub verification: VerificationConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "social.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://social.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Token signing secret (32+ bytes)
    pub token_secret: String,
    /// Access token lifetime in seconds (default: 3600 = 1h)
    pub access_token_ttl: i64,
    /// Refresh token lifetime in seconds (default: 604800 = 7 days)
    pub refresh_token_ttl: i64,
}

/// Verification flow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationConfig {
    /// Length of each verification code
    pub code_length: usize,
    /// Email code lifetime in seconds (default: 180 = 3 min)
    pub email_code_ttl: i64,
    /// SMS code lifetime in seconds (default: 300 = 5 min)
    pub sms_code_ttl: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (LUMAGRAM_*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.protocol", "http")?
            .set_default("server.domain", "localhost")?
            .set_default("auth.access_token_ttl", 3600)?
            .set_default("auth.refresh_token_ttl", 604800)?
            .set_default("verification.code_length", 4)?
            .set_default("verification.email_code_ttl", 180)?
            .set_default("verification.sms_code_ttl", 300)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (LUMAGRAM_*)
            .add_source(
                Environment::with_prefix("LUMAGRAM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Validate configuration invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        if self.auth.token_secret.len() < 32 {
            return Err(crate::error::AppError::Config(
                "auth.token_secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.auth.access_token_ttl <= 0 || self.auth.refresh_token_ttl <= 0 {
            return Err(crate::error::AppError::Config(
                "auth token lifetimes must be positive".to_string(),
            ));
        }
        if self.verification.code_length == 0 {
            return Err(crate::error::AppError::Config(
                "verification.code_length must be positive".to_string(),
            ));
        }
        if self.verification.email_code_ttl <= 0 || self.verification.sms_code_ttl <= 0 {
            return Err(crate::error::AppError::Config(
                "verification code lifetimes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
