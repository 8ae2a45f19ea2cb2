//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub auth: AuthConfig,
    pub rental: RentalConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Comma-separated CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://127.0.0.1:3000".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Redis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,

    /// Default TTL for cached items in seconds
    #[serde(default = "default_cache_ttl")]
    pub default_ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    300
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret for the admin API
    pub jwt_secret: String,

    /// JWT token expiration in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_secs: i64,
}

fn default_jwt_expiration() -> i64 {
    1800
}

/// Number rental configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RentalConfig {
    /// Rental window for a number request in minutes
    #[serde(default = "default_rental_ttl")]
    pub ttl_minutes: i64,

    /// Interval between expiry sweep runs in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Timeout for upstream number provider calls in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Subscriber digits appended after the country phone code
    #[serde(default = "default_subscriber_digits")]
    pub subscriber_digits: usize,

    /// TTL for cached price entries in seconds
    #[serde(default = "default_price_cache_ttl")]
    pub price_cache_ttl_secs: u64,
}

fn default_rental_ttl() -> i64 {
    20
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_provider_timeout() -> u64 {
    10
}

fn default_subscriber_digits() -> usize {
    10
}

fn default_price_cache_ttl() -> u64 {
    300
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default(
                "server.cors_origins",
                "http://localhost:3000,http://127.0.0.1:3000",
            )?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("redis.default_ttl_secs", 300)?
            .set_default("auth.jwt_expiration_secs", 1800)?
            .set_default("rental.ttl_minutes", 20)?
            .set_default("rental.sweep_interval_secs", 60)?
            .set_default("rental.provider_timeout_secs", 10)?
            .set_default("rental.subscriber_digits", 10)?
            .set_default("rental.price_cache_ttl_secs", 300)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with NUMIO_ prefix
            .add_source(
                Environment::with_prefix("NUMIO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for RentalConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 20,
            sweep_interval_secs: 60,
            provider_timeout_secs: 10,
            subscriber_digits: 10,
            price_cache_ttl_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rental_config() {
        let config = RentalConfig::default();
        assert_eq!(config.ttl_minutes, 20);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.subscriber_digits, 10);
    }
}
