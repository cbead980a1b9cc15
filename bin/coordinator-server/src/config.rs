//! Configuration management for the multisig coordinator server.
//!
//! This module provides configuration loading from both base configuration file
//! and environment variables. Environment variables override the base configuration
//! and use the prefix `TZMULTISIG_`.

use core::{num::NonZeroUsize, time::Duration};

use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use url::Url;

/// Loads the application configuration from base config and environment variables.
///
/// Environment variables use double underscores `__` to denote nested keys.
/// For example, `TZMULTISIG_APP__LISTEN` corresponds to `app.listen`.
///
/// # Errors
///
/// Returns an error when a source cannot be read or a value has the wrong type.
pub fn get_configuration() -> Result<Config, ConfigError> {
    config::Config::builder()
        .add_source(File::from_str(include_str!("base_config.ron"), FileFormat::Ron))
        .add_source(
            Environment::with_prefix(Config::CONFIG_ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?
        .try_deserialize()
}

/// Root configuration structure containing all application settings.
#[derive(Deserialize)]
pub struct Config {
    /// Application-specific configuration
    pub app: AppConfig,

    /// Database configuration
    pub db: DbConfig,

    /// Node and indexer configuration
    pub tezos: TezosConfig,
}

/// Application-specific configuration settings.
#[derive(Deserialize)]
pub struct AppConfig {
    /// The address to listen on (e.g., "0.0.0.0:59059")
    pub listen: String,

    /// CORS allowed origins (e.g., ["http://localhost:3000", "https://example.com"])
    /// Use ["*"] to allow all origins
    pub cors_allowed_origins: Vec<String>,
}

/// Database configuration settings.
#[derive(Deserialize)]
pub struct DbConfig {
    /// The database connection URL
    pub db_url: String,

    /// Maximum number of database connections in the pool
    pub max_conn: NonZeroUsize,
}

/// Node and indexer settings.
#[derive(Deserialize)]
pub struct TezosConfig {
    /// Base URL of the node RPC, with a trailing slash
    pub node_url: Url,

    /// Base URL of the TzKT indexer API, with a trailing slash
    pub indexer_url: Url,

    /// Request timeout duration
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Pause between two synchronizations of every tracked contract
    #[serde(with = "humantime_serde")]
    pub sync_interval: Duration,
}

impl Config {
    const CONFIG_ENV_PREFIX: &str = "TZMULTISIG";
}
