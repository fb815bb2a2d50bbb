use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use snafu::ResultExt;

use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::service::RetryPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default = "default_write_retries")]
    pub write_retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(flatten)]
    pub database: DatabaseConfig,
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    /// How often a conflicting enrollment write is re-fetched and reapplied.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.write_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_write_retries() -> usize {
    3
}

fn default_retry_delay_ms() -> u64 {
    10
}
