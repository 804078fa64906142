//! Client configuration: where the REST service lives, socket timeouts,
//! TLS leniency, and the paging parameters of the batch executor.
//!
//! Every field has a default, so a partial configuration file (or none at
//! all) is valid. Configuration belongs to one [crate::OpencgaClient];
//! differently-configured clients may coexist in the same process.

use crate::errors::OpencgaError;
use crate::types::HostUrl;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "http://localhost:8080/opencga";
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 1000;
pub const DEFAULT_TIMEOUT: u64 = 10000;
pub const DEFAULT_BATCH_QUERY_SIZE: usize = 2000;
pub const DEFAULT_LIMIT: usize = 2000;
pub const DEFAULT_SKIP: usize = 0;
/// Uploads and downloads wait this many times longer than other requests.
pub const TRANSFER_TIMEOUT_FACTOR: u32 = 10;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientConfiguration {
    #[serde(default)]
    pub rest: RestConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    #[serde(default = "default_host")]
    pub host: HostUrl,

    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Read timeout in milliseconds. Also sent to the server as the
    /// advisory `timeout` query parameter.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Timeout in milliseconds of uploads and downloads. Defaults to
    /// [TRANSFER_TIMEOUT_FACTOR] times `timeout`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_timeout: Option<u64>,

    /// Accept self-signed or otherwise invalid server certificates.
    #[serde(default)]
    pub tls_allow_invalid_certificates: bool,

    #[serde(default)]
    pub query: QueryRestConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRestConfig {
    /// Largest page the server will return for a single request.
    #[serde(default = "default_batch_query_size")]
    pub batch_query_size: usize,

    /// Number of results fetched when the caller does not say.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_host() -> HostUrl {
    HostUrl::from_static(DEFAULT_HOST)
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT
}

fn default_batch_query_size() -> usize {
    DEFAULT_BATCH_QUERY_SIZE
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
            transfer_timeout: None,
            tls_allow_invalid_certificates: false,
            query: Default::default(),
        }
    }
}

impl Default for QueryRestConfig {
    fn default() -> Self {
        Self {
            batch_query_size: DEFAULT_BATCH_QUERY_SIZE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ClientConfiguration {
    /// Configuration pointing at the given host, otherwise default.
    pub fn with_host(host: HostUrl) -> Self {
        Self {
            rest: RestConfig {
                host,
                ..Default::default()
            },
        }
    }

    /// Read configuration from a file. A missing file is created with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OpencgaError> {
        Ok(confy::load_path(path)?)
    }

    /// Write configuration to a file.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), OpencgaError> {
        Ok(confy::store_path(path, self)?)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.rest.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.rest.timeout)
    }

    pub fn transfer_timeout(&self) -> Duration {
        match self.rest.transfer_timeout {
            Some(ms) => Duration::from_millis(ms),
            None => self.read_timeout() * TRANSFER_TIMEOUT_FACTOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ClientConfiguration::default();
        assert_eq!(config.rest.host.as_str(), DEFAULT_HOST);
        assert_eq!(config.connect_timeout(), Duration::from_millis(1000));
        assert_eq!(config.read_timeout(), Duration::from_millis(10000));
        assert_eq!(config.rest.query.batch_query_size, 2000);
        assert_eq!(config.rest.query.limit, 2000);
        assert_eq!(config.transfer_timeout(), Duration::from_millis(100000));
        assert!(!config.rest.tls_allow_invalid_certificates);
    }

    #[test]
    fn test_transfer_timeout_follows_read_timeout() {
        let mut config = ClientConfiguration::default();
        config.rest.timeout = 3000;
        assert_eq!(config.transfer_timeout(), Duration::from_secs(30));
        config.rest.transfer_timeout = Some(600000);
        assert_eq!(config.transfer_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_store_then_load() -> Result<(), OpencgaError> {
        let tmp_dir = TempDir::new().map_err(|e| OpencgaError::client(e.to_string()))?;
        let path = tmp_dir.path().join("client.ron");
        let mut config = ClientConfiguration::with_host(HostUrl::from_static(
            "https://ws.opencb.org/opencga-prod",
        ));
        config.rest.query.batch_query_size = 500;
        config.rest.tls_allow_invalid_certificates = true;
        config.rest.transfer_timeout = Some(120000);
        config.store(&path)?;
        assert_eq!(ClientConfiguration::load(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_gives_defaults() -> Result<(), OpencgaError> {
        let tmp_dir = TempDir::new().map_err(|e| OpencgaError::client(e.to_string()))?;
        let config = ClientConfiguration::load(tmp_dir.path().join("absent.ron"))?;
        assert_eq!(config, ClientConfiguration::default());
        Ok(())
    }
}
