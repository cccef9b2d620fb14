//! Adapter configuration.

use crate::ConfigError;
use couch_client::{ClientOptions, NodeAddress, DEFAULT_REQUEST_TIMEOUT_SECS};
use record_mapper::MetadataProjection;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Database every benchmark table maps to.
pub const DEFAULT_DATABASE_NAME: &str = "usertable";

/// Configuration for connecting the adapter to a cluster.
///
/// ```yaml
/// hosts: "10.0.0.1,10.0.0.2:5985"   # or a YAML list
/// database: usertable
/// username: admin
/// password: secret
/// request_timeout_secs: 30
/// include_metadata: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Node addresses in `host[:port]` form; the first one is the write primary.
    #[serde(deserialize_with = "deserialize_hosts")]
    pub hosts: Vec<String>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
    /// Return `_id`/`_rev` with every read.
    pub include_metadata: bool,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            username: None,
            password: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            include_metadata: false,
        }
    }
}

impl AdapterConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Replace the host list with a comma-separated `host[:port]` string.
    pub fn with_hosts(mut self, hosts: &str) -> Self {
        self.hosts = split_hosts(hosts);
        self
    }

    /// Parse the configured host list.
    pub fn nodes(&self) -> Result<Vec<NodeAddress>, ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        self.hosts
            .iter()
            .map(|host| host.parse().map_err(ConfigError::from))
            .collect()
    }

    /// Per-node client options. Empty credentials count as absent.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            username: non_empty(&self.username),
            password: non_empty(&self.password),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn projection(&self) -> MetadataProjection {
        if self.include_metadata {
            MetadataProjection::Include
        } else {
            MetadataProjection::Strip
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

fn split_hosts(hosts: &str) -> Vec<String> {
    hosts.split(',').map(|h| h.trim().to_string()).collect()
}

fn deserialize_hosts<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Hosts {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Hosts::deserialize(deserializer)? {
        Hosts::Joined(hosts) => split_hosts(&hosts),
        Hosts::List(hosts) => hosts,
    })
}
