//! Storage node addresses.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Port CouchDB listens on when none is given.
pub const DEFAULT_COUCHDB_PORT: u16 = 5984;

/// Errors from parsing a `host[:port]` string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid host specified: '{0}'")]
    InvalidHost(String),

    #[error("Invalid port number specified: '{0}'")]
    InvalidPort(String),
}

/// Address of one member of the storage cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    pub host: String,
    pub port: u16,
}

impl NodeAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL of the node's HTTP API, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Parse a comma-separated list such as `"10.0.0.1,10.0.0.2:5985"`.
    ///
    /// Every entry must be a valid address; empty entries are rejected.
    pub fn parse_list(hosts: &str) -> Result<Vec<NodeAddress>, AddressError> {
        hosts.split(',').map(str::parse).collect()
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.split_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .ok()
                    .filter(|p| *p != 0)
                    .ok_or_else(|| AddressError::InvalidPort(s.to_string()))?;
                (host, port)
            }
            None => (s, DEFAULT_COUCHDB_PORT),
        };

        if host.is_empty() || host.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(AddressError::InvalidHost(s.to_string()));
        }

        Ok(NodeAddress::new(host, port))
    }
}
