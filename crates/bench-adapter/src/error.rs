//! Outcome codes and configuration errors.

use couch_client::AddressError;
use couch_connector::ConnectorError;
use record_mapper::MapperError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Non-ok outcome of a benchmark operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unreachable: {0}")]
    Unreachable(String),

    #[error("Malformed data: {0}")]
    Malformed(String),
}

pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    pub fn status(&self) -> Status {
        match self {
            OpError::NotFound(_) => Status::NotFound,
            OpError::Conflict(_) => Status::Conflict,
            OpError::Unreachable(_) => Status::Unreachable,
            OpError::Malformed(_) => Status::Malformed,
        }
    }
}

impl From<ConnectorError> for OpError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::NotFound(id) => OpError::NotFound(id),
            ConnectorError::Conflict(id) => OpError::Conflict(id),
            other => OpError::Unreachable(other.to_string()),
        }
    }
}

impl From<MapperError> for OpError {
    fn from(err: MapperError) -> Self {
        OpError::Malformed(err.to_string())
    }
}

/// Outcome code reported to the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    NotFound,
    Conflict,
    Unreachable,
    Malformed,
}

impl Status {
    pub fn of<T>(result: &OpResult<T>) -> Self {
        match result {
            Ok(_) => Status::Ok,
            Err(e) => e.status(),
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Unreachable => write!(f, "UNREACHABLE"),
            Self::Malformed => write!(f, "MALFORMED"),
        }
    }
}

/// Errors that keep the adapter from entering service.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No hosts configured")]
    NoHosts,

    #[error(transparent)]
    InvalidHost(#[from] AddressError),

    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}
