//! Error types for the load-balanced connector.

use couch_client::{NodeAddress, StoreError};
use thiserror::Error;

/// Errors surfaced by `LoadBalancedConnector`.
///
/// Transient node failures never appear here on their own: they are retried
/// on the remaining nodes and only reported as `Unreachable` once every node
/// has been tried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Construction was attempted with an empty node list.
    #[error("At least one node required")]
    NoNodes,

    /// A per-node client could not be built.
    #[error("Failed to build client for node {node}: {source}")]
    Client {
        node: NodeAddress,
        #[source]
        source: StoreError,
    },

    /// Authoritative answer from a node: the document does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Authoritative answer from a node: the revision is stale.
    #[error("Update conflict on document: {0}")]
    Conflict(String),

    /// Every node was tried and none answered.
    #[error("No node reachable for {operation} after {attempts} attempts; last error: {last_error}")]
    Unreachable {
        operation: &'static str,
        attempts: usize,
        last_error: String,
    },
}

impl From<StoreError> for ConnectorError {
    /// Outcome of a single dispatch taken as final.
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ConnectorError::NotFound(id),
            StoreError::Conflict(id) => ConnectorError::Conflict(id),
            other => ConnectorError::Unreachable {
                operation: "request",
                attempts: 1,
                last_error: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_outcomes() {
        assert_eq!(
            ConnectorError::from(StoreError::NotFound("akey".into())),
            ConnectorError::NotFound("akey".into())
        );
        assert_eq!(
            ConnectorError::from(StoreError::Conflict("akey".into())),
            ConnectorError::Conflict("akey".into())
        );
        assert!(matches!(
            ConnectorError::from(StoreError::Transport("refused".into())),
            ConnectorError::Unreachable { attempts: 1, .. }
        ));
    }
}
