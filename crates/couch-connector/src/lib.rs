//! Load-balanced connector over a statically configured CouchDB cluster.
//!
//! Writes go to the first node (the primary) and fail over in order; reads
//! rotate across all nodes. Nodes are assumed to be full replicas of the
//! same logical database, kept consistent outside this client.

mod connector;
mod error;

pub use connector::LoadBalancedConnector;
pub use error::ConnectorError;
