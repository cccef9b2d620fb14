//! CouchDB client building blocks for the benchmark driver.
//!
//! Provides the document model, the error taxonomy raised by a storage node,
//! node address parsing, the narrow `DocumentStore` capability trait and
//! `CouchNodeClient`, an HTTP implementation of that trait for one node.

mod document;
mod error;
mod http;
mod node;
pub mod testing;
mod traits;

pub use document::{Document, DocumentError, RangeQuery, ViewRow, ID_FIELD, REV_FIELD};
pub use error::StoreError;
pub use http::{ClientOptions, CouchNodeClient, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use node::{AddressError, NodeAddress, DEFAULT_COUCHDB_PORT};
pub use traits::DocumentStore;
