//! Benchmark adapter for a CouchDB cluster.
//!
//! Exposes the harness's CRUD + scan contract. Every operation returns
//! either its result or one of a closed set of outcomes (`OpError`); no
//! transport error type crosses this boundary.
//!
//! # Example
//!
//! ```ignore
//! use bench_adapter::{AdapterConfig, CouchBenchAdapter};
//!
//! let config = AdapterConfig::from_yaml_file("couch-bench.yaml")?;
//! let adapter = CouchBenchAdapter::from_config(&config).await?;
//! adapter.insert("usertable", "user1", &record).await?;
//! ```

mod adapter;
mod config;
mod error;

pub use adapter::CouchBenchAdapter;
pub use config::{AdapterConfig, DEFAULT_DATABASE_NAME};
pub use error::{ConfigError, OpError, OpResult, Status};

pub use record_mapper::{FieldSet, MetadataProjection, Record};
