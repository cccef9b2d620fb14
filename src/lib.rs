//! couch-bench library
//!
//! A benchmark client for CouchDB clusters. Operations are spread over a
//! statically configured set of nodes: writes go to the first node and fail
//! over in order, reads rotate round-robin across all nodes.
//!
//! # Crates
//!
//! - `couch_client` - document model, store trait, per-node HTTP client
//! - `couch_connector` - load-balanced, failover-capable connector
//! - `record_mapper` - benchmark record <-> document conversion
//! - `bench_adapter` - CRUD + scan surface with closed outcome codes
//!
//! # CLI Usage
//!
//! ```bash
//! # Single operations
//! couch-bench --hosts 127.0.0.1:2222,127.0.0.1:3333 insert akey mapKey=mapValue
//! couch-bench --hosts 127.0.0.1:2222,127.0.0.1:3333 read akey
//!
//! # Load 10k records, then run a 50/50 read/update mix on 16 tasks
//! couch-bench --config couch-bench.yaml run \
//!   --record-count 10000 --operation-count 100000 --concurrency 16
//! ```

use anyhow::Context;
use bench_adapter::{AdapterConfig, Record};
use clap::Parser;
use std::path::PathBuf;

pub mod workload;

/// Cluster connection options.
///
/// Values given on the command line override those from `--config`.
#[derive(Parser, Clone, Debug, Default)]
pub struct CouchOpts {
    /// YAML file with adapter configuration
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Comma-separated node list, `host[:port]` (port defaults to 5984)
    #[arg(long, env = "COUCHDB_HOSTS")]
    pub hosts: Option<String>,

    /// Database all benchmark tables map to
    #[arg(long, env = "COUCHDB_DATABASE")]
    pub database: Option<String>,

    /// CouchDB username
    #[arg(long, env = "COUCHDB_USERNAME")]
    pub username: Option<String>,

    /// CouchDB password
    #[arg(long, env = "COUCHDB_PASSWORD")]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Return `_id`/`_rev` alongside the fields of every read
    #[arg(long)]
    pub include_metadata: bool,
}

impl CouchOpts {
    /// Resolve the adapter configuration from the config file and flags.
    pub fn to_config(&self) -> anyhow::Result<AdapterConfig> {
        let mut config = match &self.config {
            Some(path) => AdapterConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config from {path:?}"))?,
            None => AdapterConfig::default(),
        };

        if let Some(hosts) = &self.hosts {
            config = config.with_hosts(hosts);
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if self.username.is_some() {
            config.username = self.username.clone();
        }
        if self.password.is_some() {
            config.password = self.password.clone();
        }
        if let Some(timeout) = self.timeout {
            config.request_timeout_secs = timeout;
        }
        if self.include_metadata {
            config.include_metadata = true;
        }

        Ok(config)
    }
}

/// Parse `field=value` arguments into a record.
pub fn parse_field_values(pairs: &[String]) -> anyhow::Result<Record> {
    pairs
        .iter()
        .map(|pair| {
            let (field, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected field=value, got '{pair}'"))?;
            anyhow::ensure!(!field.is_empty(), "Empty field name in '{pair}'");
            Ok((field.to_string(), value.to_string()))
        })
        .collect()
}
