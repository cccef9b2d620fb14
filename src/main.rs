//! Command-line interface for couch-bench
//!
//! # Usage Examples
//!
//! ## Single Operations
//! ```bash
//! couch-bench --hosts 127.0.0.1:5984,127.0.0.1:5985 insert akey mapKey=mapValue
//! couch-bench --hosts 127.0.0.1:5984,127.0.0.1:5985 read akey --fields mapKey
//! couch-bench --hosts 127.0.0.1:5984 update akey mapKey=updatedMapValue
//! couch-bench --hosts 127.0.0.1:5984 scan user --count 10
//! couch-bench --hosts 127.0.0.1:5984 delete akey
//! ```
//!
//! ## Workload
//! ```bash
//! couch-bench --config couch-bench.yaml run \
//!   --record-count 10000 --operation-count 100000 \
//!   --read-proportion 0.95 --update-proportion 0.05 \
//!   --concurrency 16
//! ```
//!
//! Every single operation prints a JSON object with its outcome code and
//! exits non-zero unless the outcome is `OK`.

use bench_adapter::{CouchBenchAdapter, FieldSet, OpResult, Status, DEFAULT_DATABASE_NAME};
use clap::{Parser, Subcommand};
use couch_bench::workload::{run_workload, WorkloadOpts};
use couch_bench::{parse_field_values, CouchOpts};
use serde::Serialize;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "couch-bench")]
#[command(about = "A benchmark client for load-balanced CouchDB clusters")]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    couch: CouchOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one record
    Read {
        key: String,

        /// Only return these fields (comma-separated)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
        table: String,
    },

    /// Insert a new record from `field=value` pairs
    Insert {
        key: String,

        #[arg(value_name = "FIELD=VALUE")]
        values: Vec<String>,

        #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
        table: String,
    },

    /// Overwrite fields of an existing record
    Update {
        key: String,

        #[arg(value_name = "FIELD=VALUE", required = true)]
        values: Vec<String>,

        #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
        table: String,
    },

    /// Delete one record
    Delete {
        key: String,

        #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
        table: String,
    },

    /// Read records in key order starting at a key
    Scan {
        start_key: String,

        /// Maximum number of records
        #[arg(long, default_value_t = 10)]
        count: usize,

        /// Only return these fields (comma-separated)
        #[arg(long, value_delimiter = ',')]
        fields: Option<Vec<String>>,

        #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
        table: String,
    },

    /// Load records, then run a mixed operation workload
    Run {
        #[command(flatten)]
        workload: WorkloadOpts,
    },
}

#[derive(Serialize)]
struct OperationOutput<T: Serialize> {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.couch.to_config()?;
    let adapter = CouchBenchAdapter::from_config(&config).await?;

    match cli.command {
        Commands::Read { key, fields, table } => {
            let fields = to_field_set(fields);
            report(adapter.read(&table, &key, fields.as_ref()).await)
        }
        Commands::Insert { key, values, table } => {
            let record = parse_field_values(&values)?;
            report(adapter.insert(&table, &key, &record).await)
        }
        Commands::Update { key, values, table } => {
            let values = parse_field_values(&values)?;
            report(adapter.update(&table, &key, &values).await)
        }
        Commands::Delete { key, table } => report(adapter.delete(&table, &key).await),
        Commands::Scan {
            start_key,
            count,
            fields,
            table,
        } => {
            let fields = to_field_set(fields);
            report(adapter.scan(&table, &start_key, count, fields.as_ref()).await)
        }
        Commands::Run { workload } => {
            let report = run_workload(Arc::new(adapter), &workload).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn to_field_set(fields: Option<Vec<String>>) -> Option<FieldSet> {
    fields.map(|fields| fields.into_iter().collect())
}

/// Print the outcome as JSON; fail unless it is `OK`.
fn report<T: Serialize>(result: OpResult<T>) -> anyhow::Result<()> {
    let status = Status::of(&result);
    let output = match result {
        Ok(value) => OperationOutput {
            status,
            result: Some(value),
            error: None,
        },
        Err(e) => OperationOutput {
            status,
            result: None,
            error: Some(e.to_string()),
        },
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    anyhow::ensure!(status.is_ok(), "Operation finished with {status}");
    Ok(())
}
