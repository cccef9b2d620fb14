//! Load-then-run benchmark workload.
//!
//! The load phase inserts `record_count` records keyed `{prefix}0..`. The run
//! phase then issues `operation_count` operations drawn from the configured
//! mix, spread over `concurrency` tasks. Every outcome is counted per
//! operation kind; non-ok outcomes never abort the run.

mod generate;
mod metrics;

pub use generate::{Operation, OperationMix, RecordGenerator};
pub use metrics::{OperationStats, OperationSummary, PhaseSummary, WorkloadMetrics};

use bench_adapter::{CouchBenchAdapter, Status, DEFAULT_DATABASE_NAME};
use clap::Args;
use couch_client::DocumentStore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Workload shape.
#[derive(Args, Clone, Debug)]
pub struct WorkloadOpts {
    /// Records inserted by the load phase
    #[arg(long, default_value_t = 1000)]
    pub record_count: u64,

    /// Operations issued by the run phase
    #[arg(long, default_value_t = 1000)]
    pub operation_count: u64,

    /// Fields per record
    #[arg(long, default_value_t = 10)]
    pub field_count: usize,

    /// Length of each generated field value
    #[arg(long, default_value_t = 100)]
    pub field_length: usize,

    /// Number of concurrent worker tasks
    #[arg(long, default_value_t = 8)]
    pub concurrency: usize,

    #[arg(long, default_value_t = 0.5)]
    pub read_proportion: f64,

    #[arg(long, default_value_t = 0.5)]
    pub update_proportion: f64,

    #[arg(long, default_value_t = 0.0)]
    pub insert_proportion: f64,

    #[arg(long, default_value_t = 0.0)]
    pub scan_proportion: f64,

    #[arg(long, default_value_t = 0.0)]
    pub delete_proportion: f64,

    /// Upper bound on records returned by one scan
    #[arg(long, default_value_t = 100)]
    pub max_scan_length: usize,

    /// Seed for deterministic data generation
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Skip the load phase (records already present)
    #[arg(long)]
    pub skip_load: bool,

    /// Table name passed to every operation
    #[arg(long, default_value = DEFAULT_DATABASE_NAME)]
    pub table: String,

    /// Prefix of generated record keys
    #[arg(long, default_value = "user")]
    pub key_prefix: String,
}

impl WorkloadOpts {
    pub fn mix(&self) -> OperationMix {
        OperationMix {
            read: self.read_proportion,
            update: self.update_proportion,
            insert: self.insert_proportion,
            scan: self.scan_proportion,
            delete: self.delete_proportion,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.concurrency > 0, "Concurrency must be at least 1");
        anyhow::ensure!(self.max_scan_length > 0, "Max scan length must be at least 1");
        self.mix().validate()
    }

    /// Share of `total` handled by worker `task`.
    fn share(&self, total: u64, task: usize) -> u64 {
        let workers = self.concurrency as u64;
        let task = task as u64;
        total / workers + u64::from(task < total % workers)
    }
}

/// Result of a complete workload run.
#[derive(Debug, Clone, Serialize)]
pub struct WorkloadReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<PhaseSummary>,
    pub run: PhaseSummary,
}

/// Run the load phase (unless skipped) followed by the run phase.
pub async fn run_workload<S>(
    adapter: Arc<CouchBenchAdapter<S>>,
    opts: &WorkloadOpts,
) -> anyhow::Result<WorkloadReport>
where
    S: DocumentStore + 'static,
{
    opts.validate()?;

    let load = if opts.skip_load {
        None
    } else {
        Some(load_phase(adapter.clone(), opts).await?)
    };
    let run = run_phase(adapter, opts).await?;

    Ok(WorkloadReport { load, run })
}

async fn load_phase<S>(
    adapter: Arc<CouchBenchAdapter<S>>,
    opts: &WorkloadOpts,
) -> anyhow::Result<PhaseSummary>
where
    S: DocumentStore + 'static,
{
    info!(
        "Loading {} records with {} tasks",
        opts.record_count, opts.concurrency
    );
    let started = Instant::now();
    let mut handles = Vec::with_capacity(opts.concurrency);

    for task in 0..opts.concurrency {
        let adapter = adapter.clone();
        let opts = opts.clone();
        handles.push(tokio::spawn(async move {
            let mut generator = RecordGenerator::new(
                opts.seed.wrapping_add(task as u64),
                &opts.key_prefix,
                opts.field_count,
                opts.field_length,
            );
            let mut metrics = WorkloadMetrics::default();
            let workers = opts.concurrency as u64;

            let mut index = task as u64;
            while index < opts.record_count {
                let key = generator.key(index);
                let record = generator.record();
                let op_started = Instant::now();
                let result = adapter.insert(&opts.table, &key, &record).await;
                let status = Status::of(&result);
                if let Err(e) = &result {
                    debug!("load insert {key} failed: {e}");
                }
                metrics.record(Operation::Insert, status, op_started.elapsed());
                index += workers;
            }
            metrics
        }));
    }

    let metrics = collect(handles).await?;
    let summary = metrics.summary("load", started.elapsed());
    info!(
        "Load phase done: {} records, {} failed, {:.1} ops/sec",
        summary.operations, summary.failed, summary.throughput_ops_per_sec
    );
    Ok(summary)
}

async fn run_phase<S>(
    adapter: Arc<CouchBenchAdapter<S>>,
    opts: &WorkloadOpts,
) -> anyhow::Result<PhaseSummary>
where
    S: DocumentStore + 'static,
{
    info!(
        "Running {} operations with {} tasks",
        opts.operation_count, opts.concurrency
    );
    let mix = opts.mix();
    let next_insert = Arc::new(AtomicU64::new(opts.record_count));
    let started = Instant::now();
    let mut handles = Vec::with_capacity(opts.concurrency);

    for task in 0..opts.concurrency {
        let adapter = adapter.clone();
        let opts = opts.clone();
        let next_insert = next_insert.clone();
        let operations = opts.share(opts.operation_count, task);
        handles.push(tokio::spawn(async move {
            // Distinct stream from the load phase.
            let seed = opts.seed.wrapping_add(opts.concurrency as u64 + task as u64);
            let mut generator = RecordGenerator::new(
                seed,
                &opts.key_prefix,
                opts.field_count,
                opts.field_length,
            );
            let mut metrics = WorkloadMetrics::default();

            for _ in 0..operations {
                let operation = mix.choose(generator.sample());
                let index = generator.index_below(next_insert.load(Ordering::Relaxed));
                let key = generator.key(index);
                let op_started = Instant::now();

                let status = match operation {
                    Operation::Read => Status::of(&adapter.read(&opts.table, &key, None).await),
                    Operation::Update => {
                        let values = generator.update();
                        Status::of(&adapter.update(&opts.table, &key, &values).await)
                    }
                    Operation::Insert => {
                        let key = generator.key(next_insert.fetch_add(1, Ordering::Relaxed));
                        let record = generator.record();
                        Status::of(&adapter.insert(&opts.table, &key, &record).await)
                    }
                    Operation::Scan => {
                        let count = generator.index_below(opts.max_scan_length as u64) as usize + 1;
                        Status::of(&adapter.scan(&opts.table, &key, count, None).await)
                    }
                    Operation::Delete => Status::of(&adapter.delete(&opts.table, &key).await),
                };
                metrics.record(operation, status, op_started.elapsed());
            }
            metrics
        }));
    }

    let metrics = collect(handles).await?;
    let summary = metrics.summary("run", started.elapsed());
    info!(
        "Run phase done: {} operations, {} failed, {:.1} ops/sec",
        summary.operations, summary.failed, summary.throughput_ops_per_sec
    );
    Ok(summary)
}

async fn collect(
    handles: Vec<tokio::task::JoinHandle<WorkloadMetrics>>,
) -> anyhow::Result<WorkloadMetrics> {
    let mut total = WorkloadMetrics::default();
    for metrics in futures::future::try_join_all(handles).await? {
        total.merge(&metrics);
    }
    Ok(total)
}
