//! Latency and outcome accounting for workload phases

use super::generate::Operation;
use bench_adapter::Status;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Counters for a single operation kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OperationStats {
    pub count: u64,
    pub min_latency_us: u64,
    pub max_latency_us: u64,
    #[serde(skip)]
    total_latency_us: u64,
    pub statuses: BTreeMap<Status, u64>,
}

impl OperationStats {
    fn record(&mut self, status: Status, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        if self.count == 0 || micros < self.min_latency_us {
            self.min_latency_us = micros;
        }
        self.max_latency_us = self.max_latency_us.max(micros);
        self.total_latency_us = self.total_latency_us.saturating_add(micros);
        self.count += 1;
        *self.statuses.entry(status).or_default() += 1;
    }

    fn merge(&mut self, other: &OperationStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 || other.min_latency_us < self.min_latency_us {
            self.min_latency_us = other.min_latency_us;
        }
        self.max_latency_us = self.max_latency_us.max(other.max_latency_us);
        self.total_latency_us = self.total_latency_us.saturating_add(other.total_latency_us);
        self.count += other.count;
        for (status, count) in &other.statuses {
            *self.statuses.entry(*status).or_default() += count;
        }
    }

    pub fn avg_latency_us(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_latency_us as f64 / self.count as f64
        }
    }

    pub fn status_count(&self, status: Status) -> u64 {
        self.statuses.get(&status).copied().unwrap_or(0)
    }
}

/// Metrics gathered by one worker task; merged after the phase ends.
#[derive(Debug, Clone, Default)]
pub struct WorkloadMetrics {
    operations: BTreeMap<Operation, OperationStats>,
}

impl WorkloadMetrics {
    pub fn record(&mut self, operation: Operation, status: Status, latency: Duration) {
        self.operations
            .entry(operation)
            .or_default()
            .record(status, latency);
    }

    pub fn merge(&mut self, other: &WorkloadMetrics) {
        for (operation, stats) in &other.operations {
            self.operations.entry(*operation).or_default().merge(stats);
        }
    }

    pub fn get(&self, operation: Operation) -> Option<&OperationStats> {
        self.operations.get(&operation)
    }

    pub fn total_operations(&self) -> u64 {
        self.operations.values().map(|s| s.count).sum()
    }

    pub fn total_with_status(&self, status: Status) -> u64 {
        self.operations
            .values()
            .map(|s| s.status_count(status))
            .sum()
    }

    /// Summarize the phase for reporting.
    pub fn summary(&self, phase: &str, elapsed: Duration) -> PhaseSummary {
        let secs = elapsed.as_secs_f64();
        let total = self.total_operations();
        let throughput = if secs > 0.0 { total as f64 / secs } else { 0.0 };

        PhaseSummary {
            phase: phase.to_string(),
            operations: total,
            failed: total - self.total_with_status(Status::Ok),
            elapsed_secs: secs,
            throughput_ops_per_sec: throughput,
            per_operation: self
                .operations
                .iter()
                .map(|(op, stats)| {
                    (
                        *op,
                        OperationSummary {
                            count: stats.count,
                            min_latency_us: stats.min_latency_us,
                            avg_latency_us: stats.avg_latency_us(),
                            max_latency_us: stats.max_latency_us,
                            statuses: stats.statuses.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationSummary {
    pub count: u64,
    pub min_latency_us: u64,
    pub avg_latency_us: f64,
    pub max_latency_us: u64,
    pub statuses: BTreeMap<Status, u64>,
}

/// Serializable result of one workload phase (load or run).
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub phase: String,
    pub operations: u64,
    pub failed: u64,
    pub elapsed_secs: f64,
    pub throughput_ops_per_sec: f64,
    pub per_operation: BTreeMap<Operation, OperationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_min_avg_max() {
        let mut metrics = WorkloadMetrics::default();
        metrics.record(Operation::Read, Status::Ok, Duration::from_micros(30));
        metrics.record(Operation::Read, Status::Ok, Duration::from_micros(10));
        metrics.record(Operation::Read, Status::NotFound, Duration::from_micros(20));

        let stats = metrics.get(Operation::Read).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.min_latency_us, 10);
        assert_eq!(stats.max_latency_us, 30);
        assert_eq!(stats.avg_latency_us(), 20.0);
        assert_eq!(stats.status_count(Status::Ok), 2);
        assert_eq!(stats.status_count(Status::NotFound), 1);
    }

    #[test]
    fn test_merge_combines_workers() {
        let mut a = WorkloadMetrics::default();
        a.record(Operation::Update, Status::Ok, Duration::from_micros(50));
        let mut b = WorkloadMetrics::default();
        b.record(Operation::Update, Status::Conflict, Duration::from_micros(5));
        b.record(Operation::Insert, Status::Ok, Duration::from_micros(7));

        a.merge(&b);
        let update = a.get(Operation::Update).unwrap();
        assert_eq!(update.count, 2);
        assert_eq!(update.min_latency_us, 5);
        assert_eq!(update.max_latency_us, 50);
        assert_eq!(a.total_operations(), 3);
        assert_eq!(a.total_with_status(Status::Ok), 2);
    }

    #[test]
    fn test_summary_serializes_status_codes() {
        let mut metrics = WorkloadMetrics::default();
        metrics.record(Operation::Read, Status::Ok, Duration::from_millis(1));
        metrics.record(Operation::Read, Status::Unreachable, Duration::from_millis(1));

        let summary = metrics.summary("run", Duration::from_secs(2));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.throughput_ops_per_sec, 1.0);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["per_operation"]["read"]["statuses"]["OK"], 1);
        assert_eq!(json["per_operation"]["read"]["statuses"]["UNREACHABLE"], 1);
    }
}
