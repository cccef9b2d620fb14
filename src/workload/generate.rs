//! Deterministic key, value and operation generation.

use bench_adapter::Record;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

/// Benchmark operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Update,
    Insert,
    Scan,
    Delete,
}

/// Relative weights of each operation in the run phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperationMix {
    pub read: f64,
    pub update: f64,
    pub insert: f64,
    pub scan: f64,
    pub delete: f64,
}

impl OperationMix {
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = [self.read, self.update, self.insert, self.scan, self.delete];
        anyhow::ensure!(
            weights.iter().all(|w| w.is_finite() && *w >= 0.0),
            "Operation proportions must be non-negative numbers"
        );
        anyhow::ensure!(
            weights.iter().sum::<f64>() > 0.0,
            "At least one operation proportion must be positive"
        );
        Ok(())
    }

    /// Pick an operation for a uniform sample `x` in `[0, 1)`.
    pub fn choose(&self, x: f64) -> Operation {
        let total = self.read + self.update + self.insert + self.scan + self.delete;
        let mut point = x * total;
        for (weight, operation) in [
            (self.read, Operation::Read),
            (self.update, Operation::Update),
            (self.insert, Operation::Insert),
            (self.scan, Operation::Scan),
        ] {
            if point < weight {
                return operation;
            }
            point -= weight;
        }
        if self.delete > 0.0 {
            Operation::Delete
        } else {
            Operation::Read
        }
    }
}

/// Per-task generator of keys and field values.
pub struct RecordGenerator {
    rng: StdRng,
    key_prefix: String,
    field_count: usize,
    field_length: usize,
}

impl RecordGenerator {
    pub fn new(seed: u64, key_prefix: &str, field_count: usize, field_length: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            key_prefix: key_prefix.to_string(),
            field_count,
            field_length,
        }
    }

    /// Key for record number `index`, e.g. `user42`.
    pub fn key(&self, index: u64) -> String {
        format!("{}{index}", self.key_prefix)
    }

    /// A full record with fields `field0..field{N-1}`.
    pub fn record(&mut self) -> Record {
        (0..self.field_count)
            .map(|i| (format!("field{i}"), self.value()))
            .collect()
    }

    /// A partial record overwriting one random field.
    pub fn update(&mut self) -> Record {
        let field = self.rng.random_range(0..self.field_count.max(1));
        let mut record = Record::new();
        record.insert(format!("field{field}"), self.value());
        record
    }

    /// Uniformly chosen index below `bound`.
    pub fn index_below(&mut self, bound: u64) -> u64 {
        self.rng.random_range(0..bound.max(1))
    }

    pub fn sample(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn value(&mut self) -> String {
        (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(self.field_length)
            .map(char::from)
            .collect()
    }
}
