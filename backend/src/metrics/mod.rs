use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded database operation timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: String, // "list" | "get" | "insert" | "update" | "delete" | "seed" | "import"
    pub entity: String,    // "brands" | "products"
    pub duration_ns: u64,
    pub duration_ms: f64,
    pub row_count: usize,
}

impl MetricEntry {
    pub fn new(
        operation: impl Into<String>,
        entity: impl Into<String>,
        elapsed: Duration,
        row_count: usize,
    ) -> Self {
        let duration_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        Self {
            timestamp: Utc::now(),
            operation: operation.into(),
            entity: entity.into(),
            duration_ns,
            duration_ms: duration_ns as f64 / 1_000_000.0,
            row_count,
        }
    }
}

/// Default number of entries kept before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 10_000;

/// In-memory ring of the most recent timing entries collected across requests.
#[derive(Debug)]
pub struct MetricsStore {
    pub entries: VecDeque<MetricEntry>,
    capacity: usize,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn record(
        &mut self,
        operation: impl Into<String>,
        entity: impl Into<String>,
        elapsed: Duration,
        row_count: usize,
    ) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries
            .push_back(MetricEntry::new(operation, entity, elapsed, row_count));
    }

    /// Aggregate stats per (operation, entity) pair.
    pub fn aggregated(&self) -> Vec<AggregatedMetric> {
        let mut map: HashMap<(&str, &str), Vec<u64>> = HashMap::new();

        for e in &self.entries {
            map.entry((e.operation.as_str(), e.entity.as_str()))
                .or_default()
                .push(e.duration_ns);
        }

        let mut out: Vec<AggregatedMetric> = map
            .into_iter()
            .map(|((op, entity), mut durations)| {
                durations.sort_unstable();
                let count = durations.len();
                let total: u64 = durations.iter().sum();
                let avg = total / count as u64;
                let pick = |q: f64| durations[((count as f64 * q) as usize).min(count - 1)];

                AggregatedMetric {
                    operation: op.to_string(),
                    entity: entity.to_string(),
                    sample_count: count,
                    min_ns: durations[0],
                    max_ns: durations[count - 1],
                    avg_ns: avg,
                    p50_ns: pick(0.50),
                    p95_ns: pick(0.95),
                    p99_ns: pick(0.99),
                    avg_ms: avg as f64 / 1_000_000.0,
                }
            })
            .collect();

        out.sort_by(|a, b| a.entity.cmp(&b.entity).then(a.operation.cmp(&b.operation)));
        out
    }

    /// Export all entries as a CSV string.
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "timestamp",
            "operation",
            "entity",
            "duration_ns",
            "duration_ms",
            "row_count",
        ])?;

        for e in &self.entries {
            wtr.write_record([
                e.timestamp.to_rfc3339(),
                e.operation.clone(),
                e.entity.clone(),
                e.duration_ns.to_string(),
                format!("{:.6}", e.duration_ms),
                e.row_count.to_string(),
            ])?;
        }

        let data = wtr.into_inner()?;
        Ok(String::from_utf8(data)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedMetric {
    pub operation: String,
    pub entity: String,
    pub sample_count: usize,
    pub min_ns: u64,
    pub max_ns: u64,
    pub avg_ns: u64,
    pub p50_ns: u64,
    pub p95_ns: u64,
    pub p99_ns: u64,
    pub avg_ms: f64,
}
