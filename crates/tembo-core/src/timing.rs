//! Opt-in latency sampling for archive operations.
//!
//! A [`Stopwatch`] is owned by whoever drives the archive (the CLI, a
//! bench, a test). When disabled, [`Stopwatch::time`] just runs the closure.
//! When enabled, each call records one sample under its label and
//! [`Stopwatch::report`] summarises them as p50/p95/p99.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Environment variable that turns sampling on.
pub const TIMING_ENV: &str = "TEMBO_TIMING";

/// Whether `TEMBO_TIMING` holds a truthy value (`1`, `true`, `yes`, `on`).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var(TIMING_ENV)
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Collects per-label durations.
#[derive(Debug, Clone, Default)]
pub struct Stopwatch {
    enabled: bool,
    samples: BTreeMap<&'static str, Vec<Duration>>,
}

impl Stopwatch {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            samples: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run `f`, recording how long it took under `label` when enabled.
    pub fn time<R>(&mut self, label: &'static str, f: impl FnOnce() -> R) -> R {
        if !self.enabled {
            return f();
        }
        let started = Instant::now();
        let out = f();
        self.record(label, started.elapsed());
        out
    }

    /// Add an externally measured sample.
    pub fn record(&mut self, label: &'static str, elapsed: Duration) {
        if self.enabled {
            self.samples.entry(label).or_default().push(elapsed);
        }
    }

    /// Summarise and clear every recorded sample.
    pub fn report(&mut self) -> TimingReport {
        let operations = std::mem::take(&mut self.samples)
            .into_iter()
            .map(|(label, mut values)| {
                values.sort_unstable();
                let total = values.iter().sum();
                OpTiming {
                    label,
                    count: values.len(),
                    total,
                    p50: percentile(&values, 50),
                    p95: percentile(&values, 95),
                    p99: percentile(&values, 99),
                }
            })
            .collect();
        TimingReport { operations }
    }
}

/// Latency summary for one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpTiming {
    pub label: &'static str,
    pub count: usize,
    #[serde(serialize_with = "as_micros")]
    pub total: Duration,
    #[serde(serialize_with = "as_micros")]
    pub p50: Duration,
    #[serde(serialize_with = "as_micros")]
    pub p95: Duration,
    #[serde(serialize_with = "as_micros")]
    pub p99: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimingReport {
    pub operations: Vec<OpTiming>,
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Fixed-width table for terminal output.
    #[must_use]
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<24} {:>6} {:>10} {:>10} {:>10}",
            "operation", "count", "p50", "p95", "p99"
        );
        for op in &self.operations {
            let _ = writeln!(
                out,
                "{:<24} {:>6} {:>10} {:>10} {:>10}",
                op.label,
                op.count,
                format_duration(op.p50),
                format_duration(op.p95),
                format_duration(op.p99)
            );
        }
        out
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u128(d.as_micros())
}

/// Nearest-rank percentile over sorted values.
fn percentile(sorted: &[Duration], pct: usize) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros >= 1_000_000 {
        format!("{:.2}s", d.as_secs_f64())
    } else if micros >= 1_000 {
        format!("{:.2}ms", d.as_secs_f64() * 1_000.0)
    } else {
        format!("{micros}us")
    }
}
