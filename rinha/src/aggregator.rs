//! Run-wide latency trends and check tally.
//!
//! This is the only state shared between workers. Latency samples go into a
//! lock-free [`AtomicBucket`] per endpoint; checks into per-name counters
//! behind a mutex. Reads never clear anything, so `summary()` is stable once
//! workers stop recording.
use metrics_util::AtomicBucket;
use rinha_core::{CheckCount, CheckSummary, Endpoint, EndpointSummary, Summary};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

const P95: f64 = 0.95;

pub struct Aggregator {
    trends: [Trend; 2],
    checks: Checks,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    pub fn new() -> Self {
        #[cfg(feature = "metrics")]
        for endpoint in Endpoint::ALL {
            metrics::describe_histogram!(
                endpoint.metric_name(),
                metrics::Unit::Milliseconds,
                "Request latency per endpoint"
            );
        }

        Self {
            trends: [Trend::new(), Trend::new()],
            checks: Checks::default(),
        }
    }

    /// Add one latency sample, in milliseconds.
    pub fn record(&self, endpoint: Endpoint, duration: f64) {
        self.trends[endpoint.index()].push(duration);

        #[cfg(feature = "metrics")]
        metrics::histogram!(endpoint.metric_name()).record(duration);
    }

    /// Tally one named check and return its outcome.
    pub fn check(&self, name: &str, passed: bool) -> bool {
        self.checks.record(name, passed);

        #[cfg(feature = "metrics")]
        {
            if passed {
                metrics::counter!("rinha.checks.passed").increment(1);
            } else {
                metrics::counter!("rinha.checks.failed").increment(1);
            }
        }

        passed
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for endpoint in Endpoint::ALL {
            *summary.get_mut(endpoint) = self.trends[endpoint.index()].summary();
        }
        summary
    }

    pub fn checks(&self) -> CheckSummary {
        self.checks.summary()
    }
}

struct Trend {
    samples: AtomicBucket<f64>,
}

impl Trend {
    fn new() -> Self {
        Self {
            samples: AtomicBucket::new(),
        }
    }

    fn push(&self, duration: f64) {
        self.samples.push(duration);
    }

    fn summary(&self) -> EndpointSummary {
        let mut samples = self.samples.data();
        samples.retain(|v| v.is_finite());
        summarize(&mut samples)
    }
}

fn summarize(samples: &mut [f64]) -> EndpointSummary {
    if samples.is_empty() {
        return EndpointSummary::default();
    }

    samples.sort_by(f64::total_cmp);

    EndpointSummary {
        avg: statistical::mean(samples),
        min: samples[0],
        max: samples[samples.len() - 1],
        p95: percentile(samples, P95),
        count: samples.len(),
    }
}

/// Linear interpolation between the closest ranks of an ascending, non-empty slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[derive(Default)]
struct Checks {
    passed: AtomicU64,
    failed: AtomicU64,
    by_name: Mutex<BTreeMap<String, CheckCount>>,
}

impl Checks {
    fn record(&self, name: &str, passed: bool) {
        // NOTE: Counters are only touched while holding the lock so that totals
        // and per-name counts never disagree in a summary.
        let mut by_name = self.by_name.lock().unwrap_or_else(PoisonError::into_inner);
        let count = by_name.entry(name.to_string()).or_default();
        if passed {
            count.passed += 1;
            self.passed.fetch_add(1, Ordering::Relaxed);
        } else {
            count.failed += 1;
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn summary(&self) -> CheckSummary {
        let by_name = self.by_name.lock().unwrap_or_else(PoisonError::into_inner);
        CheckSummary {
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            by_name: by_name.clone(),
        }
    }
}
