//! Translation metrics and observability module.
//!
//! Process-wide counters for traversal decisions and provider traffic,
//! exposed through the HTTP `/metrics` endpoint.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Leaf strings that became multilingual values
    leaves_translated: AtomicUsize,

    /// Strings passed through by the skip classifier
    strings_skipped: AtomicUsize,

    /// Nodes passed through because an exclusion pattern matched
    nodes_excluded: AtomicUsize,

    /// Objects returned as-is because they re-entered themselves
    cycles_broken: AtomicUsize,

    /// Requests sent to a translation provider
    provider_calls: AtomicUsize,

    /// Provider requests that failed after retries
    provider_failures: AtomicUsize,

    /// Language entries that fell back to the source text
    fallbacks: AtomicUsize,
}

static METRICS: OnceLock<TranslationMetrics> = OnceLock::new();

impl TranslationMetrics {
    /// A standalone set of counters, all zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the global translation metrics instance.
    pub fn global() -> &'static TranslationMetrics {
        METRICS.get_or_init(TranslationMetrics::new)
    }

    pub fn record_leaf_translated(&self) {
        self.leaves_translated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_string_skipped(&self) {
        self.strings_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_node_excluded(&self) {
        self.nodes_excluded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cycle_broken(&self) {
        self.cycles_broken.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fallbacks(&self, count: usize) {
        self.fallbacks.fetch_add(count, Ordering::Relaxed);
    }

    pub fn leaves_translated(&self) -> usize {
        self.leaves_translated.load(Ordering::Relaxed)
    }

    pub fn strings_skipped(&self) -> usize {
        self.strings_skipped.load(Ordering::Relaxed)
    }

    pub fn nodes_excluded(&self) -> usize {
        self.nodes_excluded.load(Ordering::Relaxed)
    }

    pub fn cycles_broken(&self) -> usize {
        self.cycles_broken.load(Ordering::Relaxed)
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn provider_failures(&self) -> usize {
        self.provider_failures.load(Ordering::Relaxed)
    }

    pub fn fallbacks(&self) -> usize {
        self.fallbacks.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let calls = self.provider_calls();
        let failures = self.provider_failures();
        let provider_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            leaves_translated: self.leaves_translated(),
            strings_skipped: self.strings_skipped(),
            nodes_excluded: self.nodes_excluded(),
            cycles_broken: self.cycles_broken(),
            provider_calls: calls,
            provider_failures: failures,
            provider_success_rate,
            fallbacks: self.fallbacks(),
        }
    }
}

/// Snapshot of the translation counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub leaves_translated: usize,
    pub strings_skipped: usize,
    pub nodes_excluded: usize,
    pub cycles_broken: usize,
    pub provider_calls: usize,
    pub provider_failures: usize,
    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,
    pub fallbacks: usize,
}
