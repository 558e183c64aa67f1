// src/tracker.rs
//! # Source Performance Tracker
//!
//! Per-source rolling window of request outcomes and the derived metrics the
//! router ranks on. The window is bounded (default 100 samples, oldest
//! evicted) and every derived value is recomputed on record, so reads are
//! always consistent with the latest outcome.
//!
//! Updates arrive concurrently from in-flight collector calls; a single
//! mutex serializes the read-then-write of the window.

use serde::Serialize;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use crate::catalog::{SourceCatalog, SourceKind};

/// Samples retained per source.
pub const HISTORY_WINDOW: usize = 100;

/// Priority score weights: reliability dominates, latency is secondary,
/// raw yield is a tiebreaker only. Manually tuned; recalibration against
/// real outcome data is an open question.
pub const WEIGHT_SUCCESS: f32 = 0.5;
pub const WEIGHT_SPEED: f32 = 0.3;
pub const WEIGHT_YIELD: f32 = 0.2;

/// Response time at which the speed term bottoms out.
pub const SPEED_NORM_SECS: f32 = 30.0;
/// Yield at which the jobs-found term saturates.
pub const YIELD_NORM_JOBS: f32 = 20.0;

/// Below this success rate a source is unavailable outright.
pub const MIN_AVAILABLE_SUCCESS_RATE: f32 = 0.3;
/// Circuit breaker: this many failures with success rate below
/// `BREAKER_SUCCESS_RATE` also trips unavailability.
pub const BREAKER_FAILURES: u32 = 5;
pub const BREAKER_SUCCESS_RATE: f32 = 0.2;

#[derive(Debug, Clone, Copy)]
struct Sample {
    ts_unix: u64,
    success: bool,
    response_secs: f32,
    jobs_found: u32,
}

#[derive(Debug, Default)]
struct SourceHistory {
    samples: VecDeque<Sample>,
    /// Set by the router's adaptive loop; overrides the window-derived flag.
    forced_unavailable: bool,
}

/// Derived metrics for one source over its current window.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMetrics {
    pub source_id: String,
    pub success_rate: f32,
    pub avg_response_secs: f32,
    pub avg_jobs_found: f32,
    pub last_used: u64,
    pub failure_count: u32,
    pub total_requests: u32,
    pub available: bool,
    pub priority_score: f32,
}

/// Composite 0–1 priority from the three normalized terms.
pub fn priority_score(success_rate: f32, avg_response_secs: f32, avg_jobs_found: f32) -> f32 {
    let speed = (1.0 - avg_response_secs / SPEED_NORM_SECS).max(0.0);
    let yield_ = (avg_jobs_found / YIELD_NORM_JOBS).min(1.0);
    WEIGHT_SUCCESS * success_rate + WEIGHT_SPEED * speed + WEIGHT_YIELD * yield_
}

/// Thread-safe tracker over per-source rolling windows.
///
/// Constructor-injected wherever it is needed (router, engine); never a
/// process-wide singleton.
#[derive(Debug)]
pub struct PerformanceTracker {
    inner: Mutex<HashMap<String, SourceHistory>>,
    window: usize,
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::with_window(HISTORY_WINDOW)
    }
}

impl PerformanceTracker {
    pub fn with_window(window: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            window: window.max(1),
        }
    }

    /// Record one request outcome. Always succeeds; negative response times
    /// are clamped to zero.
    pub fn record_request(&self, source_id: &str, success: bool, response_secs: f32, jobs_found: u32) {
        let sample = Sample {
            ts_unix: now_unix(),
            success,
            response_secs: response_secs.max(0.0),
            jobs_found,
        };

        let mut inner = self.inner.lock().expect("tracker mutex poisoned");
        let hist = inner.entry(source_id.to_string()).or_default();
        if hist.samples.len() == self.window {
            hist.samples.pop_front();
        }
        hist.samples.push_back(sample);
        if success {
            // A fresh success lifts a forced trip; the derived flag still
            // applies until the window recovers.
            hist.forced_unavailable = false;
        }
    }

    /// Derived metrics for one source, or `None` if it was never recorded.
    pub fn metrics(&self, source_id: &str) -> Option<SourceMetrics> {
        let inner = self.inner.lock().expect("tracker mutex poisoned");
        inner.get(source_id).map(|h| derive(source_id, h))
    }

    /// Force a source unavailable until its next successful request.
    /// Used by the router's adaptive loop to react within a session.
    pub fn mark_unavailable(&self, source_id: &str) {
        let mut inner = self.inner.lock().expect("tracker mutex poisoned");
        inner.entry(source_id.to_string()).or_default().forced_unavailable = true;
    }

    /// Top sources by descending priority score, optionally filtered to one
    /// kind (resolved through the catalog).
    pub fn top_sources(
        &self,
        catalog: &SourceCatalog,
        kind: Option<SourceKind>,
        limit: usize,
    ) -> Vec<SourceMetrics> {
        let inner = self.inner.lock().expect("tracker mutex poisoned");
        let mut all: Vec<SourceMetrics> = inner
            .iter()
            .filter(|(id, _)| match kind {
                Some(k) => catalog.get(id).map(|p| p.kind) == Some(k),
                None => true,
            })
            .map(|(id, h)| derive(id, h))
            .collect();
        all.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        all.truncate(limit);
        all
    }

    /// Metrics for every recorded source (diagnostics).
    pub fn all_metrics(&self) -> Vec<SourceMetrics> {
        let inner = self.inner.lock().expect("tracker mutex poisoned");
        inner.iter().map(|(id, h)| derive(id, h)).collect()
    }
}

fn derive(source_id: &str, hist: &SourceHistory) -> SourceMetrics {
    let total = hist.samples.len() as u32;
    let successes = hist.samples.iter().filter(|s| s.success).count() as u32;
    let failures = total - successes;
    let success_rate = if total > 0 {
        successes as f32 / total as f32
    } else {
        0.0
    };
    let avg_response_secs = mean(hist.samples.iter().map(|s| s.response_secs));
    let avg_jobs_found = mean(hist.samples.iter().map(|s| s.jobs_found as f32));

    let tripped = failures >= BREAKER_FAILURES && success_rate < BREAKER_SUCCESS_RATE;
    let available =
        success_rate > MIN_AVAILABLE_SUCCESS_RATE && !tripped && !hist.forced_unavailable;

    SourceMetrics {
        source_id: source_id.to_string(),
        success_rate,
        avg_response_secs,
        avg_jobs_found,
        last_used: hist.samples.back().map(|s| s.ts_unix).unwrap_or(0),
        failure_count: failures,
        total_requests: total,
        available,
        priority_score: priority_score(success_rate, avg_response_secs, avg_jobs_found),
    }
}

fn mean(it: impl Iterator<Item = f32>) -> f32 {
    let mut sum = 0.0f32;
    let mut n = 0usize;
    for v in it {
        sum += v;
        n += 1;
    }
    if n > 0 {
        sum / n as f32
    } else {
        0.0
    }
}

/// Current UNIX time in seconds.
fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
