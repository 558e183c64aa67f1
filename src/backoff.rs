// src/backoff.rs
//! Per-source rate limiting with exponential backoff and jitter.
//!
//! The delay is a blocking wait inserted immediately before issuing a
//! request to a source, not a retry policy on the request itself. It grows
//! with the source's recent consecutive failures and resets on success.

use rand::Rng;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::debug;

pub const BACKOFF_BASE_SECS: f32 = 1.0;
pub const BACKOFF_MULTIPLIER: f32 = 2.0;
pub const BACKOFF_MAX_SECS: f32 = 30.0;
/// Jitter factor range applied to the computed delay.
pub const JITTER_MIN: f32 = 0.5;
pub const JITTER_MAX: f32 = 1.5;

#[derive(Debug, Default)]
struct SourceState {
    last_request: Option<Instant>,
    consecutive_failures: u32,
}

/// Tracks per-source request times and failure streaks.
#[derive(Debug, Default)]
pub struct RateLimiter {
    inner: Mutex<HashMap<String, SourceState>>,
}

/// Backoff delay (without jitter) after `failures` consecutive failures.
pub fn backoff_delay(failures: u32) -> Duration {
    let secs = (BACKOFF_BASE_SECS * BACKOFF_MULTIPLIER.powi(failures.min(16) as i32))
        .min(BACKOFF_MAX_SECS);
    Duration::from_secs_f32(secs)
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to wait before the next request to `source_id`.
    /// Zero if enough time has already passed since the last one.
    pub fn should_wait(&self, source_id: &str) -> Duration {
        let inner = self.inner.lock().expect("rate limiter mutex poisoned");
        let state = match inner.get(source_id) {
            Some(s) => s,
            None => return Duration::ZERO,
        };
        let jitter: f32 = rand::rng().random_range(JITTER_MIN..=JITTER_MAX);
        let delay = backoff_delay(state.consecutive_failures).mul_f32(jitter);
        match state.last_request {
            Some(last) => delay.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Record an issued request and its outcome. Success resets the streak.
    pub fn record(&self, source_id: &str, success: bool) {
        let mut inner = self.inner.lock().expect("rate limiter mutex poisoned");
        let state = inner.entry(source_id.to_string()).or_default();
        state.last_request = Some(Instant::now());
        if success {
            state.consecutive_failures = 0;
        } else {
            state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        }
    }

    /// Sleep out the required delay, if any.
    pub async fn wait_if_needed(&self, source_id: &str) {
        let wait = self.should_wait(source_id);
        if !wait.is_zero() {
            debug!(target: "backoff", source = source_id, wait_ms = wait.as_millis() as u64, "rate limiting");
            tokio::time::sleep(wait).await;
        }
    }
}
