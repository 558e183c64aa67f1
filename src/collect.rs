// src/collect.rs
//! Collector boundary and fan-out.
//!
//! Collectors (scrapers, API clients, LLM extractors) live outside this
//! crate; here is the trait they implement and the machinery that invokes
//! them: a bounded-concurrency parallel wave with per-call and overall
//! timeouts, and a sequential fallback wave for the day every parallel
//! call comes back empty.
//!
//! A collector that fails, times out, or returns nothing yields a
//! `(success = false, 0 jobs)` outcome — never an error to the caller.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{info, warn};

use crate::backoff::RateLimiter;
use crate::listing::{JobListing, RawListing};
use crate::query::ParsedQuery;

/// Concurrent collector calls in the parallel wave.
pub const MAX_CONCURRENT_COLLECTORS: usize = 3;
/// Budget for a single collector call.
pub const PER_CALL_TIMEOUT: Duration = Duration::from_secs(15);
/// Hard cap on one fan-out, regardless of the query profile's budget.
pub const FANOUT_TIMEOUT: Duration = Duration::from_secs(60);

/// One external listing collector.
#[async_trait]
pub trait Collector: Send + Sync {
    fn source_id(&self) -> &str;
    async fn fetch(&self, query: &ParsedQuery) -> Result<Vec<RawListing>>;
}

/// Outcome of one collector call, fed back into the adaptive loop.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source_id: String,
    pub success: bool,
    pub response_secs: f32,
    pub jobs_found: u32,
}

/// Listings plus per-source outcomes from one wave.
#[derive(Debug, Default)]
pub struct WaveResult {
    pub listings: Vec<JobListing>,
    pub outcomes: Vec<SourceOutcome>,
}

impl WaveResult {
    fn absorb(&mut self, outcome: SourceOutcome, raw: Vec<RawListing>) {
        let source_id = outcome.source_id.clone();
        self.outcomes.push(outcome);
        self.listings
            .extend(raw.into_iter().map(|r| JobListing::from_raw(r, &source_id)));
    }
}

async fn call_one(
    collector: Arc<dyn Collector>,
    query: Arc<ParsedQuery>,
    limiter: Arc<RateLimiter>,
) -> (SourceOutcome, Vec<RawListing>) {
    let id = collector.source_id().to_string();
    limiter.wait_if_needed(&id).await;

    let started = Instant::now();
    let result = tokio::time::timeout(PER_CALL_TIMEOUT, collector.fetch(&query)).await;
    let response_secs = started.elapsed().as_secs_f32();

    let (success, raw) = match result {
        Ok(Ok(raw)) if !raw.is_empty() => (true, raw),
        Ok(Ok(_)) => {
            warn!(target: "collect", source = %id, "collector returned no listings");
            (false, Vec::new())
        }
        Ok(Err(e)) => {
            warn!(target: "collect", source = %id, error = ?e, "collector failed");
            (false, Vec::new())
        }
        Err(_) => {
            warn!(target: "collect", source = %id, "collector timed out");
            (false, Vec::new())
        }
    };
    limiter.record(&id, success);

    let jobs_found = raw.len() as u32;
    (
        SourceOutcome {
            source_id: id,
            success,
            response_secs,
            jobs_found,
        },
        raw,
    )
}

/// Run all `collectors` concurrently (bounded by
/// `MAX_CONCURRENT_COLLECTORS`) within `overall_budget`. Calls still
/// outstanding when the budget runs out are abandoned and recorded as
/// failures.
pub async fn parallel_wave(
    collectors: Vec<Arc<dyn Collector>>,
    query: Arc<ParsedQuery>,
    limiter: Arc<RateLimiter>,
    overall_budget: Duration,
) -> WaveResult {
    let budget = overall_budget.min(FANOUT_TIMEOUT);
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_COLLECTORS));
    let mut tasks = JoinSet::new();

    let ids: Vec<String> = collectors.iter().map(|c| c.source_id().to_string()).collect();
    for collector in collectors {
        let semaphore = semaphore.clone();
        let query = query.clone();
        let limiter = limiter.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            call_one(collector, query, limiter).await
        });
    }

    let deadline = Instant::now() + budget;
    let mut result = WaveResult::default();
    let mut completed: HashSet<String> = HashSet::new();

    while !tasks.is_empty() {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, tasks.join_next()).await {
            Ok(Some(Ok((outcome, raw)))) => {
                completed.insert(outcome.source_id.clone());
                result.absorb(outcome, raw);
            }
            Ok(Some(Err(join_err))) => {
                warn!(target: "collect", error = ?join_err, "collector task aborted");
            }
            Ok(None) => break,
            Err(_) => break, // overall budget exhausted
        }
    }
    tasks.abort_all();

    // Abandoned calls count as failures, not crashes.
    for id in ids {
        if !completed.contains(&id) {
            warn!(target: "collect", source = %id, "abandoned after fan-out budget");
            result.outcomes.push(SourceOutcome {
                source_id: id,
                success: false,
                response_secs: budget.as_secs_f32(),
                jobs_found: 0,
            });
        }
    }

    info!(
        target: "collect",
        listings = result.listings.len(),
        sources = result.outcomes.len(),
        "parallel wave finished"
    );
    result
}

/// Try `collectors` one at a time until any of them yields listings.
/// Used when the parallel wave came back empty: slower, but resilient
/// against a total failure of the preferred sources.
pub async fn sequential_fallback(
    collectors: Vec<Arc<dyn Collector>>,
    query: Arc<ParsedQuery>,
    limiter: Arc<RateLimiter>,
) -> WaveResult {
    let mut result = WaveResult::default();
    for collector in collectors {
        let id = collector.source_id().to_string();
        info!(target: "collect", source = %id, "fallback attempt");
        let (outcome, raw) = call_one(collector, query.clone(), limiter.clone()).await;
        let got_results = !raw.is_empty();
        result.absorb(outcome, raw);
        if got_results {
            break;
        }
    }
    result
}
