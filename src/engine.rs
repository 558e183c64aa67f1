// src/engine.rs
//! # Feed Engine
//!
//! Top-level session object: wires the catalog, performance tracker,
//! source selector, rate limiter, the registered collectors and the QA
//! pipeline into one `run(query)` call that returns a ranked feed.
//!
//! The engine is long-lived; tracker and limiter state carry across runs,
//! which is what makes the routing adaptive.

use anyhow::{bail, Result};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, warn};

use crate::backoff::RateLimiter;
use crate::catalog::SourceCatalog;
use crate::collect::{parallel_wave, sequential_fallback, Collector, SourceOutcome, WaveResult};
use crate::listing::JobListing;
use crate::pipeline::{Pipeline, PipelineStats};
use crate::query::{ParsedQuery, QueryType};
use crate::router::SourceSelector;
use crate::tracker::PerformanceTracker;

/// Default cap on sources per query, before the profile narrows it.
pub const DEFAULT_MAX_SOURCES: usize = 5;

/// What one `run` did, alongside the feed itself.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub query_type: QueryType,
    pub selected: Vec<String>,
    pub fallback_used: bool,
    pub outcomes: Vec<SourceOutcome>,
    pub expected_jobs: u32,
    pub stats: PipelineStats,
}

/// Ranked feed plus run diagnostics.
#[derive(Debug)]
pub struct FeedReport {
    pub listings: Vec<JobListing>,
    pub summary: RunSummary,
}

pub struct FeedEngine {
    selector: SourceSelector,
    limiter: Arc<RateLimiter>,
    pipeline: Pipeline,
    collectors: HashMap<String, Arc<dyn Collector>>,
    max_sources: usize,
}

impl FeedEngine {
    pub fn new(catalog: SourceCatalog, pipeline: Pipeline) -> Self {
        Self {
            selector: SourceSelector::new(catalog, Arc::new(PerformanceTracker::default())),
            limiter: Arc::new(RateLimiter::new()),
            pipeline,
            collectors: HashMap::new(),
            max_sources: DEFAULT_MAX_SOURCES,
        }
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Register a collector under its own `source_id`. Replacing an
    /// existing registration is allowed (tests swap in stubs this way).
    pub fn register(&mut self, collector: Arc<dyn Collector>) {
        self.collectors
            .insert(collector.source_id().to_string(), collector);
    }

    pub fn selector(&self) -> &SourceSelector {
        &self.selector
    }

    /// Run one query end to end: select sources, fan out, feed outcomes
    /// back, then validate/dedupe/enrich/rank the collected batch.
    ///
    /// Fails only on wiring errors (a selected source with no registered
    /// collector). Collectors failing or returning nothing yields an empty
    /// feed, not an error.
    pub async fn run(&self, query: &ParsedQuery) -> Result<FeedReport> {
        let (query_type, selected) = self.selector.select(query, self.max_sources);
        let profile = query_type.profile();

        let mut wave_collectors = Vec::with_capacity(selected.len());
        for id in &selected {
            match self.collectors.get(id) {
                Some(c) => wave_collectors.push(c.clone()),
                None => bail!("no collector registered for catalog source '{id}'"),
            }
        }

        let query = Arc::new(query.clone());
        let mut wave = parallel_wave(
            wave_collectors,
            query.clone(),
            self.limiter.clone(),
            profile.timeout,
        )
        .await;

        let mut fallback_used = false;
        if wave.listings.is_empty() {
            let leftovers = self.fallback_collectors(&selected);
            if !leftovers.is_empty() {
                warn!(target: "engine", "parallel wave empty, trying fallback sources");
                fallback_used = true;
                let extra =
                    sequential_fallback(leftovers, query.clone(), self.limiter.clone()).await;
                merge(&mut wave, extra);
            }
        }

        for o in &wave.outcomes {
            self.selector
                .record_outcome(&o.source_id, o.success, o.response_secs, o.jobs_found)?;
        }

        let outcome = self.pipeline.process(wave.listings);

        info!(
            target: "engine",
            ?query_type,
            expected = profile.expected_jobs,
            feed = outcome.listings.len(),
            fallback = fallback_used,
            "query run finished"
        );

        Ok(FeedReport {
            listings: outcome.listings,
            summary: RunSummary {
                query_type,
                selected,
                fallback_used,
                outcomes: wave.outcomes,
                expected_jobs: profile.expected_jobs,
                stats: outcome.stats,
            },
        })
    }

    /// Enabled catalog sources that were not selected but do have a
    /// registered collector, in catalog order.
    fn fallback_collectors(&self, selected: &[String]) -> Vec<Arc<dyn Collector>> {
        self.selector
            .catalog()
            .enabled()
            .filter(|s| !selected.iter().any(|id| *id == s.id))
            .filter_map(|s| self.collectors.get(&s.id).cloned())
            .collect()
    }
}

fn merge(into: &mut WaveResult, extra: WaveResult) {
    into.listings.extend(extra.listings);
    into.outcomes.extend(extra.outcomes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;
    use async_trait::async_trait;

    struct Stub {
        id: String,
        jobs: Vec<RawListing>,
        fail: bool,
    }

    #[async_trait]
    impl Collector for Stub {
        fn source_id(&self) -> &str {
            &self.id
        }
        async fn fetch(&self, _q: &ParsedQuery) -> Result<Vec<RawListing>> {
            if self.fail {
                bail!("down");
            }
            Ok(self.jobs.clone())
        }
    }

    fn posting(title: &str) -> RawListing {
        RawListing {
            title: title.into(),
            company: "TechCorp Ltd".into(),
            location: "Dhaka, Bangladesh".into(),
            summary: "We need a skilled engineer with Python experience for our Dhaka team."
                .into(),
            url: Some("https://techcorp.example/jobs/1".into()),
            ..Default::default()
        }
    }

    fn engine_with(stubs: Vec<(&str, Vec<RawListing>, bool)>) -> FeedEngine {
        let mut engine = FeedEngine::new(SourceCatalog::default_seed(), Pipeline::default());
        // Every catalog source gets a collector so wiring never fails.
        for s in SourceCatalog::default_seed().sources {
            engine.register(Arc::new(Stub {
                id: s.id,
                jobs: Vec::new(),
                fail: false,
            }));
        }
        for (id, jobs, fail) in stubs {
            engine.register(Arc::new(Stub {
                id: id.into(),
                jobs,
                fail,
            }));
        }
        engine
    }

    #[tokio::test(start_paused = true)]
    async fn run_produces_ranked_feed() {
        let engine = engine_with(vec![
            ("api_linkedin", vec![posting("Software Engineer")], false),
            ("web_search", vec![posting("Software Engineer")], false),
        ]);
        let q = ParsedQuery {
            company: Some("TechCorp".into()),
            ..Default::default()
        };
        let report = engine.run(&q).await.unwrap();
        assert_eq!(report.summary.query_type, QueryType::CompanySpecific);
        assert!(!report.summary.selected.is_empty());
        // Identical postings from different sources collapse to one.
        assert_eq!(report.listings.len(), 1);
        assert!(report.listings[0].confidence.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn all_sources_failing_yields_empty_feed_not_error() {
        let mut engine = FeedEngine::new(SourceCatalog::default_seed(), Pipeline::default());
        for s in SourceCatalog::default_seed().sources {
            engine.register(Arc::new(Stub {
                id: s.id,
                jobs: Vec::new(),
                fail: true,
            }));
        }
        let report = engine.run(&ParsedQuery::default()).await.unwrap();
        assert!(report.listings.is_empty());
        assert!(report.summary.outcomes.iter().all(|o| !o.success));
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_kicks_in_when_selection_comes_up_empty() {
        // Selected sources yield nothing; an unselected scraper has data.
        let q = ParsedQuery {
            company: Some("TechCorp".into()),
            ..Default::default()
        };
        let engine = engine_with(vec![(
            "scraper_shomvob",
            vec![posting("Software Engineer")],
            false,
        )]);
        let report = engine.run(&q).await.unwrap();
        if report.summary.selected.iter().any(|s| s == "scraper_shomvob") {
            // Profile happened to select it; fallback not needed.
            assert!(!report.listings.is_empty());
        } else {
            assert!(report.summary.fallback_used);
            assert!(!report.listings.is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_collector_is_a_wiring_error() {
        let engine = FeedEngine::new(SourceCatalog::default_seed(), Pipeline::default());
        let err = engine.run(&ParsedQuery::default()).await.unwrap_err();
        assert!(err.to_string().contains("no collector registered"));
    }
}
