// src/router.rs
//! # Source Selector
//!
//! Picks the ordered subset of catalog sources to invoke for a query,
//! combining the static catalog, the query profile's preferences and live
//! performance metrics. Outcomes are fed back through `record_outcome`,
//! which closes the adaptive loop: repeatedly failing sources are forced
//! unavailable within the session, ahead of the tracker's own breaker.
//!
//! Selection never fails; an empty list means "no data this round", not an
//! error. The only error path is an unregistered source id on feedback,
//! which indicates a catalog misconfiguration and fails fast.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::SourceCatalog;
use crate::query::{classify, ParsedQuery, QueryProfile, QueryType};
use crate::tracker::{PerformanceTracker, BREAKER_FAILURES, BREAKER_SUCCESS_RATE};

/// Weight of the live priority score relative to the static base priority.
pub const PERFORMANCE_WEIGHT: f32 = 0.3;

/// Router over an injected catalog and tracker.
pub struct SourceSelector {
    catalog: SourceCatalog,
    tracker: Arc<PerformanceTracker>,
}

impl SourceSelector {
    pub fn new(catalog: SourceCatalog, tracker: Arc<PerformanceTracker>) -> Self {
        Self { catalog, tracker }
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    pub fn tracker(&self) -> &Arc<PerformanceTracker> {
        &self.tracker
    }

    /// Classify `query` and select sources under its profile.
    pub fn select(&self, query: &ParsedQuery, max_sources: usize) -> (QueryType, Vec<String>) {
        let query_type = classify(query);
        let profile = query_type.profile();
        debug!(target: "router", ?query_type, "query classified");
        let selected = self.select_sources(&profile, max_sources);
        (query_type, selected)
    }

    /// Select an ordered list of source ids for the given profile.
    ///
    /// 1. keep enabled sources whose tracker entry (if any) is available;
    /// 2. order by position in `preferred_sources` (unlisted last, catalog
    ///    order preserved among themselves);
    /// 3. stable-sort by composite rank, descending;
    /// 4. size the fan-out between the profile's min and max.
    pub fn select_sources(&self, profile: &QueryProfile, max_sources: usize) -> Vec<String> {
        let mut candidates: Vec<&crate::catalog::SourceProfile> = self
            .catalog
            .enabled()
            .filter(|s| {
                self.tracker
                    .metrics(&s.id)
                    .map(|m| m.available)
                    .unwrap_or(true)
            })
            .collect();

        let pref_pos = |id: &str| {
            profile
                .preferred_sources
                .iter()
                .position(|p| *p == id)
                .unwrap_or(profile.preferred_sources.len())
        };
        candidates.sort_by_key(|s| pref_pos(&s.id));

        candidates.sort_by(|a, b| {
            let ra = self.rank(a, profile.query_type);
            let rb = self.rank(b, profile.query_type);
            rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut count = max_sources
            .min(profile.max_sources)
            .min(candidates.len());
        if count < profile.min_sources {
            count = profile.min_sources.min(candidates.len());
        }

        let selected: Vec<String> = candidates[..count].iter().map(|s| s.id.clone()).collect();
        debug!(target: "router", sources = ?selected, "sources selected");
        selected
    }

    fn rank(&self, source: &crate::catalog::SourceProfile, query_type: QueryType) -> f32 {
        let performance = self
            .tracker
            .metrics(&source.id)
            .map(|m| m.priority_score)
            .unwrap_or(0.0);
        source.base_priority
            + PERFORMANCE_WEIGHT * performance
            + query_type_boost(query_type, &source.id)
    }

    /// Report one collector outcome back into the adaptive loop.
    ///
    /// Errors only on a source id missing from the catalog — a programming
    /// contract violation, not bad input data.
    pub fn record_outcome(
        &self,
        source_id: &str,
        success: bool,
        response_secs: f32,
        jobs_found: u32,
    ) -> Result<()> {
        if !self.catalog.contains(source_id) {
            bail!("unregistered source id '{source_id}': catalog misconfiguration");
        }
        self.tracker
            .record_request(source_id, success, response_secs, jobs_found);

        // Adaptive learning: react within the session, independent of the
        // tracker's own availability derivation.
        if !success {
            if let Some(m) = self.tracker.metrics(source_id) {
                if m.failure_count >= BREAKER_FAILURES && m.success_rate < BREAKER_SUCCESS_RATE {
                    warn!(
                        target: "router",
                        source = source_id,
                        success_rate = m.success_rate,
                        failures = m.failure_count,
                        "marking source unavailable due to poor performance"
                    );
                    self.tracker.mark_unavailable(source_id);
                }
            }
        }
        Ok(())
    }
}

/// Small static bonus table: which kinds of sources answer which query
/// types best. Values are deliberate calibration points, not derived.
pub fn query_type_boost(query_type: QueryType, source_id: &str) -> f32 {
    let table: &[(&str, f32)] = match query_type {
        QueryType::CompanySpecific => &[("api_linkedin", 0.2), ("api_indeed", 0.1), ("web_search", 0.1)],
        QueryType::LocationSpecific => &[
            ("scraper_bdjobs", 0.2),
            ("scraper_skilljobs", 0.2),
            ("scraper_shomvob", 0.1),
        ],
        QueryType::SkillBased => &[
            ("web_search", 0.2),
            ("api_linkedin", 0.1),
            ("scraper_skilljobs", 0.1),
        ],
        QueryType::RemoteWork => &[("api_linkedin", 0.2), ("api_indeed", 0.1), ("web_search", 0.1)],
        _ => &[],
    };
    table
        .iter()
        .find(|(id, _)| *id == source_id)
        .map(|(_, b)| *b)
        .unwrap_or(0.0)
}
