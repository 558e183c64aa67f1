// src/pipeline.rs
//! # QA Pipeline
//!
//! Runs one batch of collected listings through Validator → Deduplicator →
//! Enricher and ranks the surviving feed. Synchronous and single-threaded
//! on purpose: batches are tens of listings, and once collection is done
//! the pipeline runs to completion without cancellation.

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info};

use crate::dedup::{deduplicate, DedupConfig};
use crate::enrich::enrich;
use crate::listing::JobListing;
use crate::validate::{validate, Quality, ValidationLevel, ValidationTag};

/// One-time metrics registration (so series show up on exporters).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("qa_collected_total", "Listings entering the QA pipeline.");
        describe_counter!("qa_valid_total", "Listings passing validation.");
        describe_counter!("qa_invalid_total", "Listings rejected by validation.");
        describe_counter!("qa_duplicates_total", "Listings removed as duplicates.");
        describe_counter!("qa_feed_total", "Listings in the final ranked feed.");
    });
}

/// Final-feed quality distribution.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct QualityDistribution {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
    pub invalid: usize,
}

impl QualityDistribution {
    fn bump(&mut self, q: Quality) {
        match q {
            Quality::Excellent => self.excellent += 1,
            Quality::Good => self.good += 1,
            Quality::Fair => self.fair += 1,
            Quality::Poor => self.poor += 1,
            Quality::Invalid => self.invalid += 1,
        }
    }
}

/// Aggregated statistics for one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub total_collected: usize,
    pub valid: usize,
    pub invalid: usize,
    pub duplicates_removed: usize,
    pub groups: usize,
    pub quality: QualityDistribution,
}

/// Result of one pipeline run: the ranked feed plus its statistics.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub listings: Vec<JobListing>,
    pub stats: PipelineStats,
}

/// The orchestrator. Owns the per-run configuration, not the data.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub level: ValidationLevel,
    pub dedup: DedupConfig,
}

impl Default for Pipeline {
    fn default() -> Self {
        // Lenient by default: partial data is the norm with these sources,
        // and the dedup + ranking stages do the rest of the filtering.
        Self {
            level: ValidationLevel::Lenient,
            dedup: DedupConfig::default_seed(),
        }
    }
}

impl Pipeline {
    pub fn new(level: ValidationLevel, dedup: DedupConfig) -> Self {
        Self { level, dedup }
    }

    /// Run the full batch transform. Never fails; garbage scores low and
    /// falls out at validation.
    pub fn process(&self, listings: Vec<JobListing>) -> PipelineOutcome {
        ensure_metrics_described();
        let total_collected = listings.len();

        // Stage 1: validate, attach quality metadata, drop the rest.
        let mut valid = Vec::with_capacity(listings.len());
        for mut job in listings {
            let res = validate(&job, self.level);
            if res.is_valid {
                job.validation = Some(ValidationTag {
                    score: res.quality_score,
                    quality: res.quality,
                });
                valid.push(job);
            } else {
                debug!(
                    target: "pipeline",
                    title = %job.title,
                    score = res.quality_score,
                    issues = res.issues.len(),
                    "listing rejected"
                );
            }
        }
        let valid_count = valid.len();

        // Stage 2: deduplicate.
        let deduped = deduplicate(&valid, &self.dedup);
        let duplicates_removed = deduped.duplicates_removed;
        let groups = deduped.groups.len();

        // Stage 3: enrich, then rank.
        let mut feed = enrich(deduped.unique);
        rank(&mut feed);

        let mut quality = QualityDistribution::default();
        for job in &feed {
            if let Some(tag) = &job.validation {
                quality.bump(tag.quality);
            }
        }

        counter!("qa_collected_total").increment(total_collected as u64);
        counter!("qa_valid_total").increment(valid_count as u64);
        counter!("qa_invalid_total").increment((total_collected - valid_count) as u64);
        counter!("qa_duplicates_total").increment(duplicates_removed as u64);
        counter!("qa_feed_total").increment(feed.len() as u64);

        info!(
            target: "pipeline",
            collected = total_collected,
            valid = valid_count,
            duplicates = duplicates_removed,
            feed = feed.len(),
            "qa pipeline completed"
        );

        PipelineOutcome {
            listings: feed,
            stats: PipelineStats {
                total_collected,
                valid: valid_count,
                invalid: total_collected - valid_count,
                duplicates_removed,
                groups,
                quality,
            },
        }
    }
}

/// Rank the feed: confidence descending, then validation score descending.
/// Stable, so equal listings keep their input order.
fn rank(feed: &mut [JobListing]) {
    feed.sort_by(|a, b| {
        let ca = a.confidence.unwrap_or(0.0);
        let cb = b.confidence.unwrap_or(0.0);
        cb.partial_cmp(&ca)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let sa = a.validation.as_ref().map(|t| t.score).unwrap_or(0.0);
                let sb = b.validation.as_ref().map(|t| t.score).unwrap_or(0.0);
                sb.partial_cmp(&sa).unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}
