// src/dedup.rs
//! # Deduplicator
//!
//! Groups validated listings that describe the same real posting and keeps
//! one canonical representative per group. Exact duplicates are caught by a
//! fingerprint over normalized title|company|location; the remainder goes
//! through a pairwise fuzzy pass. The fuzzy pass is O(n²) over one query's
//! results (tens of listings), which is fine — this is not a persisted
//! corpus.
//!
//! Groups partition the input: every listing lands in exactly one group,
//! singletons included, and `unique.len() == groups.len()`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::listing::JobListing;

/// Similarity weights: title dominates, company second, location last.
pub const SIM_TITLE_WEIGHT: f64 = 0.6;
pub const SIM_COMPANY_WEIGHT: f64 = 0.3;
pub const SIM_LOCATION_WEIGHT: f64 = 0.1;
/// Pairs at or above this similarity are judged the same posting.
/// Fixed precision/recall tradeoff; there is no reconciliation step.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Portal names that leak into company fields and must not affect matching.
const PORTAL_NOISE: &[&str] = &["bdjobs.com"];

/// Canonical-selection configuration. The source ranking is deliberately
/// configurable: which sources to trust for the same posting is a
/// deployment decision, not a universal ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    /// source id → priority rank (1 = most trusted). Canonical selection
    /// adds `1/rank` to the quality score.
    #[serde(default)]
    pub source_rank: HashMap<String, u32>,
    #[serde(default = "default_rank")]
    pub default_rank: u32,
}

fn default_threshold() -> f64 {
    SIMILARITY_THRESHOLD
}

fn default_rank() -> u32 {
    5
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self::default_seed()
    }
}

impl DedupConfig {
    /// Seeded ranking: primary scraped boards first, official APIs next,
    /// web-search-derived listings last.
    pub fn default_seed() -> Self {
        let mut source_rank = HashMap::new();
        for (id, rank) in [
            ("scraper_bdjobs", 1u32),
            ("scraper_linkedin", 2),
            ("api_linkedin", 2),
            ("api_indeed", 3),
            ("web_search", 4),
        ] {
            source_rank.insert(id.to_string(), rank);
        }
        Self {
            similarity_threshold: SIMILARITY_THRESHOLD,
            source_rank,
            default_rank: 5,
        }
    }

    fn rank_for(&self, source: &str) -> u32 {
        // Strip a trailing " (…)" qualifier some collectors append.
        let base = source.split(" (").next().unwrap_or(source);
        *self
            .source_rank
            .get(base)
            .unwrap_or(&self.default_rank)
    }
}

/// Dedup result: canonical listings plus the full grouping.
#[derive(Debug)]
pub struct DedupOutcome {
    pub unique: Vec<JobListing>,
    pub duplicates_removed: usize,
    /// Index groups over the input; a partition including singletons.
    pub groups: Vec<Vec<usize>>,
    pub similarity_checks: usize,
}

// --- normalization ---

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));
static RE_TITLE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*-\s*(for|job id|job-id).*$").expect("title suffix regex"));
static RE_TITLE_PAREN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\(for\s+.*?\)").expect("title paren regex"));
static RE_COMPANY_COM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.com$").expect("company regex"));

pub fn normalize_title(title: &str) -> String {
    let t = title.to_lowercase();
    let t = RE_TITLE_SUFFIX.replace(&t, "");
    let t = RE_TITLE_PAREN.replace_all(&t, "");
    collapse(&t)
}

pub fn normalize_company(company: &str) -> String {
    let mut c = company.to_lowercase();
    for noise in PORTAL_NOISE {
        c = c.replace(noise, "");
    }
    let c = RE_COMPANY_COM.replace(&c, "");
    collapse(&c)
}

pub fn normalize_location(location: &str) -> String {
    collapse(&location.to_lowercase())
}

fn collapse(s: &str) -> String {
    RE_WS.replace_all(s.trim(), " ").trim().to_string()
}

/// Deterministic fingerprint of the normalized identity fields.
pub fn fingerprint(job: &JobListing) -> String {
    let key = format!(
        "{}|{}|{}",
        normalize_title(&job.title),
        normalize_company(&job.company),
        normalize_location(&job.location)
    );
    let digest = Sha256::digest(key.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

struct NormalizedView {
    title: String,
    company: String,
    location: String,
}

fn similarity(a: &NormalizedView, b: &NormalizedView) -> f64 {
    SIM_TITLE_WEIGHT * strsim::normalized_levenshtein(&a.title, &b.title)
        + SIM_COMPANY_WEIGHT * strsim::normalized_levenshtein(&a.company, &b.company)
        + SIM_LOCATION_WEIGHT * strsim::normalized_levenshtein(&a.location, &b.location)
}

/// Quality score used only for canonical selection within a group.
fn selection_quality(job: &JobListing) -> f64 {
    let fields_present = [
        !job.title.is_empty(),
        !job.company.is_empty(),
        !job.location.is_empty(),
        !job.summary.is_empty(),
        job.url.is_some(),
        job.salary.is_some(),
        job.requirements.is_some(),
    ];
    let completeness =
        fields_present.iter().filter(|p| **p).count() as f64 / fields_present.len() as f64;

    let mut score = completeness * 0.4;
    if job.title.chars().count() > 10 {
        score += 0.2;
    }
    if job.summary.chars().count() > 50 {
        score += 0.2;
    }
    if job.url.is_some() {
        score += 0.1;
    }
    if job.salary.is_some() {
        score += 0.1;
    }
    score
}

/// Deduplicate one batch. Selects, never mutates.
pub fn deduplicate(listings: &[JobListing], cfg: &DedupConfig) -> DedupOutcome {
    if listings.is_empty() {
        return DedupOutcome {
            unique: Vec::new(),
            duplicates_removed: 0,
            groups: Vec::new(),
            similarity_checks: 0,
        };
    }

    let views: Vec<NormalizedView> = listings
        .iter()
        .map(|j| NormalizedView {
            title: normalize_title(&j.title),
            company: normalize_company(&j.company),
            location: normalize_location(&j.location),
        })
        .collect();

    // Pass 1: exact groups by fingerprint.
    let mut by_fp: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, job) in listings.iter().enumerate() {
        by_fp.entry(fingerprint(job)).or_default().push(i);
    }

    let mut grouped = vec![false; listings.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for members in by_fp.into_values() {
        if members.len() > 1 {
            for &i in &members {
                grouped[i] = true;
            }
            groups.push(members);
        }
    }

    // Pass 2: fuzzy groups over whatever the exact pass left behind.
    let mut similarity_checks = 0usize;
    for i in 0..listings.len() {
        if grouped[i] {
            continue;
        }
        let mut group = vec![i];
        for j in (i + 1)..listings.len() {
            if grouped[j] {
                continue;
            }
            similarity_checks += 1;
            if similarity(&views[i], &views[j]) >= cfg.similarity_threshold {
                group.push(j);
                grouped[j] = true;
            }
        }
        grouped[i] = true;
        groups.push(group); // singleton groups included
    }

    groups.sort_by_key(|g| g.iter().copied().min().unwrap_or(0));

    // Canonical selection: quality plus a source-trust bonus.
    let mut keep: Vec<usize> = groups
        .iter()
        .map(|group| {
            *group
                .iter()
                .max_by(|&&a, &&b| {
                    let sa = selection_quality(&listings[a])
                        + 1.0 / cfg.rank_for(&listings[a].source) as f64;
                    let sb = selection_quality(&listings[b])
                        + 1.0 / cfg.rank_for(&listings[b].source) as f64;
                    sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
                })
                .expect("groups are non-empty")
        })
        .collect();
    keep.sort_unstable();

    let unique: Vec<JobListing> = keep.iter().map(|&i| listings[i].clone()).collect();
    let duplicates_removed = listings.len() - unique.len();

    DedupOutcome {
        unique,
        duplicates_removed,
        groups,
        similarity_checks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;

    fn job(title: &str, company: &str, location: &str, source: &str) -> JobListing {
        JobListing::from_raw(
            RawListing {
                title: title.into(),
                company: company.into(),
                location: location.into(),
                summary: "We are hiring for this role at our office.".into(),
                url: Some("https://example.com/jobs/1".into()),
                ..Default::default()
            },
            source,
        )
    }

    #[test]
    fn fingerprint_is_stable_and_suffix_insensitive() {
        let a = job("Software Engineer", "TechCorp Ltd", "Dhaka, Bangladesh", "s1");
        assert_eq!(fingerprint(&a), fingerprint(&a));

        let b = job(
            "Software Engineer - For TechCorp Ltd",
            "TechCorp Ltd",
            "Dhaka,  Bangladesh",
            "s2",
        );
        assert_eq!(fingerprint(&a), fingerprint(&b));

        let c = job("Software Engineer (For TechCorp)", "techcorp ltd", "dhaka, bangladesh", "s3");
        assert_eq!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn company_portal_noise_is_stripped() {
        assert_eq!(normalize_company("TechCorp.com"), "techcorp");
        assert_eq!(normalize_company("TechCorp bdjobs.com"), "techcorp");
    }

    #[test]
    fn identical_pair_collapses_to_one() {
        // Same posting seen by two sources.
        let listings = vec![
            job("Software Engineer", "TechCorp Ltd", "Dhaka, Bangladesh", "scraper_bdjobs"),
            job("Software Engineer", "TechCorp Ltd", "Dhaka, Bangladesh", "web_search"),
        ];
        let out = deduplicate(&listings, &DedupConfig::default());
        assert_eq!(out.unique.len(), 1);
        assert_eq!(out.duplicates_removed, 1);
        assert_eq!(out.groups.len(), 1);
        // The scraped board outranks the web-search copy.
        assert_eq!(out.unique[0].source, "scraper_bdjobs");
    }

    #[test]
    fn groups_partition_the_input() {
        let listings = vec![
            job("Software Engineer", "TechCorp Ltd", "Dhaka", "scraper_bdjobs"),
            job("Software Engineer", "TechCorp Ltd", "Dhaka", "web_search"),
            job("Marketing Manager", "OtherCo", "Sylhet", "api_indeed"),
            job("Software Enginer", "TechCorp Ltd", "Dhaka", "api_linkedin"), // typo'd near-dup
        ];
        let out = deduplicate(&listings, &DedupConfig::default());

        let mut seen = vec![0usize; listings.len()];
        for g in &out.groups {
            for &i in g {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "partition violated: {seen:?}");
        assert_eq!(out.unique.len(), out.groups.len());
    }

    #[test]
    fn fuzzy_pass_catches_near_duplicates() {
        let listings = vec![
            job("Senior Python Developer", "StartupXYZ", "Remote", "api_linkedin"),
            job("Senior Python Developar", "StartupXYZ", "Remote", "web_search"),
        ];
        let out = deduplicate(&listings, &DedupConfig::default());
        assert_eq!(out.unique.len(), 1);
        assert!(out.similarity_checks >= 1);
    }

    #[test]
    fn dedup_is_idempotent() {
        let listings = vec![
            job("Software Engineer", "TechCorp Ltd", "Dhaka", "scraper_bdjobs"),
            job("Software Engineer", "TechCorp Ltd", "Dhaka", "web_search"),
            job("Marketing Manager", "OtherCo", "Sylhet", "api_indeed"),
        ];
        let cfg = DedupConfig::default();
        let once = deduplicate(&listings, &cfg);
        let twice = deduplicate(&once.unique, &cfg);
        assert_eq!(twice.duplicates_removed, 0);
        assert_eq!(twice.unique.len(), once.unique.len());
        for (a, b) in once.unique.iter().zip(twice.unique.iter()) {
            assert_eq!(a.title, b.title);
            assert_eq!(a.source, b.source);
        }
    }

    #[test]
    fn richer_listing_wins_within_group() {
        let mut poor = job("Software Engineer", "TechCorp Ltd", "Dhaka", "web_search");
        poor.url = None;
        poor.summary = "Short".into();
        let mut rich = job("Software Engineer", "TechCorp Ltd", "Dhaka", "web_search");
        rich.salary = Some("50k-80k BDT".into());
        rich.requirements = Some("Python, React".into());

        let out = deduplicate(&[poor, rich], &DedupConfig::default());
        assert_eq!(out.unique.len(), 1);
        assert!(out.unique[0].salary.is_some());
    }
}
