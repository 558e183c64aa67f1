// src/query.rs
//! # Query Classification
//!
//! Maps an already-parsed query (natural-language parsing happens upstream)
//! onto a closed `QueryType`, and each type onto a static `QueryProfile`
//! describing how many and which sources to fan out to.
//!
//! Classification is precedence-based, first match wins. Pure functions,
//! no side effects; anything unmatched falls back to `General`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Location value treated as "no specific location requested".
/// Queries naming the whole home region classify as general searches.
pub const HOME_REGION: &str = "bangladesh";

/// Structured query as produced by the external query parser.
/// Every field is optional; absence means "not constrained".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedQuery {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub additional_keywords: Vec<String>,
}

/// Closed set of query classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    General,
    CompanySpecific,
    SkillBased,
    LocationSpecific,
    RemoteWork,
    SalaryRange,
    ExperienceLevel,
    RecentPostings,
}

/// Static fan-out profile for one query type.
#[derive(Debug, Clone)]
pub struct QueryProfile {
    pub query_type: QueryType,
    /// Source ids in preference order; unlisted sources sort last.
    pub preferred_sources: &'static [&'static str],
    pub min_sources: usize,
    pub max_sources: usize,
    /// Overall budget for the collector fan-out of this query.
    pub timeout: Duration,
    /// Diagnostics only; never used for correctness.
    pub expected_jobs: u32,
}

/// Classify a parsed query. Precedence: company → skills → non-default
/// location → remote → salary range → experience level → recency → general.
pub fn classify(q: &ParsedQuery) -> QueryType {
    if q.company.as_deref().is_some_and(|c| !c.trim().is_empty()) {
        return QueryType::CompanySpecific;
    }
    if !q.skills.is_empty() {
        return QueryType::SkillBased;
    }
    if let Some(loc) = q.location.as_deref() {
        let loc = loc.trim();
        if !loc.is_empty() && !loc.eq_ignore_ascii_case(HOME_REGION) {
            return QueryType::LocationSpecific;
        }
    }
    if q.remote {
        return QueryType::RemoteWork;
    }
    if q.salary_range.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        return QueryType::SalaryRange;
    }
    if q
        .experience_level
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty())
    {
        return QueryType::ExperienceLevel;
    }
    if q.job_type.as_deref() == Some("recent") {
        return QueryType::RecentPostings;
    }
    QueryType::General
}

impl QueryType {
    /// Static profile for this query type.
    pub fn profile(self) -> QueryProfile {
        let p = |query_type,
                 preferred_sources,
                 min_sources,
                 max_sources,
                 timeout_secs,
                 expected_jobs| QueryProfile {
            query_type,
            preferred_sources,
            min_sources,
            max_sources,
            timeout: Duration::from_secs(timeout_secs),
            expected_jobs,
        };
        match self {
            QueryType::General => p(
                self,
                &[
                    "scraper_bdjobs",
                    "scraper_linkedin",
                    "web_search",
                    "api_linkedin",
                    "api_indeed",
                ],
                2,
                4,
                30,
                15,
            ),
            QueryType::CompanySpecific => p(
                self,
                &["scraper_bdjobs", "scraper_linkedin", "api_linkedin", "web_search"],
                2,
                3,
                25,
                8,
            ),
            QueryType::SkillBased => p(
                self,
                &[
                    "scraper_bdjobs",
                    "scraper_linkedin",
                    "scraper_skilljobs",
                    "web_search",
                    "api_linkedin",
                ],
                2,
                4,
                30,
                12,
            ),
            QueryType::LocationSpecific => p(
                self,
                &["scraper_bdjobs", "scraper_skilljobs", "web_search"],
                2,
                3,
                25,
                10,
            ),
            QueryType::RemoteWork => p(
                self,
                &["api_linkedin", "web_search", "api_indeed"],
                2,
                4,
                30,
                12,
            ),
            QueryType::SalaryRange => p(
                self,
                &["api_linkedin", "api_indeed", "scraper_bdjobs", "web_search"],
                2,
                4,
                30,
                10,
            ),
            QueryType::ExperienceLevel => p(
                self,
                &["scraper_bdjobs", "scraper_linkedin", "api_linkedin", "web_search"],
                2,
                4,
                30,
                10,
            ),
            QueryType::RecentPostings => p(
                self,
                &["scraper_bdjobs", "scraper_skilljobs", "web_search"],
                2,
                3,
                20,
                8,
            ),
        }
    }
}
