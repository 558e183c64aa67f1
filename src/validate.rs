// src/validate.rs
//! # Listing Validator
//!
//! Scores each raw listing for structural and content quality. Inputs are
//! inherently untrustworthy (scrapers, LLM extraction, spam), so this is a
//! total function: unparseable or garbage input simply scores low, it never
//! errors. Validity is decided purely by the score against the level's
//! minimum — issues are diagnostic and do not disqualify on their own,
//! because partial data is common and should not be thrown away.
//!
//! All penalty patterns are compiled once; the walk mirrors the tuned
//! reference heuristics, with the load-bearing constants named.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::listing::{Field, JobListing, REQUIRED_FIELDS};

/// Credit per present required field. With four required fields this also
/// fixes the maximum achievable score at 0.4.
pub const REQUIRED_FIELD_CREDIT: f32 = 0.1;
/// Penalty per spam pattern matched over title+summary.
pub const SPAM_PATTERN_PENALTY: f32 = 0.1;
/// Uppercase ratio above which text is penalized.
pub const CAPS_RATIO_LIMIT: f32 = 0.3;
pub const CAPS_PENALTY: f32 = 0.05;

/// Validation strictness level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationLevel {
    Strict,
    Moderate,
    Lenient,
}

/// Per-level minimums. Reference values, preserved as-is.
#[derive(Debug, Clone, Copy)]
pub struct LevelThresholds {
    pub min_title_len: usize,
    pub min_company_len: usize,
    pub min_summary_len: usize,
    pub min_quality_score: f32,
    pub require_url: bool,
}

impl ValidationLevel {
    pub fn thresholds(self) -> LevelThresholds {
        match self {
            ValidationLevel::Strict => LevelThresholds {
                min_title_len: 5,
                min_company_len: 2,
                min_summary_len: 20,
                min_quality_score: 0.7,
                require_url: true,
            },
            ValidationLevel::Moderate => LevelThresholds {
                min_title_len: 3,
                min_company_len: 2,
                min_summary_len: 10,
                min_quality_score: 0.5,
                require_url: false,
            },
            ValidationLevel::Lenient => LevelThresholds {
                min_title_len: 2,
                min_company_len: 1,
                min_summary_len: 5,
                min_quality_score: 0.3,
                require_url: false,
            },
        }
    }
}

/// Discretized quality bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
    Invalid,
}

impl Quality {
    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            Quality::Excellent
        } else if score >= 0.6 {
            Quality::Good
        } else if score >= 0.4 {
            Quality::Fair
        } else if score >= 0.2 {
            Quality::Poor
        } else {
            Quality::Invalid
        }
    }
}

/// Quality metadata the validator attaches to listings it passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationTag {
    pub score: f32,
    pub quality: Quality,
}

/// Full validation verdict for one listing.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub quality_score: f32,
    pub quality: Quality,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

// --- pattern tables ---

static TITLE_SPAM: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(urgent|immediate|quick|fast|easy|simple|basic)\b",
        r"\b(work from home|wfh|online|internet|computer)\b",
        r"\b(earn|money|income|salary|pay|profit)\b",
        r"\b(click|visit|call|email|apply now)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("title spam regex"))
    .collect()
});

/// Words a plausible job title tends to contain.
const ROLE_KEYWORDS: &[&str] = &[
    "developer",
    "engineer",
    "manager",
    "analyst",
    "designer",
    "specialist",
    "coordinator",
    "assistant",
    "consultant",
    "lead",
    "architect",
    "scientist",
    "researcher",
    "administrator",
];

static COMPANY_GENERIC: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(company|corp|inc|ltd|llc|group|tech|software|solutions)\b",
        r"\b(online|internet|digital|virtual|remote)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("company regex"))
    .collect()
});

static KNOWN_REGIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(dhaka|chittagong|sylhet|rajshahi|khulna|barisal|rangpur|mymensingh)\b",
        r"\b(bangladesh|bd)\b",
        r"\b(remote|work from home|wfh|online)\b",
        r"\b(gulshan|banani|uttara|dhanmondi|mirpur)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("region regex"))
    .collect()
});

static URL_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").expect("url regex"));

const URL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl", "goo.gl", "t.co"];

static SALARY_FORMATS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b\d{1,3}(?:,\d{3})*(?:k|k\+|taka|bdt)\b",
        r"\b(negotiable|competitive|market rate|as per company policy)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("salary regex"))
    .collect()
});

static SPAM_INDICATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\b(earn money|make money|quick money|easy money)\b",
        r"\b(work from home|wfh|online job|internet job)\b",
        r"\b(click|visit|call|email|apply now|urgent)\b",
        r"\b(no experience|no skills|anyone can do)\b",
        r"\b(part time|flexible hours|own schedule)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("spam regex"))
    .collect()
});

/// Validate one listing at the given level.
pub fn validate(job: &JobListing, level: ValidationLevel) -> ValidationResult {
    let t = level.thresholds();
    let mut score = 0.0f32;
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    for field in REQUIRED_FIELDS {
        if job.has_field(field) {
            score += REQUIRED_FIELD_CREDIT;
        } else {
            issues.push(format!("missing required field: {field:?}"));
        }
    }

    score += check_title(&job.title, &t, &mut issues, &mut warnings);
    score += check_company(&job.company, &t, &mut issues, &mut warnings);
    score += check_location(&job.location, &mut warnings);
    score += check_summary(&job.summary, &t, &mut issues, &mut warnings);
    score += check_url(job.url.as_deref(), &t, &mut issues, &mut warnings);
    score += check_salary(job.salary.as_deref(), &mut warnings);
    score -= spam_score(job, &mut warnings);

    let score = score.clamp(0.0, 1.0);
    let quality = Quality::from_score(score);
    let suggestions = suggestions_for(job, score);

    ValidationResult {
        // Score decides alone; issues are diagnostics.
        is_valid: score >= t.min_quality_score,
        quality_score: score,
        quality,
        issues,
        warnings,
        suggestions,
    }
}

fn check_title(
    title: &str,
    t: &LevelThresholds,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> f32 {
    if title.is_empty() {
        return 0.0; // absence already reported by the required-field walk
    }
    let mut delta = 0.0;
    let lower = title.to_lowercase();

    if title.chars().count() < t.min_title_len {
        issues.push(format!("title too short (min {} chars)", t.min_title_len));
        delta -= 0.1;
    }
    for re in TITLE_SPAM.iter() {
        if re.is_match(&lower) {
            warnings.push(format!("title matches spam pattern: {}", re.as_str()));
            delta -= 0.05;
        }
    }
    if !ROLE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        warnings.push("title contains no recognizable job role".to_string());
        delta -= 0.05;
    }
    delta
}

fn check_company(
    company: &str,
    t: &LevelThresholds,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> f32 {
    if company.is_empty() {
        return 0.0;
    }
    let mut delta = 0.0;
    let lower = company.to_lowercase();

    if company.chars().count() < t.min_company_len {
        issues.push(format!("company name too short (min {} chars)", t.min_company_len));
        delta -= 0.1;
    }
    let generic_hits = COMPANY_GENERIC.iter().filter(|re| re.is_match(&lower)).count();
    if generic_hits >= 2 {
        warnings.push("company name looks like a generic placeholder".to_string());
        delta -= 0.05;
    }
    delta
}

fn check_location(location: &str, warnings: &mut Vec<String>) -> f32 {
    if location.is_empty() {
        return 0.0;
    }
    let lower = location.to_lowercase();
    if !KNOWN_REGIONS.iter().any(|re| re.is_match(&lower)) {
        warnings.push("location matches no known region".to_string());
        return -0.05;
    }
    0.0
}

fn check_summary(
    summary: &str,
    t: &LevelThresholds,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> f32 {
    if summary.is_empty() {
        return 0.0;
    }
    let mut delta = 0.0;
    if summary.chars().count() < t.min_summary_len {
        issues.push(format!("summary too short (min {} chars)", t.min_summary_len));
        delta -= 0.1;
    }
    if summary.split_whitespace().count() < 5 {
        warnings.push("summary seems too brief".to_string());
        delta -= 0.05;
    }
    delta
}

fn check_url(
    url: Option<&str>,
    t: &LevelThresholds,
    issues: &mut Vec<String>,
    warnings: &mut Vec<String>,
) -> f32 {
    let url = match url {
        Some(u) if !u.is_empty() => u,
        _ => {
            return if t.require_url {
                issues.push("application url is required".to_string());
                -0.2
            } else {
                warnings.push("application url not provided".to_string());
                -0.05
            };
        }
    };
    let mut delta = 0.0;
    if !URL_FORMAT.is_match(url) {
        issues.push("invalid url format".to_string());
        delta -= 0.1;
    }
    let lower = url.to_lowercase();
    if URL_SHORTENERS.iter().any(|d| lower.contains(d)) {
        warnings.push("url uses a link shortener".to_string());
        delta -= 0.05;
    }
    delta
}

fn check_salary(salary: Option<&str>, warnings: &mut Vec<String>) -> f32 {
    let salary = match salary {
        Some(s) if !s.is_empty() => s,
        _ => return 0.0, // optional
    };
    let lower = salary.to_lowercase();
    if !SALARY_FORMATS.iter().any(|re| re.is_match(&lower)) {
        warnings.push("salary format not recognized".to_string());
        return -0.02;
    }
    0.0
}

fn spam_score(job: &JobListing, warnings: &mut Vec<String>) -> f32 {
    let text = format!("{} {}", job.title, job.summary);
    let lower = text.to_lowercase();
    let mut spam = 0.0;

    for re in SPAM_INDICATORS.iter() {
        if re.is_match(&lower) {
            warnings.push(format!("spam indicator: {}", re.as_str()));
            spam += SPAM_PATTERN_PENALTY;
        }
    }

    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total > 0 {
        let upper = text.chars().filter(|c| c.is_uppercase()).count();
        if upper as f32 / total as f32 > CAPS_RATIO_LIMIT {
            warnings.push("excessive capitalization".to_string());
            spam += CAPS_PENALTY;
        }
    }
    spam
}

fn suggestions_for(job: &JobListing, score: f32) -> Vec<String> {
    let mut out = Vec::new();
    if score < 0.6 {
        out.push("add a more detailed job description".to_string());
    }
    if !job.has_field(Field::Url) {
        out.push("add a direct application url".to_string());
    }
    if !job.has_field(Field::Salary) {
        out.push("include salary information".to_string());
    }
    if !job.has_field(Field::Requirements) {
        out.push("add requirements and qualifications".to_string());
    }
    if job.summary.chars().count() < 50 {
        out.push("provide a longer summary".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;

    fn job(title: &str, company: &str, location: &str, summary: &str, url: Option<&str>) -> JobListing {
        JobListing::from_raw(
            RawListing {
                title: title.into(),
                company: company.into(),
                location: location.into(),
                summary: summary.into(),
                url: url.map(str::to_string),
                ..Default::default()
            },
            "scraper_bdjobs",
        )
    }

    #[test]
    fn clean_listing_scores_top_of_range_and_passes_lenient() {
        let j = job(
            "Software Engineer",
            "TechCorp Ltd",
            "Dhaka, Bangladesh",
            "We are looking for a skilled software engineer with Python and React experience.",
            Some("https://techcorp.example/jobs/123"),
        );
        let r = validate(&j, ValidationLevel::Lenient);
        assert!(r.is_valid);
        assert!((r.quality_score - 0.4).abs() < 1e-6, "got {}", r.quality_score);
        assert_eq!(r.quality, Quality::Fair);
        assert!(r.issues.is_empty());
    }

    #[test]
    fn spam_listing_fails_even_lenient() {
        let j = job(
            "Earn Money Fast",
            "Online Company",
            "Work from home",
            "Make money quickly from home. No experience needed. Click here to apply!",
            Some("https://spam.example"),
        );
        let r = validate(&j, ValidationLevel::Lenient);
        assert!(r.quality_score < 0.3, "got {}", r.quality_score);
        assert!(!r.is_valid);
        assert!(!r.warnings.is_empty());
    }

    #[test]
    fn issues_alone_do_not_disqualify() {
        // Short summary logs an issue but the score can still clear lenient.
        let j = job(
            "Data Analyst",
            "Acme Ltd",
            "Dhaka",
            "Analyze data",
            Some("https://acme.example/jobs/9"),
        );
        let r = validate(&j, ValidationLevel::Lenient);
        assert!(!r.warnings.is_empty() || !r.issues.is_empty());
        assert!(r.is_valid, "score {}", r.quality_score);
    }

    #[test]
    fn missing_url_is_hard_penalty_only_under_strict() {
        let j = job("Backend Developer", "Acme Ltd", "Dhaka", "Build and maintain backend services for our platform.", None);
        let lenient = validate(&j, ValidationLevel::Lenient);
        let strict = validate(&j, ValidationLevel::Strict);
        assert!(strict.quality_score < lenient.quality_score);
        assert!(strict.issues.iter().any(|i| i.contains("url")));
    }

    #[test]
    fn adding_a_required_field_never_decreases_score() {
        let without = job(
            "Software Engineer",
            "TechCorp Ltd",
            "",
            "We are looking for a skilled software engineer with Python experience.",
            Some("https://techcorp.example/jobs/1"),
        );
        let mut with = without.clone();
        with.location = "Dhaka, Bangladesh".into();
        let a = validate(&without, ValidationLevel::Lenient).quality_score;
        let b = validate(&with, ValidationLevel::Lenient).quality_score;
        assert!(b >= a, "adding location dropped score {a} -> {b}");
    }

    #[test]
    fn malformed_and_shortened_urls_are_penalized() {
        let good = job("QA Engineer", "Acme Ltd", "Dhaka", "Test our products end to end.", Some("https://acme.example/jobs/2"));
        let bad = job("QA Engineer", "Acme Ltd", "Dhaka", "Test our products end to end.", Some("not a url"));
        let short = job("QA Engineer", "Acme Ltd", "Dhaka", "Test our products end to end.", Some("https://bit.ly/x"));
        let g = validate(&good, ValidationLevel::Lenient).quality_score;
        let b = validate(&bad, ValidationLevel::Lenient).quality_score;
        let s = validate(&short, ValidationLevel::Lenient).quality_score;
        assert!(b < g);
        assert!(s < g);
    }

    #[test]
    fn unrecognized_salary_is_a_small_warning() {
        let mut j = job("DevOps Engineer", "Acme Ltd", "Dhaka", "Keep our infrastructure healthy and fast.", Some("https://acme.example/jobs/3"));
        j.salary = Some("lots of gold".into());
        let r = validate(&j, ValidationLevel::Lenient);
        assert!(r.warnings.iter().any(|w| w.contains("salary")));
    }

    #[test]
    fn quality_buckets_follow_thresholds() {
        assert_eq!(Quality::from_score(0.85), Quality::Excellent);
        assert_eq!(Quality::from_score(0.6), Quality::Good);
        assert_eq!(Quality::from_score(0.4), Quality::Fair);
        assert_eq!(Quality::from_score(0.25), Quality::Poor);
        assert_eq!(Quality::from_score(0.1), Quality::Invalid);
    }
}
