// src/enrich.rs
//! # Enricher
//!
//! Fills absent structured fields from free text: skills from category
//! dictionaries, experience level and job type from keyword sets, location
//! via a canonical lookup table, plus a final confidence score.
//!
//! Pure, total batch transform. A field the enricher examined without a
//! match is set to its `NotSpecified` sentinel (or an empty skills list) —
//! explicitly different from a field nobody looked at yet.

use crate::listing::{ExperienceLevel, Field, JobListing, JobType, OPTIONAL_FIELDS, REQUIRED_FIELDS};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Maximum skills attached to one listing.
pub const MAX_SKILLS: usize = 10;
/// Maximum extracted requirement clauses.
pub const MAX_REQUIREMENTS: usize = 5;

/// Confidence score components.
pub const CONF_REQUIRED_FIELD: f32 = 0.15;
pub const CONF_OPTIONAL_FIELD: f32 = 0.05;
pub const CONF_LONG_SUMMARY: f32 = 0.1;
pub const CONF_HAS_SKILLS: f32 = 0.05;
/// Summary length that counts as substantive.
pub const LONG_SUMMARY_CHARS: usize = 100;

/// Category dictionaries scanned for skills, in attachment order.
const SKILL_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "languages",
        &[
            "python", "java", "javascript", "typescript", "c++", "c#", "php", "ruby", "go",
            "rust", "swift", "kotlin",
        ],
    ),
    (
        "frameworks",
        &[
            "react", "angular", "vue", "node.js", "django", "flask", "spring", "laravel",
            "express", "fastapi",
        ],
    ),
    (
        "databases",
        &[
            "mysql", "postgresql", "mongodb", "redis", "elasticsearch", "sqlite", "oracle",
            "sql server",
        ],
    ),
    (
        "cloud",
        &["aws", "azure", "gcp", "heroku", "digitalocean", "firebase", "vercel", "netlify"],
    ),
    (
        "tools",
        &[
            "docker", "kubernetes", "jenkins", "git", "github", "gitlab", "jira", "confluence",
            "slack",
        ],
    ),
    (
        "methodologies",
        &["agile", "scrum", "kanban", "devops", "ci/cd", "tdd", "bdd", "lean"],
    ),
];

/// Keyword sets per experience level; first set with a hit decides.
const EXPERIENCE_SETS: &[(ExperienceLevel, &[&str])] = &[
    (
        ExperienceLevel::Entry,
        &["entry", "junior", "fresher", "graduate", "0-1 years", "0-2 years", "no experience"],
    ),
    (
        ExperienceLevel::Mid,
        &["mid", "intermediate", "2-3 years", "3-5 years", "experienced"],
    ),
    (
        ExperienceLevel::Senior,
        &["senior", "lead", "principal", "architect", "5+ years", "7+ years", "10+ years"],
    ),
];

/// Keyword sets per job type; first set with a hit decides.
const JOB_TYPE_SETS: &[(JobType, &[&str])] = &[
    (JobType::FullTime, &["full time", "full-time", "permanent", "regular"]),
    (JobType::PartTime, &["part time", "part-time", "contract", "temporary"]),
    (JobType::Remote, &["remote", "work from home", "wfh", "virtual", "online"]),
    (JobType::Internship, &["internship", "intern", "trainee", "apprentice"]),
];

/// City → canonical form; checked in order, already-canonical values kept.
const LOCATION_CANON: &[(&str, &str)] = &[
    ("dhaka", "Dhaka, Bangladesh"),
    ("chittagong", "Chittagong, Bangladesh"),
    ("sylhet", "Sylhet, Bangladesh"),
    ("remote", "Remote"),
    ("bangladesh", "Bangladesh"),
];

static RE_REQUIREMENT: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)requirements?[:\s]+([^.]+)",
        r"(?i)qualifications?[:\s]+([^.]+)",
        r"(?i)experience[:\s]+([^.]+)",
        r"(?i)skills?[:\s]+([^.]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("requirement regex"))
    .collect()
});

/// Enrich a whole batch.
pub fn enrich(listings: Vec<JobListing>) -> Vec<JobListing> {
    listings.into_iter().map(enrich_one).collect()
}

/// Enrich a single listing.
pub fn enrich_one(mut job: JobListing) -> JobListing {
    let text = scan_text(&job);

    if job.skills.is_none() {
        job.skills = Some(extract_skills(&text));
    }
    if job.experience.is_none() {
        job.experience = Some(detect_experience(&text));
    }
    if job.job_type.is_none() {
        // Job type keys off title+summary only; requirements sections tend
        // to mention "remote tools" and similar false friends.
        let tt = format!("{} {}", job.title, job.summary).to_lowercase();
        job.job_type = Some(detect_job_type(&tt));
    }
    if job.requirements.is_none() {
        job.requirements = extract_requirements(&job.summary);
    }
    job.location = normalize_location(&job.location);
    job.confidence = Some(confidence_score(&job));
    job
}

fn scan_text(job: &JobListing) -> String {
    format!(
        "{} {} {}",
        job.title,
        job.summary,
        job.requirements.as_deref().unwrap_or("")
    )
    .to_lowercase()
}

/// Word-boundary-aware token set; keeps `+`, `#`, `.` and `/` so entries
/// like `c++`, `c#`, `node.js` and `ci/cd` survive tokenization.
fn token_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '/')))
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_matches('.').to_string())
        .collect()
}

pub fn extract_skills(text: &str) -> Vec<String> {
    let tokens = token_set(text);
    let mut out = Vec::new();
    for (_category, skills) in SKILL_CATEGORIES {
        for skill in *skills {
            let hit = if skill.contains(' ') {
                text.contains(skill)
            } else {
                tokens.contains(*skill)
            };
            if hit && !out.iter().any(|s: &String| s == skill) {
                out.push(skill.to_string());
                if out.len() == MAX_SKILLS {
                    return out;
                }
            }
        }
    }
    out
}

pub fn detect_experience(text: &str) -> ExperienceLevel {
    for (level, patterns) in EXPERIENCE_SETS {
        if patterns.iter().any(|p| text.contains(p)) {
            return *level;
        }
    }
    ExperienceLevel::NotSpecified
}

pub fn detect_job_type(text: &str) -> JobType {
    for (jt, patterns) in JOB_TYPE_SETS {
        if patterns.iter().any(|p| text.contains(p)) {
            return *jt;
        }
    }
    JobType::NotSpecified
}

pub fn normalize_location(location: &str) -> String {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let lower = trimmed.to_lowercase();
    for (key, canon) in LOCATION_CANON {
        if lower.contains(key) && !trimmed.contains(canon) {
            return canon.to_string();
        }
    }
    trimmed.to_string()
}

fn extract_requirements(summary: &str) -> Option<String> {
    let mut clauses = Vec::new();
    for re in RE_REQUIREMENT.iter() {
        for caps in re.captures_iter(summary) {
            if let Some(m) = caps.get(1) {
                let clause = m.as_str().trim();
                if !clause.is_empty() {
                    clauses.push(clause.to_string());
                    if clauses.len() == MAX_REQUIREMENTS {
                        return Some(clauses.join("; "));
                    }
                }
            }
        }
    }
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join("; "))
    }
}

pub fn confidence_score(job: &JobListing) -> f32 {
    let mut score = 0.0;
    for f in REQUIRED_FIELDS {
        if job.has_field(f) {
            score += CONF_REQUIRED_FIELD;
        }
    }
    for f in OPTIONAL_FIELDS {
        if job.has_field(f) {
            score += CONF_OPTIONAL_FIELD;
        }
    }
    if job.summary.chars().count() > LONG_SUMMARY_CHARS {
        score += CONF_LONG_SUMMARY;
    }
    if job.has_field(Field::Skills) {
        score += CONF_HAS_SKILLS;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::RawListing;

    fn job(summary: &str) -> JobListing {
        JobListing::from_raw(
            RawListing {
                title: "Software Engineer".into(),
                company: "TechCorp Ltd".into(),
                location: "dhaka".into(),
                summary: summary.into(),
                url: Some("https://techcorp.example/jobs/1".into()),
                ..Default::default()
            },
            "scraper_bdjobs",
        )
    }

    #[test]
    fn skills_extracted_case_insensitively() {
        let enriched = enrich_one(job("Experience with Python and React required"));
        assert_eq!(
            enriched.skills,
            Some(vec!["python".to_string(), "react".to_string()])
        );
    }

    #[test]
    fn no_skill_hits_leaves_explicit_empty_list() {
        let enriched = enrich_one(job("A great role for a motivated person"));
        assert_eq!(enriched.skills, Some(vec![]));
        // Checked-but-empty is distinct from never-checked.
        assert!(enriched.skills.is_some());
    }

    #[test]
    fn word_boundaries_prevent_substring_skills() {
        // "good" must not count as the language "go".
        let skills = extract_skills("a good opportunity to expand your horizons");
        assert!(skills.is_empty(), "got {skills:?}");

        let skills = extract_skills("we use go and c++ with ci/cd pipelines");
        assert_eq!(skills, vec!["c++", "go", "ci/cd"]);
    }

    #[test]
    fn experience_first_matching_set_wins() {
        assert_eq!(detect_experience("junior engineer wanted"), ExperienceLevel::Entry);
        assert_eq!(detect_experience("5+ years required"), ExperienceLevel::Senior);
        // "junior" (entry set) is checked before "senior".
        assert_eq!(
            detect_experience("junior to senior welcome"),
            ExperienceLevel::Entry
        );
        assert_eq!(detect_experience("nothing relevant"), ExperienceLevel::NotSpecified);
    }

    #[test]
    fn job_type_detection_and_sentinel() {
        assert_eq!(detect_job_type("full-time position"), JobType::FullTime);
        assert_eq!(detect_job_type("work from home role"), JobType::Remote);
        assert_eq!(detect_job_type("no hints here"), JobType::NotSpecified);
    }

    #[test]
    fn location_canonicalization() {
        assert_eq!(normalize_location("dhaka"), "Dhaka, Bangladesh");
        assert_eq!(normalize_location("Dhaka, Bangladesh"), "Dhaka, Bangladesh");
        assert_eq!(normalize_location("remote (worldwide)"), "Remote");
        assert_eq!(normalize_location("Berlin"), "Berlin");
        assert_eq!(normalize_location("  "), "");
    }

    #[test]
    fn requirements_extracted_from_summary() {
        let enriched = enrich_one(job(
            "Great team. Requirements: 3 years of Python, strong SQL. Apply today",
        ));
        let req = enriched.requirements.expect("requirements extracted");
        assert!(req.contains("Python"));
    }

    #[test]
    fn confidence_rises_with_completeness() {
        let sparse = enrich_one(JobListing::from_raw(
            RawListing {
                title: "Engineer".into(),
                ..Default::default()
            },
            "s",
        ));
        let full = enrich_one(job(
            "We are looking for a skilled software engineer with Python and React experience \
             to join our growing platform team in Dhaka.",
        ));
        let s = sparse.confidence.unwrap();
        let f = full.confidence.unwrap();
        assert!(f > s, "{f} <= {s}");
        assert!((0.0..=1.0).contains(&f));
    }

    #[test]
    fn enricher_does_not_overwrite_observed_fields() {
        let mut j = job("Python role");
        j.skills = Some(vec!["haskell".into()]);
        let enriched = enrich_one(j);
        assert_eq!(enriched.skills, Some(vec!["haskell".to_string()]));
    }
}
