// src/listing.rs
//! Listing data model: the fixed-shape job record that flows through the
//! validation → dedup → enrichment pipeline, plus field-presence tracking.
//!
//! Collectors hand us best-effort `RawListing`s (any field may be empty or
//! absent, never an error). `JobListing::from_raw` turns one into the typed
//! record and notes which fields were actually observed, so downstream
//! scoring can tell "came from the source" apart from "defaulted here".

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::validate::ValidationTag;

/// Best-effort record as returned by an external collector.
/// Missing fields are empty strings / `None`, by contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub requirements: Option<String>,
}

/// Addressable fields of a listing, used for presence tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Company,
    Location,
    Summary,
    Url,
    Salary,
    Requirements,
    Skills,
    Experience,
    JobType,
}

/// Required for a listing to be considered minimally complete.
pub const REQUIRED_FIELDS: [Field; 4] = [Field::Title, Field::Company, Field::Location, Field::Summary];

/// Optional fields that feed completeness/confidence bonuses.
pub const OPTIONAL_FIELDS: [Field; 6] = [
    Field::Url,
    Field::Salary,
    Field::Requirements,
    Field::Skills,
    Field::Experience,
    Field::JobType,
];

/// Which fields were observed in collector output vs. defaulted/filled later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPresence {
    observed: BTreeSet<Field>,
}

impl FieldPresence {
    pub fn mark(&mut self, field: Field) {
        self.observed.insert(field);
    }

    pub fn observed(&self, field: Field) -> bool {
        self.observed.contains(&field)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }
}

/// Experience level sentinel type. `NotSpecified` means the enricher looked
/// and found nothing; an absent (`None`) field means nobody looked yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    NotSpecified,
}

/// Job type sentinel type; same `NotSpecified` semantics as above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Remote,
    Internship,
    NotSpecified,
}

/// One candidate job posting moving through the pipeline.
///
/// Mutation contract: the validator attaches `validation`, the deduplicator
/// only selects (never mutates), the enricher fills absent optional fields
/// and `confidence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub summary: String,
    pub url: Option<String>,
    pub salary: Option<String>,
    pub requirements: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<ExperienceLevel>,
    pub job_type: Option<JobType>,
    /// Id of the collector that produced this record.
    pub source: String,
    pub presence: FieldPresence,
    /// Attached by the validator; `None` before validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationTag>,
    /// Attached by the enricher; `None` before enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl JobListing {
    /// Build a typed listing from collector output, recording which fields
    /// were actually present. Empty strings count as absent.
    pub fn from_raw(raw: RawListing, source_id: &str) -> Self {
        let mut presence = FieldPresence::default();

        let title = raw.title.trim().to_string();
        let company = raw.company.trim().to_string();
        let location = raw.location.trim().to_string();
        let summary = raw.summary.trim().to_string();

        if !title.is_empty() {
            presence.mark(Field::Title);
        }
        if !company.is_empty() {
            presence.mark(Field::Company);
        }
        if !location.is_empty() {
            presence.mark(Field::Location);
        }
        if !summary.is_empty() {
            presence.mark(Field::Summary);
        }

        let url = non_empty(raw.url);
        let salary = non_empty(raw.salary);
        let requirements = non_empty(raw.requirements);

        if url.is_some() {
            presence.mark(Field::Url);
        }
        if salary.is_some() {
            presence.mark(Field::Salary);
        }
        if requirements.is_some() {
            presence.mark(Field::Requirements);
        }

        Self {
            title,
            company,
            location,
            summary,
            url,
            salary,
            requirements,
            skills: None,
            experience: None,
            job_type: None,
            source: source_id.to_string(),
            presence,
            validation: None,
            confidence: None,
        }
    }

    /// Presence check for a field, consulting current values for the
    /// enrichable fields (which can be filled after construction).
    pub fn has_field(&self, field: Field) -> bool {
        match field {
            Field::Title => !self.title.is_empty(),
            Field::Company => !self.company.is_empty(),
            Field::Location => !self.location.is_empty(),
            Field::Summary => !self.summary.is_empty(),
            Field::Url => self.url.is_some(),
            Field::Salary => self.salary.is_some(),
            Field::Requirements => self.requirements.is_some(),
            Field::Skills => self.skills.as_ref().is_some_and(|s| !s.is_empty()),
            Field::Experience => self
                .experience
                .is_some_and(|e| e != ExperienceLevel::NotSpecified),
            Field::JobType => self.job_type.is_some_and(|t| t != JobType::NotSpecified),
        }
    }
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_marks_presence_of_nonempty_fields() {
        let raw = RawListing {
            title: "Software Engineer".into(),
            company: "TechCorp Ltd".into(),
            location: "".into(),
            summary: "  ".into(),
            url: Some("https://techcorp.example/jobs/1".into()),
            salary: Some("".into()),
            requirements: None,
        };
        let job = JobListing::from_raw(raw, "scraper_bdjobs");

        assert!(job.presence.observed(Field::Title));
        assert!(job.presence.observed(Field::Company));
        assert!(!job.presence.observed(Field::Location));
        assert!(!job.presence.observed(Field::Summary));
        assert!(job.presence.observed(Field::Url));
        assert!(!job.presence.observed(Field::Salary));
        assert_eq!(job.salary, None);
        assert_eq!(job.source, "scraper_bdjobs");
    }

    #[test]
    fn sentinels_do_not_count_as_present() {
        let mut job = JobListing::from_raw(RawListing::default(), "s");
        job.experience = Some(ExperienceLevel::NotSpecified);
        job.job_type = Some(JobType::NotSpecified);
        job.skills = Some(vec![]);

        assert!(!job.has_field(Field::Experience));
        assert!(!job.has_field(Field::JobType));
        assert!(!job.has_field(Field::Skills));

        job.experience = Some(ExperienceLevel::Senior);
        assert!(job.has_field(Field::Experience));
    }
}
