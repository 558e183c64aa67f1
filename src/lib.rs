// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod backoff;
pub mod catalog;
pub mod collect;
pub mod dedup;
pub mod engine;
pub mod enrich;
pub mod listing;
pub mod pipeline;
pub mod query;
pub mod router;
pub mod tracker;
pub mod validate;

// ---- Re-exports for stable public API ----
pub use crate::catalog::{SourceCatalog, SourceKind, SourceProfile};
pub use crate::collect::{Collector, SourceOutcome};
pub use crate::engine::{FeedEngine, FeedReport, RunSummary};
pub use crate::listing::{JobListing, RawListing};
pub use crate::pipeline::{Pipeline, PipelineOutcome, PipelineStats};
pub use crate::query::{ParsedQuery, QueryType};
pub use crate::router::SourceSelector;
pub use crate::tracker::PerformanceTracker;
pub use crate::validate::{validate, ValidationLevel, ValidationResult};
