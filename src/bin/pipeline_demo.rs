//! Demo that runs a few queries against fixture-backed collectors and
//! prints the ranked feed plus run diagnostics (stdout/log only).

use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use jobsift::{
    Collector, FeedEngine, ParsedQuery, Pipeline, RawListing, SourceCatalog,
};

const FIXTURES: &str = include_str!("../../tests/fixtures/listings.json");

struct FixtureCollector {
    id: String,
    listings: Vec<RawListing>,
}

#[async_trait]
impl Collector for FixtureCollector {
    fn source_id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, _query: &ParsedQuery) -> Result<Vec<RawListing>> {
        Ok(self.listings.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let fixtures: HashMap<String, Vec<RawListing>> = serde_json::from_str(FIXTURES)?;

    let catalog = SourceCatalog::default_seed();
    let mut engine = FeedEngine::new(catalog.clone(), Pipeline::default());
    for source in &catalog.sources {
        let listings = fixtures.get(&source.id).cloned().unwrap_or_default();
        engine.register(Arc::new(FixtureCollector {
            id: source.id.clone(),
            listings,
        }));
    }

    let queries = [
        ParsedQuery {
            skills: vec!["python".into(), "react".into()],
            ..Default::default()
        },
        ParsedQuery {
            company: Some("TechCorp".into()),
            ..Default::default()
        },
        ParsedQuery {
            remote: true,
            ..Default::default()
        },
    ];

    for query in queries {
        let report = engine.run(&query).await?;
        println!("query: {}", serde_json::to_string(&query)?);
        println!("summary: {}", serde_json::to_string_pretty(&report.summary)?);
        for job in &report.listings {
            println!(
                "  [{:.2}] {} @ {} ({}) via {}",
                job.confidence.unwrap_or(0.0),
                job.title,
                job.company,
                job.location,
                job.source
            );
        }
        println!();
    }

    println!("pipeline-demo done");
    Ok(())
}
