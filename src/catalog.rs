// src/catalog.rs
//! # Source Catalog
//!
//! Static registry of collector sources: id, kind, base priority and an
//! enabled flag. Loaded from TOML config with a built-in seed as fallback,
//! so the engine always has a usable catalog even with no config on disk.

use serde::Deserialize;
use std::{fs, path::Path};

pub const DEFAULT_CATALOG_PATH: &str = "config/sources.toml";

/// Kind of a data source. Closed set; ranking boosts dispatch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Api,
    Scraper,
    WebSearch,
}

/// Catalog entry for one collector source.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceProfile {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    /// Static base weight in [0,1]; performance feedback is layered on top.
    pub base_priority: f32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The full source catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceCatalog {
    #[serde(default)]
    pub sources: Vec<SourceProfile>,
}

impl SourceCatalog {
    /// Load catalog from a TOML file.
    /// Falls back to `default_seed()` on read or parse error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).unwrap_or_else(|_| Self::default_seed()),
            Err(_) => Self::default_seed(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&SourceProfile> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Enabled sources in catalog order.
    pub fn enabled(&self) -> impl Iterator<Item = &SourceProfile> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Built-in seed mirroring the job boards this engine grew up on.
    /// Deployments targeting other markets override via config.
    pub fn default_seed() -> Self {
        let mk = |id: &str, name: &str, kind: SourceKind, prio: f32| SourceProfile {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            base_priority: prio,
            enabled: true,
        };
        Self {
            sources: vec![
                mk("api_linkedin", "LinkedIn API", SourceKind::Api, 1.0),
                mk("api_indeed", "Indeed API", SourceKind::Api, 0.9),
                mk("scraper_bdjobs", "BDJobs Scraper", SourceKind::Scraper, 0.8),
                mk("scraper_linkedin", "LinkedIn Scraper", SourceKind::Scraper, 0.8),
                mk("scraper_skilljobs", "Skill.jobs Scraper", SourceKind::Scraper, 0.7),
                mk("scraper_shomvob", "Shomvob Scraper", SourceKind::Scraper, 0.6),
                mk("web_search", "Web Search", SourceKind::WebSearch, 0.5),
            ],
        }
    }
}
