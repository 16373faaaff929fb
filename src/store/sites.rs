// src/store/sites.rs
// =============================================================================
// The site registry: every domain the crawler has classified, keyed by its
// normalized domain.
//
// Records are merged, never appended: visiting a domain again refreshes
// alive/has_content (and the title, when the new one is non-empty) while
// first_seen and source stay as they were first recorded. That makes a
// repeated write for the same domain harmless.
//
// The file is also edited by hand, so each record is read on its own: one
// malformed record is skipped with a warning instead of emptying the whole
// registry, and fields this crate does not know are carried through saves.
// =============================================================================

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use super::{load_or_default, save_json, StoreError};

/// How a site entered the registry.
///
/// Stored as "crawl", "link", "lead:<name>" or "bruteforce".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    SeedCrawl,
    Link,
    LeadSource(String),
    Bruteforce,
}

impl From<String> for Source {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "crawl" | "seed-crawl" => Source::SeedCrawl,
            "bruteforce" => Source::Bruteforce,
            "lead-source" => Source::LeadSource(String::new()),
            _ => match raw.strip_prefix("lead:") {
                Some(name) => Source::LeadSource(name.to_string()),
                None => Source::Link,
            },
        }
    }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        source.to_string()
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::SeedCrawl => write!(f, "crawl"),
            Source::Link => write!(f, "link"),
            Source::LeadSource(name) if name.is_empty() => write!(f, "lead-source"),
            Source::LeadSource(name) => write!(f, "lead:{}", name),
            Source::Bruteforce => write!(f, "bruteforce"),
        }
    }
}

/// Confidence in a site's legitimacy. Ordered from worst to best.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Trust {
    Untrusted,
    #[default]
    Low,
    Medium,
    High,
    Verified,
}

impl Trust {
    pub const ALL: [Trust; 5] = [
        Trust::Verified,
        Trust::High,
        Trust::Medium,
        Trust::Low,
        Trust::Untrusted,
    ];

    /// Low and untrusted sites are the ones queued for manual review.
    pub fn needs_review(self) -> bool {
        matches!(self, Trust::Low | Trust::Untrusted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trust::Verified => "verified",
            Trust::High => "high",
            Trust::Medium => "medium",
            Trust::Low => "low",
            Trust::Untrusted => "untrusted",
        }
    }
}

impl fmt::Display for Trust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub url: String,
    pub source: Source,
    #[serde(default)]
    pub alive: bool,
    #[serde(default)]
    pub has_content: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default = "now")]
    pub first_seen: NaiveDateTime,
    #[serde(default)]
    pub relevance: u8,
    #[serde(default)]
    pub trust: Trust,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub notes: String,
    /// Curated description; the title stands in for it while empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Manual override: a verified site always has trust "verified".
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub verified: bool,
    /// Curator-added fields, kept as they are.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SiteRecord {
    pub fn description_or_title(&self) -> &str {
        if self.description.is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

/// One classification result to merge into the registry.
#[derive(Debug, Clone)]
pub struct Visit {
    pub domain: String,
    pub url: String,
    pub source: Source,
    pub alive: bool,
    pub has_content: bool,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRegistry {
    #[serde(default = "now")]
    pub created: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "readable_sites")]
    pub sites: BTreeMap<String, SiteRecord>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

// Decodes the records one by one, dropping those that do not fit
fn readable_sites<'de, D>(deserializer: D) -> Result<BTreeMap<String, SiteRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(domain, value)| match serde_json::from_value(value) {
            Ok(record) => Some((domain, record)),
            Err(e) => {
                tracing::warn!(domain = %domain, error = %e, "skipping unreadable site record");
                None
            }
        })
        .collect())
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self {
            created: now(),
            last_updated: None,
            sites: BTreeMap::new(),
        }
    }
}

impl SiteRegistry {
    pub fn load(path: &Path) -> Self {
        let registry: Self = load_or_default(path);
        tracing::info!(path = %path.display(), sites = registry.sites.len(), "loaded site registry");
        registry
    }

    pub fn save(&mut self, path: &Path) -> Result<(), StoreError> {
        self.last_updated = Some(now());
        save_json(path, self)?;
        tracing::info!(
            path = %path.display(),
            sites = self.sites.len(),
            with_content = self.real_count(),
            "saved site registry"
        );
        Ok(())
    }

    // Merges a visit into the registry
    //
    // Returns: true if the domain was not in the registry before
    pub fn record_visit(&mut self, visit: Visit) -> bool {
        match self.sites.get_mut(&visit.domain) {
            Some(record) => {
                record.alive = visit.alive;
                record.has_content = visit.has_content;
                if !visit.title.is_empty() {
                    record.title = visit.title;
                }
                false
            }
            None => {
                let record = SiteRecord {
                    url: visit.url,
                    source: visit.source,
                    alive: visit.alive,
                    has_content: visit.has_content,
                    title: visit.title,
                    first_seen: now(),
                    relevance: 0,
                    trust: Trust::default(),
                    featured: false,
                    notes: String::new(),
                    description: String::new(),
                    verified: false,
                    extra: BTreeMap::new(),
                };
                self.sites.insert(visit.domain, record);
                true
            }
        }
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.sites.contains_key(domain)
    }

    pub fn get(&self, domain: &str) -> Option<&SiteRecord> {
        self.sites.get(domain)
    }

    pub fn remove(&mut self, domain: &str) -> Option<SiteRecord> {
        self.sites.remove(domain)
    }

    pub fn known(&self) -> HashSet<String> {
        self.sites.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Number of sites with real (non-parked) content.
    pub fn real_count(&self) -> usize {
        self.sites.values().filter(|r| r.has_content).count()
    }
}
