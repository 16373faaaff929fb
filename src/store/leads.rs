// src/store/leads.rs
// =============================================================================
// Lead sources and aggregators (lead_sources.json).
//
// - lead_sources: aggregator pages whose outbound links are harvested during
//   the crawl
// - aggregators: other directories; the domains they already feature are
//   treated as duplicates by the quality pass
//
// This file is configuration: it is read, never written.
// =============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use super::load_or_default;
use crate::classify::normalize_domain;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSource {
    #[serde(default)]
    pub url: Option<String>,
    /// Free-form metadata (notes, categories) kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aggregator {
    #[serde(default)]
    pub featured_domains: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadConfig {
    #[serde(default)]
    pub lead_sources: BTreeMap<String, LeadSource>,
    #[serde(default)]
    pub aggregators: BTreeMap<String, Aggregator>,
}

impl LeadConfig {
    pub fn load(path: &Path) -> Self {
        let config: Self = load_or_default(path);
        tracing::info!(
            path = %path.display(),
            lead_sources = config.lead_sources.len(),
            aggregators = config.aggregators.len(),
            "loaded lead sources"
        );
        config
    }

    /// (name, url) of every lead source; a source without a url is
    /// fetched at https://<name>.
    pub fn lead_urls(&self) -> Vec<(String, String)> {
        self.lead_sources
            .iter()
            .map(|(name, source)| {
                let url = source
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("https://{}", name));
                (name.clone(), url)
            })
            .collect()
    }

    /// Every domain some aggregator already features, normalized.
    pub fn featured_set(&self) -> HashSet<String> {
        self.aggregators
            .values()
            .flat_map(|a| a.featured_domains.iter())
            .map(|d| normalize_domain(d))
            .filter(|d| !d.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lead_config() {
        let config: LeadConfig = serde_json::from_str(
            r#"{
              "lead_sources": {
                "agentsy.live": {"url": "https://agentsy.live/directory", "note": "big list"},
                "claw.direct": {}
              },
              "aggregators": {
                "moltiverse": {"featured_domains": ["https://www.Moltbook.com", "clawk.ai"]}
              }
            }"#,
        )
        .unwrap();

        let urls = config.lead_urls();
        assert_eq!(
            urls,
            vec![
                ("agentsy.live".to_string(), "https://agentsy.live/directory".to_string()),
                ("claw.direct".to_string(), "https://claw.direct".to_string()),
            ]
        );
        assert_eq!(config.lead_sources["agentsy.live"].extra["note"], "big list");

        let featured = config.featured_set();
        assert!(featured.contains("moltbook.com"));
        assert!(featured.contains("clawk.ai"));
    }
}
