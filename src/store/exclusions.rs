// src/store/exclusions.rs
// =============================================================================
// Domains known NOT to belong to the ecosystem (seafood shops, Discord bot
// lists, parked pages, ...). The quality pass treats any excluded domain as
// a false positive, whatever its content says.
//
// Records are never deleted by the program. Each one carries a
// recheck_after date; once it passes, the domain shows up in the recheck
// list and a fresh `exclude` replaces the record.
// =============================================================================

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::{load_or_default, save_json, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub reason: String,
    pub category: String,
    pub checked: NaiveDate,
    pub recheck_after: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionRegistry {
    #[serde(default)]
    pub excluded: BTreeMap<String, ExclusionRecord>,
    #[serde(default)]
    pub updated: Option<NaiveDate>,
}

impl ExclusionRegistry {
    pub fn load(path: &Path) -> Self {
        let registry: Self = load_or_default(path);
        tracing::info!(path = %path.display(), excluded = registry.excluded.len(), "loaded exclusions");
        registry
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.excluded.contains_key(&domain.to_lowercase())
    }

    pub fn get(&self, domain: &str) -> Option<&ExclusionRecord> {
        self.excluded.get(&domain.to_lowercase())
    }

    // Adds (or supersedes) the exclusion for a domain
    //
    // Parameters:
    //   today: the check date; recheck_after is `recheck_days` later
    pub fn exclude(
        &mut self,
        domain: &str,
        reason: &str,
        category: &str,
        today: NaiveDate,
        recheck_days: i64,
    ) {
        let record = ExclusionRecord {
            reason: reason.to_string(),
            category: category.to_string(),
            checked: today,
            recheck_after: today + Duration::days(recheck_days),
        };
        self.excluded.insert(domain.to_lowercase(), record);
        self.updated = Some(today);
    }

    /// Exclusions whose re-verification date has arrived, oldest first.
    pub fn due_for_recheck(&self, today: NaiveDate) -> Vec<(&str, &ExclusionRecord)> {
        let mut due: Vec<_> = self
            .excluded
            .iter()
            .filter(|(_, record)| record.recheck_after <= today)
            .map(|(domain, record)| (domain.as_str(), record))
            .collect();
        due.sort_by_key(|(domain, record)| (record.recheck_after, *domain));
        due
    }

    pub fn len(&self) -> usize {
        self.excluded.len()
    }
}
