// src/store/audit.rs
// =============================================================================
// Append-only log of curation actions (exclusions, cleanups, dedup runs).
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{load_or_default, save_json, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub date: NaiveDate,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl AuditEntry {
    pub fn new(date: NaiveDate, action: &str) -> Self {
        Self {
            date,
            action: action.to_string(),
            site: None,
            reason: None,
            count: None,
        }
    }

    pub fn site(mut self, site: &str) -> Self {
        self.site = Some(site.to_string());
        self
    }

    pub fn reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(default)]
    pub log: Vec<AuditEntry>,
}

impl AuditLog {
    pub fn load(path: &Path) -> Self {
        load_or_default(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    pub fn record(&mut self, entry: AuditEntry) {
        tracing::info!(action = %entry.action, site = ?entry.site, count = ?entry.count, "audit");
        self.log.push(entry);
    }
}
