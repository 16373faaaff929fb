// src/crawl/visited.rs
// =============================================================================
// The set of domains already claimed by this run.
//
// A domain can be reached from several discovery paths at once (two seeds
// linking to the same site, a lead page and a seed, ...). claim() checks and
// inserts under one lock, so exactly one of those paths gets to fetch it.
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct VisitedTracker {
    seen: Mutex<HashSet<String>>,
}

impl VisitedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the domain as visited. Returns false if it already was.
    pub fn claim(&self, domain: &str) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.insert(domain.to_string())
    }

    pub fn contains(&self, domain: &str) -> bool {
        let seen = self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        seen.contains(domain)
    }

    pub fn snapshot(&self) -> HashSet<String> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
