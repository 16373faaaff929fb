// src/quality/batch.rs
// =============================================================================
// Registry-wide quality operations behind `molt-crawler quality ...`.
//
// Each function takes the stores it needs as arguments and mutates them in
// memory; the caller decides when to save. That keeps these passes
// independent of crawl timing and easy to test.
// =============================================================================

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

use super::rules::{FalsePositive, RuleTag};
use super::score::{qualifies_for_featured, Scorer};
use crate::policy::Policy;
use crate::store::{
    ensure_parent, AuditEntry, AuditLog, ExclusionRegistry, SiteRecord, SiteRegistry, Source,
    StoreError, Trust,
};

/// Result of re-scoring the whole registry.
#[derive(Debug, Default)]
pub struct ScoreSummary {
    pub distribution: BTreeMap<Trust, usize>,
    pub false_positives: Vec<(String, FalsePositive)>,
    /// Low/untrusted sites after scoring: (domain, trust, relevance)
    pub needs_review: Vec<(String, Trust, u8)>,
}

impl ScoreSummary {
    pub fn count(&self, trust: Trust) -> usize {
        self.distribution.get(&trust).copied().unwrap_or(0)
    }
}

/// Recomputes relevance and trust for every record.
pub fn score_registry(registry: &mut SiteRegistry, scorer: &Scorer) -> ScoreSummary {
    let mut summary = ScoreSummary::default();

    for (domain, record) in registry.sites.iter_mut() {
        let assessment = scorer.assess(domain, record);
        record.relevance = assessment.relevance;
        record.trust = assessment.trust;

        *summary.distribution.entry(record.trust).or_insert(0) += 1;
        if let Some(fp) = assessment.false_positive {
            summary.false_positives.push((domain.clone(), fp));
        }
        if record.trust.needs_review() {
            summary
                .needs_review
                .push((domain.clone(), record.trust, record.relevance));
        }
    }

    tracing::info!(
        sites = registry.sites.len(),
        false_positives = summary.false_positives.len(),
        "scored registry"
    );
    summary
}

// Sets featured on every qualifying record. Featured is never cleared.
//
// Returns: the domains newly marked
pub fn mark_featured(registry: &mut SiteRegistry, policy: &Policy) -> Vec<String> {
    let mut marked = Vec::new();
    for (domain, record) in registry.sites.iter_mut() {
        if !record.featured && qualifies_for_featured(record, policy) {
            record.featured = true;
            marked.push(domain.clone());
        }
    }
    marked
}

/// Low/untrusted records, lowest relevance first.
pub fn low_quality(registry: &SiteRegistry) -> Vec<(&str, &SiteRecord)> {
    let mut sites: Vec<_> = registry
        .sites
        .iter()
        .filter(|(_, record)| record.trust.needs_review())
        .map(|(domain, record)| (domain.as_str(), record))
        .collect();
    sites.sort_by_key(|(domain, record)| (record.relevance, *domain));
    sites
}

/// Records at or above both a trust level and a relevance score.
pub fn filter_quality(
    registry: &SiteRegistry,
    min_trust: Trust,
    min_relevance: u8,
) -> Vec<(&str, &SiteRecord)> {
    registry
        .sites
        .iter()
        .filter(|(_, r)| r.trust >= min_trust && r.relevance >= min_relevance)
        .map(|(domain, record)| (domain.as_str(), record))
        .collect()
}

// Writes the review queue as CSV. The trailing "action" column is left
// empty for the reviewer.
//
// Returns: number of rows written (header excluded)
pub fn export_csv(registry: &SiteRegistry, path: &Path) -> Result<usize, StoreError> {
    let csv_err = |source| StoreError::Csv {
        path: path.to_path_buf(),
        source,
    };

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer
        .write_record(["domain", "title", "trust", "relevance", "description", "action"])
        .map_err(csv_err)?;

    let rows = low_quality(registry);
    for (domain, record) in &rows {
        let description: String = record.description.chars().take(100).collect();
        let relevance = record.relevance.to_string();
        writer
            .write_record([
                *domain,
                record.title.as_str(),
                record.trust.as_str(),
                relevance.as_str(),
                description.as_str(),
                "",
            ])
            .map_err(csv_err)?;
    }

    writer.flush().map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rows.len())
}

/// What a cleanup pass removed.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub removed: Vec<(String, FalsePositive)>,
    /// Domains that received a new automatic exclusion record.
    pub auto_excluded: Vec<String>,
}

// Deletes false positives from the registry
//
// Sites rejected by a phrase of the bad-pattern table are also added to the
// exclusion registry (category = rule tag) so later crawls keep rejecting
// them even if their content changes. One audit entry per removal plus a
// summary entry.
pub fn cleanup(
    registry: &mut SiteRegistry,
    exclusions: &mut ExclusionRegistry,
    audit: &mut AuditLog,
    scorer: &Scorer,
    today: NaiveDate,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    let flagged: Vec<(String, FalsePositive)> = registry
        .sites
        .iter()
        .filter_map(|(domain, record)| {
            scorer
                .classify_false_positive(domain, &record.title, record.description_or_title())
                .map(|fp| (domain.clone(), fp))
        })
        .collect();

    let recheck_days = scorer.policy().thresholds.recheck_after_days;
    for (domain, fp) in flagged {
        registry.remove(&domain);

        if matches!(fp.tag, RuleTag::BadPattern(_)) && !exclusions.contains(&domain) {
            let reason = format!("matched \"{}\"", fp.detail);
            exclusions.exclude(&domain, &reason, &fp.tag.to_string(), today, recheck_days);
            report.auto_excluded.push(domain.clone());
        }

        audit.record(
            AuditEntry::new(today, "cleanup-remove")
                .site(&domain)
                .reason(&fp.to_string()),
        );
        report.removed.push((domain, fp));
    }

    audit.record(AuditEntry::new(today, "cleanup").count(report.removed.len()));
    report
}

/// Manual exclusion (`quality exclude <domain> <reason>`).
pub fn exclude_manually(
    exclusions: &mut ExclusionRegistry,
    audit: &mut AuditLog,
    domain: &str,
    reason: &str,
    today: NaiveDate,
    recheck_days: i64,
) {
    exclusions.exclude(domain, reason, "manual", today, recheck_days);
    audit.record(
        AuditEntry::new(today, "exclude")
            .site(domain)
            .reason(reason),
    );
}

/// Counts shown by `quality stats`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub total: usize,
    pub alive: usize,
    pub with_content: usize,
    pub featured: usize,
    pub verified: usize,
    pub by_trust: BTreeMap<Trust, usize>,
    /// "crawl", "link", "lead", "bruteforce"
    pub by_source: BTreeMap<&'static str, usize>,
    pub excluded: usize,
    pub due_for_recheck: usize,
}

impl RegistryStats {
    pub fn collect(registry: &SiteRegistry, exclusions: &ExclusionRegistry, today: NaiveDate) -> Self {
        let mut stats = RegistryStats {
            total: registry.len(),
            excluded: exclusions.len(),
            due_for_recheck: exclusions.due_for_recheck(today).len(),
            ..Default::default()
        };

        for record in registry.sites.values() {
            stats.alive += usize::from(record.alive);
            stats.with_content += usize::from(record.has_content);
            stats.featured += usize::from(record.featured);
            stats.verified += usize::from(record.verified);
            *stats.by_trust.entry(record.trust).or_insert(0) += 1;

            let source = match record.source {
                Source::SeedCrawl => "crawl",
                Source::Link => "link",
                Source::LeadSource(_) => "lead",
                Source::Bruteforce => "bruteforce",
            };
            *stats.by_source.entry(source).or_insert(0) += 1;
        }
        stats
    }
}
