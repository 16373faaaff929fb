// src/dedupe.rs
// =============================================================================
// Cross-TLD duplicate resolution.
//
// The brute-force phase happily finds clawhub.ai, clawhub.xyz and
// clawhub.io. Often only one of them is the real site; the others are
// parked copies or squatters. This pass groups registry entries by base
// name (the domain without its TLD), ranks each group, and proposes which
// members to drop.
//
// How a group is resolved:
// 1. Skip it when every pair of members is on the known-different list
// 2. Score each member (TLD preference + relevance + trust + ...)
// 3. Keep the best; drop another member unless it is known to be a
//    different site, or it scores close to the best and is trusted
// 4. Of two dropped members that are known to be different sites, keep
//    the better one
//
// Nothing is removed unless the caller applies the plan.
// =============================================================================

use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::BTreeMap;

use crate::policy::Policy;
use crate::store::{AuditEntry, AuditLog, SiteRecord, SiteRegistry, Trust};

// Longest entry of the TLD table the domain ends with
fn known_tld<'a>(domain: &str, policy: &'a Policy) -> Option<&'a str> {
    policy
        .tld_priority
        .keys()
        .filter(|tld| domain.ends_with(tld.as_str()))
        .max_by_key(|tld| tld.len())
        .map(String::as_str)
}

/// The domain without its TLD ("clawhub.ai" -> "clawhub").
pub fn base_name<'d>(domain: &'d str, policy: &Policy) -> &'d str {
    if let Some(tld) = known_tld(domain, policy) {
        return &domain[..domain.len() - tld.len()];
    }
    match domain.rsplit_once('.') {
        Some((base, _)) => base,
        None => domain,
    }
}

/// The TLD including its dot, or "" for a dotless name.
pub fn tld<'d>(domain: &'d str, policy: &Policy) -> &'d str {
    if let Some(tld) = known_tld(domain, policy) {
        return &domain[domain.len() - tld.len()..];
    }
    match domain.rfind('.') {
        Some(i) => &domain[i..],
        None => "",
    }
}

/// Ranking score of one group member. Higher is better.
pub fn quality_score(domain: &str, record: &SiteRecord, policy: &Policy) -> i32 {
    let limits = &policy.thresholds;
    let mut score = policy
        .tld_priority
        .get(tld(domain, policy))
        .copied()
        .unwrap_or(limits.default_tld_priority);

    score += i32::from(record.relevance);
    score += match record.trust {
        Trust::Verified => limits.trust_bonus_verified,
        Trust::High => limits.trust_bonus_high,
        Trust::Medium => limits.trust_bonus_medium,
        Trust::Low => limits.trust_bonus_low,
        Trust::Untrusted => limits.trust_bonus_untrusted,
    };

    let description = record.description_or_title();
    let weak = policy
        .weak_description_markers
        .iter()
        .any(|marker| description.contains(marker.as_str()));
    if !description.is_empty() && !weak {
        score += limits.description_bonus;
    }

    if record.featured {
        score += limits.featured_bonus;
    }
    score
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSite {
    pub domain: String,
    pub score: i32,
    pub trust: Trust,
    pub remove: bool,
}

/// One base name with several TLDs. `members[0]` is the one kept.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub base: String,
    pub members: Vec<RankedSite>,
}

impl DuplicateGroup {
    pub fn keep(&self) -> &RankedSite {
        &self.members[0]
    }

    pub fn removals(&self) -> impl Iterator<Item = &RankedSite> {
        self.members.iter().filter(|m| m.remove)
    }
}

#[derive(Debug, Default)]
pub struct DedupePlan {
    pub groups: Vec<DuplicateGroup>,
}

impl DedupePlan {
    // Builds the plan for the current registry. Pure: the registry is not
    // touched.
    pub fn build(registry: &SiteRegistry, policy: &Policy) -> Self {
        let mut by_base: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for domain in registry.sites.keys() {
            by_base
                .entry(base_name(domain, policy))
                .or_default()
                .push(domain.as_str());
        }

        let groups = by_base
            .into_iter()
            .filter(|(_, domains)| domains.len() > 1)
            .filter(|(_, domains)| !all_known_different(domains, policy))
            .filter_map(|(base, domains)| rank_group(base, &domains, registry, policy))
            .collect();

        Self { groups }
    }

    pub fn removals(&self) -> Vec<&RankedSite> {
        self.groups.iter().flat_map(DuplicateGroup::removals).collect()
    }

    // Removes the flagged domains from the registry
    //
    // Returns: number of records removed
    pub fn apply(&self, registry: &mut SiteRegistry, audit: &mut AuditLog, today: NaiveDate) -> usize {
        let mut removed = 0;
        for group in &self.groups {
            let keep = &group.keep().domain;
            for site in group.removals() {
                if registry.remove(&site.domain).is_some() {
                    removed += 1;
                    audit.record(
                        AuditEntry::new(today, "dedupe-remove")
                            .site(&site.domain)
                            .reason(&format!("duplicate of {}", keep)),
                    );
                }
            }
        }
        audit.record(AuditEntry::new(today, "dedupe").count(removed));
        removed
    }
}

fn all_known_different(domains: &[&str], policy: &Policy) -> bool {
    domains.iter().enumerate().all(|(i, a)| {
        domains[i + 1..]
            .iter()
            .all(|b| policy.is_known_different(a, b))
    })
}

fn rank_group(
    base: &str,
    domains: &[&str],
    registry: &SiteRegistry,
    policy: &Policy,
) -> Option<DuplicateGroup> {
    let mut members: Vec<RankedSite> = domains
        .iter()
        .filter_map(|domain| {
            registry.get(domain).map(|record| RankedSite {
                domain: domain.to_string(),
                score: quality_score(domain, record, policy),
                trust: record.trust,
                remove: false,
            })
        })
        .collect();
    members.sort_by(|a, b| (Reverse(a.score), &a.domain).cmp(&(Reverse(b.score), &b.domain)));

    let (top, rest) = members.split_first_mut()?;
    let gap = policy.thresholds.dedupe_score_gap;
    for member in rest {
        if policy.is_known_different(&top.domain, &member.domain) {
            continue;
        }
        let close_and_trusted = member.score >= top.score - gap && !member.trust.needs_review();
        member.remove = !close_and_trusted;
    }
    spare_known_different(&mut members, policy);

    Some(DuplicateGroup {
        base: base.to_string(),
        members,
    })
}

// Two flagged members that are different sites can't both go: the better
// ranked one of each such pair stays. `members` is sorted best first.
fn spare_known_different(members: &mut [RankedSite], policy: &Policy) {
    for i in 0..members.len() {
        if !members[i].remove {
            continue;
        }
        let paired = members[i + 1..]
            .iter()
            .any(|other| other.remove && policy.is_known_different(&members[i].domain, &other.domain));
        if paired {
            members[i].remove = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Source, Visit};

    fn add(registry: &mut SiteRegistry, domain: &str, trust: Trust, relevance: u8, description: &str) {
        registry.record_visit(Visit {
            domain: domain.to_string(),
            url: format!("https://{}", domain),
            source: Source::Bruteforce,
            alive: true,
            has_content: true,
            title: String::new(),
        });
        let record = registry.sites.get_mut(domain).unwrap();
        record.trust = trust;
        record.relevance = relevance;
        record.description = description.to_string();
    }

    #[test]
    fn test_base_name_and_tld() {
        let policy = Policy::default();
        assert_eq!(base_name("moltbook.com", &policy), "moltbook");
        assert_eq!(tld("moltbook.com", &policy), ".com");
        assert_eq!(base_name("moltbook.co", &policy), "moltbook");
        assert_eq!(tld("moltbook.co", &policy), ".co");
        // not in the priority table
        assert_eq!(base_name("claw.direct", &policy), "claw");
        assert_eq!(tld("claw.direct", &policy), ".direct");
        assert_eq!(base_name("localhost", &policy), "localhost");
        assert_eq!(tld("localhost", &policy), "");
    }

    #[test]
    fn test_quality_score() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        add(&mut registry, "clawhub.ai", Trust::High, 80, "Skill registry for agents");
        add(&mut registry, "clawhub.xyz", Trust::Low, 20, "Parked domain");
        add(&mut registry, "clawhub.direct", Trust::Untrusted, 0, "");

        // 85 + 80 + 50 + 20
        assert_eq!(quality_score("clawhub.ai", registry.get("clawhub.ai").unwrap(), &policy), 235);
        // 50 + 20 + 0, no bonus for a parked description
        assert_eq!(quality_score("clawhub.xyz", registry.get("clawhub.xyz").unwrap(), &policy), 70);
        // default tld 20 - 50
        assert_eq!(quality_score("clawhub.direct", registry.get("clawhub.direct").unwrap(), &policy), -30);
    }

    #[test]
    fn test_parked_copy_is_removed() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        add(&mut registry, "clawhub.ai", Trust::High, 80, "Skill registry for agents");
        add(&mut registry, "clawhub.xyz", Trust::Low, 20, "Parked domain");

        let plan = DedupePlan::build(&registry, &policy);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].base, "clawhub");
        assert_eq!(plan.groups[0].keep().domain, "clawhub.ai");
        let removals: Vec<&str> = plan.removals().iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(removals, vec!["clawhub.xyz"]);
    }

    #[test]
    fn test_close_trusted_members_survive() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        // 80 + 50 + 25 + 20 = 175 vs 90 + 45 + 25 + 20 = 180
        add(&mut registry, "shellmates.app", Trust::Medium, 50, "Dating for agents");
        add(&mut registry, "shellmates.io", Trust::Medium, 45, "Dating for agents");

        let plan = DedupePlan::build(&registry, &policy);
        assert_eq!(plan.groups[0].keep().domain, "shellmates.io");
        assert!(plan.removals().is_empty());
    }

    #[test]
    fn test_known_different_pairs_are_never_removed() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        add(&mut registry, "moltbook.com", Trust::High, 90, "Social network for agents");
        add(&mut registry, "moltbook.town", Trust::Low, 10, "Pixel town");
        add(&mut registry, "moltbook.co", Trust::Low, 10, "Daily digest");

        // every pair is known-different: no group at all
        let plan = DedupePlan::build(&registry, &policy);
        assert!(plan.groups.is_empty());

        // an unrelated copy joins the group; only it is removed
        add(&mut registry, "moltbook.io", Trust::Low, 10, "");
        let plan = DedupePlan::build(&registry, &policy);
        let removals: Vec<&str> = plan.removals().iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(removals, vec!["moltbook.io"]);
    }

    #[test]
    fn test_known_different_pair_below_an_outsider_keeps_one() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        add(&mut registry, "moltbook.io", Trust::High, 90, "Social network for agents");
        add(&mut registry, "moltbook.town", Trust::Low, 10, "Pixel town");
        add(&mut registry, "moltbook.co", Trust::Low, 10, "Daily digest");

        let plan = DedupePlan::build(&registry, &policy);
        assert_eq!(plan.groups[0].keep().domain, "moltbook.io");
        // .co outranks .town, so it is the one spared
        let removals: Vec<&str> = plan.removals().iter().map(|r| r.domain.as_str()).collect();
        assert_eq!(removals, vec!["moltbook.town"]);
    }

    #[test]
    fn test_ties_break_by_domain() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        // 40 + 10 == 45 + 5
        add(&mut registry, "clawx.bot", Trust::Low, 10, "");
        add(&mut registry, "clawx.live", Trust::Low, 5, "");

        let plan = DedupePlan::build(&registry, &policy);
        assert_eq!(plan.groups[0].members[0].score, plan.groups[0].members[1].score);
        assert_eq!(plan.groups[0].keep().domain, "clawx.bot");
    }

    #[test]
    fn test_apply_removes_and_audits() {
        let policy = Policy::default();
        let mut registry = SiteRegistry::default();
        add(&mut registry, "clawhub.ai", Trust::High, 80, "Skill registry for agents");
        add(&mut registry, "clawhub.xyz", Trust::Low, 20, "Parked domain");
        let mut audit = AuditLog::default();

        let plan = DedupePlan::build(&registry, &policy);
        let removed = plan.apply(&mut registry, &mut audit, "2026-10-19".parse().unwrap());

        assert_eq!(removed, 1);
        assert!(!registry.contains("clawhub.xyz"));
        assert!(registry.contains("clawhub.ai"));
        assert_eq!(audit.log[0].reason.as_deref(), Some("duplicate of clawhub.ai"));
        assert_eq!(audit.log[1].count, Some(1));
    }
}
