// src/quality/score.rs
// =============================================================================
// Relevance and trust scoring.
//
// Relevance (0-100) measures how strongly a site's domain, title and
// description speak the ecosystem's vocabulary. Trust is a coarse label
// derived from relevance and red flags, unless a curator verified the site.
// =============================================================================

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::rules::{evaluate, FalsePositive, RuleInput};
use crate::policy::Policy;
use crate::store::{ExclusionRegistry, SiteRecord, Trust};

/// Keyword reported for sites rejected by the false-positive rules.
pub const FALSE_POSITIVE: &str = "FALSE_POSITIVE";

/// The scorer and the policy data it consults.
pub struct Scorer {
    policy: Arc<Policy>,
    exclusions: HashMap<String, String>,
    aggregator_featured: HashSet<String>,
}

/// Everything the quality pass computes for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub relevance: u8,
    pub trust: Trust,
    pub keywords: Vec<String>,
    pub false_positive: Option<FalsePositive>,
}

impl Scorer {
    pub fn new(
        policy: Arc<Policy>,
        exclusions: &ExclusionRegistry,
        aggregator_featured: HashSet<String>,
    ) -> Self {
        let exclusions = exclusions
            .excluded
            .iter()
            .map(|(domain, record)| (domain.to_lowercase(), record.reason.clone()))
            .collect();
        Self {
            policy,
            exclusions,
            aggregator_featured,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub(crate) fn exclusion_reason(&self, domain: &str) -> Option<&str> {
        self.exclusions.get(domain).map(String::as_str)
    }

    pub(crate) fn is_aggregator_featured(&self, domain: &str) -> bool {
        self.aggregator_featured.contains(domain)
    }

    /// Tagged verdict of the false-positive rule table.
    pub fn classify_false_positive(
        &self,
        domain: &str,
        title: &str,
        description: &str,
    ) -> Option<FalsePositive> {
        evaluate(self, &RuleInput::new(domain, title, description))
    }

    pub fn is_false_positive(&self, domain: &str, title: &str, description: &str) -> bool {
        self.classify_false_positive(domain, title, description)
            .is_some()
    }

    // Scores how much a site belongs to the ecosystem
    //
    // Returns: (score in 0..=100, matched keywords)
    //          (0, ["FALSE_POSITIVE"]) for false positives
    pub fn calculate_relevance(
        &self,
        domain: &str,
        title: &str,
        description: &str,
    ) -> (u8, Vec<String>) {
        if self.is_false_positive(domain, title, description) {
            return (0, vec![FALSE_POSITIVE.to_string()]);
        }

        let limits = &self.policy.thresholds;
        let text = format!("{} {} {}", domain, title, description).to_lowercase();
        let mut score: i32 = 0;
        let mut matches = Vec::new();

        for entry in &self.policy.relevance_keywords {
            if text.contains(&entry.keyword.to_lowercase()) {
                score += entry.weight * limits.keyword_multiplier;
                matches.push(entry.keyword.clone());
            }
        }

        let core = self.policy.has_core_token(domain);
        if core {
            score += limits.core_domain_bonus;
        } else if self.policy.has_generic_token(domain) {
            score += limits.generic_domain_bonus;
        }

        // Penalties are (without core token, with core token)
        let penalty = |(generic, with_core): (i32, i32)| if core { with_core } else { generic };
        let domain_lower = domain.trim().to_lowercase();

        if description == format!("Discovered at {}", domain) || description == domain {
            score = (score - penalty(limits.placeholder_penalty)).max(0);
        }
        if description.trim().to_lowercase() == domain_lower {
            score = (score - penalty(limits.equals_domain_penalty)).max(0);
        }
        if description.chars().count() < limits.short_description_len {
            score = (score - penalty(limits.short_description_penalty)).max(0);
        }

        (score.clamp(0, 100) as u8, matches)
    }

    /// Trust computed from content alone (no manual override).
    pub fn calculate_trust(&self, domain: &str, title: &str, description: &str, notes: &str) -> Trust {
        if self.is_false_positive(domain, title, description) {
            return Trust::Untrusted;
        }

        let text = format!("{} {} {} {}", domain, title, description, notes).to_lowercase();
        if self
            .policy
            .red_flags
            .iter()
            .any(|flag| text.contains(&flag.to_lowercase()))
        {
            return Trust::Untrusted;
        }

        let (relevance, _) = self.calculate_relevance(domain, title, description);
        let limits = &self.policy.thresholds;
        let relevance = i32::from(relevance);
        if relevance >= limits.high_trust_relevance {
            Trust::High
        } else if relevance >= limits.medium_trust_relevance {
            Trust::Medium
        } else {
            Trust::Low
        }
    }

    /// Scores a registry record; `verified` records always get Verified.
    pub fn assess(&self, domain: &str, record: &SiteRecord) -> Assessment {
        let description = record.description_or_title();
        let false_positive = self.classify_false_positive(domain, &record.title, description);
        let (relevance, keywords) = self.calculate_relevance(domain, &record.title, description);

        let trust = if record.verified {
            Trust::Verified
        } else {
            self.calculate_trust(domain, &record.title, description, &record.notes)
        };

        Assessment {
            relevance,
            trust,
            keywords,
            false_positive,
        }
    }
}

/// Featured = verified, or high trust with strong relevance.
pub fn qualifies_for_featured(record: &SiteRecord, policy: &Policy) -> bool {
    record.verified
        || (record.trust == Trust::High
            && i32::from(record.relevance) >= policy.thresholds.featured_relevance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Source;
    use chrono::NaiveDateTime;

    fn scorer() -> Scorer {
        Scorer::new(
            Arc::new(Policy::default()),
            &ExclusionRegistry::default(),
            HashSet::new(),
        )
    }

    fn record(title: &str, description: &str) -> SiteRecord {
        SiteRecord {
            url: "https://example.com".into(),
            source: Source::SeedCrawl,
            alive: true,
            has_content: true,
            title: title.into(),
            first_seen: NaiveDateTime::default(),
            relevance: 0,
            trust: Trust::Low,
            featured: false,
            notes: String::new(),
            description: description.into(),
            verified: false,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_moltbook_is_high_trust() {
        let s = scorer();
        let (relevance, keywords) =
            s.calculate_relevance("moltbook.com", "Moltbook", "Social network for molt agents");
        assert!(relevance >= 60);
        assert!(keywords.contains(&"molt".to_string()));
        assert_eq!(
            s.calculate_trust("moltbook.com", "Moltbook", "Social network for molt agents", ""),
            Trust::High
        );
    }

    #[test]
    fn test_crab_shop_is_untrusted() {
        let s = scorer();
        let description = "We sell live crabs, shipped nationwide";
        assert!(s.is_false_positive("crabs.com", "", description));
        assert_eq!(
            s.calculate_relevance("crabs.com", "", description),
            (0, vec![FALSE_POSITIVE.to_string()])
        );
        assert_eq!(s.calculate_trust("crabs.com", "", description, ""), Trust::Untrusted);
    }

    #[test]
    fn test_excluded_domain_is_always_false_positive() {
        let mut exclusions = ExclusionRegistry::default();
        exclusions.exclude("moltnews.ai", "Parked Hostinger domain", "parked-page", "2026-02-01".parse().unwrap(), 90);
        let s = Scorer::new(Arc::new(Policy::default()), &exclusions, HashSet::new());

        for (title, description) in [
            ("MoltNews", "The front page of the molt agent internet"),
            ("", ""),
            ("Openclaw", "Autonomous agents for agents, by agents"),
        ] {
            assert!(s.is_false_positive("moltnews.ai", title, description));
            assert_eq!(s.calculate_relevance("moltnews.ai", title, description).0, 0);
            assert_eq!(s.calculate_trust("moltnews.ai", title, description, ""), Trust::Untrusted);
        }
    }

    #[test]
    fn test_relevance_stays_in_range() {
        let s = scorer();
        let cases = [
            ("moltbook.com", "Molt Claw Lobster", "openclaw moltverse crustacean ai agent for agents llm claude agentic autonomous agent economy"),
            ("clawhub.ai", "", ""),
            ("moltx.io", "", "moltx.io"),
            ("agentarena.dev", "Arena", "An arena where autonomous agents compete"),
            ("x.org", "", "Discovered at x.org"),
        ];
        for (domain, title, description) in cases {
            let (relevance, _) = s.calculate_relevance(domain, title, description);
            assert!(relevance <= 100, "{domain}");
        }
        let (top, _) = s.calculate_relevance(cases[0].0, cases[0].1, cases[0].2);
        assert_eq!(top, 100);
    }

    #[test]
    fn test_penalties_are_smaller_for_core_domains() {
        let s = scorer();
        // "molt" 30 + core 30 - short 5
        assert_eq!(s.calculate_relevance("moltfeed.io", "", "Molt feed").0, 55);
        // "agent" 20 + generic 10, long enough to escape the penalty
        assert_eq!(
            s.calculate_relevance("agentfeed.io", "", "A feed for the community").0,
            30
        );
    }

    #[test]
    fn test_red_flags_in_notes() {
        let s = scorer();
        let trust = s.calculate_trust(
            "moltbook.com",
            "Moltbook",
            "Social network for molt agents",
            "database vulnerability reported",
        );
        assert_eq!(trust, Trust::Untrusted);
    }

    #[test]
    fn test_verified_overrides_everything() {
        let s = scorer();
        let mut r = record("", "We sell live crabs, shipped nationwide");
        r.verified = true;
        let assessment = s.assess("crabs.com", &r);
        assert_eq!(assessment.trust, Trust::Verified);
        assert_eq!(assessment.relevance, 0);
        assert!(assessment.false_positive.is_some());
    }

    #[test]
    fn test_assess_falls_back_to_title() {
        let s = scorer();
        let assessment = s.assess("moltbook.com", &record("Social network for molt agents", ""));
        assert_eq!(assessment.trust, Trust::High);
    }

    #[test]
    fn test_featured_rule() {
        let policy = Policy::default();
        let mut r = record("", "");
        r.trust = Trust::High;
        r.relevance = 60;
        assert!(qualifies_for_featured(&r, &policy));
        r.relevance = 59;
        assert!(!qualifies_for_featured(&r, &policy));
        r.trust = Trust::Low;
        r.verified = true;
        assert!(qualifies_for_featured(&r, &policy));
    }
}
