// src/quality/rules.rs
// =============================================================================
// False-positive rules.
//
// A site is a false positive when it shows up in our keyword searches but is
// not part of the ecosystem: a seafood shop selling crabs, a Discord bot
// directory, a parked page, a domain another aggregator already lists.
//
// The rules form an ordered table of (tag, predicate) pairs. Evaluation stops
// at the first rule that fires and returns which rule it was and what it
// matched, so a verdict can always be explained.
// =============================================================================

use std::fmt;

use super::Scorer;

/// Which rule flagged a site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleTag {
    Excluded,
    AggregatorFeatured,
    NonHttpScheme,
    BadPattern(String),
    MinimalContent,
}

impl fmt::Display for RuleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleTag::Excluded => write!(f, "excluded"),
            RuleTag::AggregatorFeatured => write!(f, "aggregator-featured"),
            RuleTag::NonHttpScheme => write!(f, "non-http-scheme"),
            RuleTag::BadPattern(category) => write!(f, "bad-pattern:{}", category),
            RuleTag::MinimalContent => write!(f, "minimal-content"),
        }
    }
}

/// A tagged false-positive verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FalsePositive {
    pub tag: RuleTag,
    /// What matched: the phrase, the scheme marker, the exclusion reason...
    pub detail: String,
}

impl FalsePositive {
    fn new(tag: RuleTag, detail: impl Into<String>) -> Self {
        Self {
            tag,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FalsePositive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.tag, self.detail)
    }
}

/// The inputs every rule looks at, lowercased once.
pub struct RuleInput<'a> {
    pub domain: String,
    pub description: &'a str,
    /// "title description", lowercased
    pub text: String,
}

impl<'a> RuleInput<'a> {
    pub fn new(domain: &str, title: &str, description: &'a str) -> Self {
        Self {
            domain: domain.trim().to_lowercase(),
            description,
            text: format!("{} {}", title, description).to_lowercase(),
        }
    }
}

type Predicate = fn(&Scorer, &RuleInput<'_>) -> Option<FalsePositive>;

/// Rules in evaluation order.
pub const RULES: [(&str, Predicate); 5] = [
    ("excluded", excluded),
    ("aggregator-featured", aggregator_featured),
    ("non-http-scheme", non_http_scheme),
    ("bad-pattern", bad_pattern),
    ("minimal-content", minimal_content),
];

/// Runs the table; the first rule that fires decides.
pub fn evaluate(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    RULES.iter().find_map(|(name, rule)| {
        let verdict = rule(scorer, input)?;
        tracing::debug!(rule = *name, domain = %input.domain, detail = %verdict.detail, "false positive");
        Some(verdict)
    })
}

fn excluded(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    scorer
        .exclusion_reason(&input.domain)
        .map(|reason| FalsePositive::new(RuleTag::Excluded, reason))
}

fn aggregator_featured(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    scorer
        .is_aggregator_featured(&input.domain)
        .then(|| FalsePositive::new(RuleTag::AggregatorFeatured, input.domain.as_str()))
}

fn non_http_scheme(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    scorer
        .policy()
        .non_http_markers
        .iter()
        .find(|marker| input.domain.starts_with(marker.as_str()))
        .map(|marker| FalsePositive::new(RuleTag::NonHttpScheme, marker.as_str()))
}

fn bad_pattern(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    scorer.policy().bad_patterns.iter().find_map(|category| {
        category
            .phrases
            .iter()
            .find(|phrase| input.text.contains(&phrase.to_lowercase()))
            .map(|phrase| {
                FalsePositive::new(RuleTag::BadPattern(category.category.clone()), phrase.as_str())
            })
    })
}

// Nothing to go on: the description is just the domain, or it is very
// short and the domain itself doesn't say "molt"/"claw"/...
fn minimal_content(scorer: &Scorer, input: &RuleInput<'_>) -> Option<FalsePositive> {
    let description = input.description.trim();
    if description.to_lowercase() == input.domain {
        return Some(FalsePositive::new(
            RuleTag::MinimalContent,
            "description is the domain",
        ));
    }

    let policy = scorer.policy();
    let too_short = description.chars().count() < policy.thresholds.minimal_description_len;
    (too_short && !policy.has_core_token(&input.domain)).then(|| {
        FalsePositive::new(RuleTag::MinimalContent, "short description, generic domain")
    })
}
