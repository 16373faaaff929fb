// src/policy.rs
// =============================================================================
// Classification policy: every keyword list, phrase table, skip list and
// numeric threshold the crawler and the quality pass consult.
//
// The defaults below are the curated molt-ecosystem policy. A JSON file can
// override any part of it (`--policy policy.json`); fields missing from the
// file keep their default value thanks to #[serde(default)].
//
// Rust concepts:
// - #[serde(default)]: fill missing fields from the Default impl
// - Associated functions: Policy::load() as an alternative constructor
// =============================================================================

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// A keyword of the relevance lexicon and its weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedKeyword {
    pub keyword: String,
    pub weight: i32,
}

/// One category of the false-positive phrase table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternCategory {
    pub category: String,
    pub phrases: Vec<String>,
}

/// Token lists the candidate generator combines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorTokens {
    pub bases: Vec<String>,
    pub suffixes: Vec<String>,
    pub tlds: Vec<String>,
}

/// Named numeric constants. None of these have a derivation beyond
/// "worked well on the registry", so all of them are overridable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    // crawl
    pub max_depth: usize,
    pub max_links_per_page: usize,
    pub http_concurrency: usize,
    pub dns_concurrency: usize,
    pub dns_batch_size: usize,
    pub http_batch_size: usize,
    pub fetch_timeout_secs: u64,
    pub dns_timeout_secs: u64,

    // parked-page detection
    pub parked_min_bytes: usize,
    pub parked_min_text_chars: usize,
    pub parked_min_words: usize,
    pub parked_single_hit_max_bytes: usize,

    // relevance
    pub keyword_multiplier: i32,
    pub core_domain_bonus: i32,
    pub generic_domain_bonus: i32,
    pub placeholder_penalty: (i32, i32),
    pub equals_domain_penalty: (i32, i32),
    pub short_description_penalty: (i32, i32),
    pub short_description_len: usize,
    pub minimal_description_len: usize,

    // trust / featured
    pub high_trust_relevance: i32,
    pub medium_trust_relevance: i32,
    pub featured_relevance: i32,

    // dedup
    pub dedupe_score_gap: i32,
    pub default_tld_priority: i32,
    pub description_bonus: i32,
    pub featured_bonus: i32,
    pub trust_bonus_verified: i32,
    pub trust_bonus_high: i32,
    pub trust_bonus_medium: i32,
    pub trust_bonus_low: i32,
    pub trust_bonus_untrusted: i32,

    // exclusions
    pub recheck_after_days: i64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_links_per_page: 20,
            http_concurrency: 500,
            dns_concurrency: 200,
            dns_batch_size: 500,
            http_batch_size: 100,
            fetch_timeout_secs: 8,
            dns_timeout_secs: 2,

            parked_min_bytes: 500,
            parked_min_text_chars: 200,
            parked_min_words: 30,
            parked_single_hit_max_bytes: 5000,

            keyword_multiplier: 10,
            core_domain_bonus: 30,
            generic_domain_bonus: 10,
            // (without core token, with core token)
            placeholder_penalty: (20, 10),
            equals_domain_penalty: (30, 15),
            short_description_penalty: (10, 5),
            short_description_len: 20,
            minimal_description_len: 15,

            high_trust_relevance: 60,
            medium_trust_relevance: 30,
            featured_relevance: 60,

            dedupe_score_gap: 30,
            default_tld_priority: 20,
            description_bonus: 20,
            featured_bonus: 30,
            trust_bonus_verified: 100,
            trust_bonus_high: 50,
            trust_bonus_medium: 25,
            trust_bonus_low: 0,
            trust_bonus_untrusted: -50,

            recheck_after_days: 90,
        }
    }
}

impl Thresholds {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }
}

/// The whole policy object, injected into the classifier, the crawl
/// session, the scorer and the dedup pass at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub version: String,
    pub seeds: Vec<String>,
    pub crawl_keywords: Vec<String>,
    pub skip_domains: Vec<String>,
    pub parked_indicators: Vec<String>,
    pub generator: GeneratorTokens,
    pub relevance_keywords: Vec<WeightedKeyword>,
    pub core_tokens: Vec<String>,
    pub generic_tokens: Vec<String>,
    pub bad_patterns: Vec<PatternCategory>,
    pub red_flags: Vec<String>,
    pub non_http_markers: Vec<String>,
    pub known_different: Vec<(String, String)>,
    /// Descriptions mentioning these don't earn the dedup description bonus.
    pub weak_description_markers: Vec<String>,
    pub tld_priority: BTreeMap<String, i32>,
    pub thresholds: Thresholds,
}

impl Policy {
    /// Reads a policy file. Unlike the data stores, a broken policy file is
    /// reported instead of silently replaced.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading policy file {}", path.display()))?;
        let policy: Policy = serde_json::from_str(&raw)
            .with_context(|| format!("parsing policy file {}", path.display()))?;
        tracing::info!(path = %path.display(), version = %policy.version, "loaded policy");
        Ok(policy)
    }

    /// True if the domain contains one of the core ecosystem tokens.
    pub fn has_core_token(&self, domain: &str) -> bool {
        let d = domain.to_lowercase();
        self.core_tokens.iter().any(|t| d.contains(t.as_str()))
    }

    /// True if the domain contains one of the generic ecosystem tokens.
    pub fn has_generic_token(&self, domain: &str) -> bool {
        let d = domain.to_lowercase();
        self.generic_tokens.iter().any(|t| d.contains(t.as_str()))
    }

    /// True if the domain belongs to a mainstream site we never crawl.
    pub fn is_skipped(&self, domain: &str) -> bool {
        let d = domain.to_lowercase();
        self.skip_domains.iter().any(|s| d.contains(s.as_str()))
    }

    /// A link target worth following: not mainstream, and mentions the
    /// ecosystem somewhere in its name.
    pub fn is_interesting(&self, domain: &str) -> bool {
        if self.is_skipped(domain) {
            return false;
        }
        let d = domain.to_lowercase();
        self.crawl_keywords.iter().any(|k| d.contains(k.as_str()))
    }

    pub fn is_known_different(&self, a: &str, b: &str) -> bool {
        self.known_different
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn category(name: &str, phrases: &[&str]) -> PatternCategory {
    PatternCategory {
        category: name.to_string(),
        phrases: strings(phrases),
    }
}

impl Default for GeneratorTokens {
    fn default() -> Self {
        Self {
            bases: strings(&[
                "molt", "claw", "agent", "lobster", "shell", "bot", "crab", "open", "stark",
                "bankr", "poly",
            ]),
            suffixes: strings(&[
                "", "s", "hub", "net", "verse", "world", "book", "chan", "news", "list", "hunt",
                "work", "city", "road", "base", "overflow", "arena", "crunch", "caster", "line",
                "mates", "dr", "launch", "nch", "place", "x", "direct",
            ]),
            tlds: strings(&[
                "com", "io", "ai", "app", "xyz", "live", "world", "org", "net", "co", "dev",
                "bot", "gg", "space", "direct", "chess", "town",
            ]),
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        let relevance_keywords = [
            ("molt", 3),
            ("claw", 3),
            ("openclaw", 3),
            ("lobster", 3),
            ("moltbook", 3),
            ("crustacean", 3),
            ("moltverse", 3),
            ("agent", 2),
            ("ai agent", 2),
            ("autonomous", 2),
            ("agentic", 2),
            ("llm", 2),
            ("claude", 2),
            ("for agents", 2),
            ("for ai", 2),
            ("agent economy", 2),
            ("agent social", 2),
            ("agent marketplace", 2),
        ]
        .into_iter()
        .map(|(keyword, weight)| WeightedKeyword {
            keyword: keyword.to_string(),
            weight,
        })
        .collect();

        let tld_priority = [
            (".com", 100),
            (".io", 90),
            (".ai", 85),
            (".app", 80),
            (".dev", 75),
            (".org", 70),
            (".net", 65),
            (".co", 60),
            (".xyz", 50),
            (".live", 45),
            (".bot", 40),
            (".space", 35),
            (".town", 30),
            (".gg", 25),
        ]
        .into_iter()
        .map(|(tld, p)| (tld.to_string(), p))
        .collect();

        let known_different = [
            ("moltbook.com", "moltbook.town"),
            ("moltbook.com", "moltbook.co"),
            ("moltbook.town", "moltbook.co"),
            ("clawcity.app", "clawcity.xyz"),
            ("molt.bot", "molt.church"),
            ("moltbook.com", "molt.church"),
        ]
        .into_iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();

        Self {
            version: "builtin".to_string(),
            seeds: strings(&[
                "https://agentsy.live",
                "https://claw.direct",
                "https://clawcrunch.com",
                "https://moltbook.com",
                "https://moltbook.space",
                "https://moltx.io",
                "https://clawk.ai",
                "https://clawcaster.xyz",
                "https://4claw.org",
                "https://lobchan.ai",
                "https://moltoverflow.com",
                "https://instaclaw.xyz",
                "https://clawnhub.com",
                "https://molt-place.com",
                "https://shellmates.app",
                "https://clawdr.app",
                "https://moltline.app",
                "https://openwork.bot",
                "https://clawnet.org",
                "https://moltroad.com",
                "https://clawdslist.org",
                "https://moltcities.org",
                "https://aegisagent.ai",
                "https://bankr.bot",
                "https://clanker.world",
                "https://clawnch.bot",
                "https://moltlaunch.com",
                "https://clawarena.ai",
                "https://polyclaw.ai",
                "https://molt.chess",
                "https://moltiplayer.com",
                "https://clawcity.app",
                "https://shell-town.com",
                "https://openclaw.ai",
                "https://clawhub.ai",
                "https://clawhunt.app",
                "https://clawnews.io",
                "https://crabernews.com",
                "https://molt.church",
                "https://shipyard.bot",
                "https://aethernet.world",
                "https://a2a-protocol.org",
                "https://warpcast.com",
            ]),
            crawl_keywords: strings(&[
                "molt", "claw", "lobster", "crab", "crustacean", "shell", "exo", "agent",
                "agentic", "bot", "autonomous",
            ]),
            skip_domains: strings(&[
                "google.com", "facebook.com", "twitter.com", "x.com", "github.com",
                "youtube.com", "linkedin.com", "instagram.com", "reddit.com", "discord.com",
                "telegram.org", "medium.com", "substack.com", "notion.so", "vercel.app",
                "netlify.app", "cloudflare.com", "tailwindcss.com", "unpkg.com", "jsdelivr.net",
                "googleapis.com", "gstatic.com", "w3.org", "schema.org", "apple.com",
                "microsoft.com",
            ]),
            parked_indicators: strings(&[
                "buy this domain", "domain is for sale", "domain for sale", "parked", "for sale",
                "purchase this domain", "make an offer", "hugedomains", "godaddy", "namecheap",
                "dan.com", "sedo.com", "afternic", "domainmarket", "brandbucket", "squadhelp",
                "domain available", "inquire about", "sponsored listings",
            ]),
            generator: GeneratorTokens::default(),
            relevance_keywords,
            core_tokens: strings(&["molt", "claw", "lobster", "craber"]),
            generic_tokens: strings(&["agent"]),
            bad_patterns: vec![
                category(
                    "parked-page",
                    &[
                        "buy this domain", "domain is for sale", "this domain is parked",
                        "hostinger dns system", "future home of", "launching soon",
                    ],
                ),
                category(
                    "for-humans-tooling",
                    &[
                        "discord bots", "find bots for discord", "discord, slack, telegram",
                        "telegram, kik", "monitoring discord servers", "chatbot directory",
                        "chatbot builder", "open source chatbot", "windows power tools",
                        "shell extension", "explorer enhancement", "windows add-on",
                        "github gists", "your computer in the cloud", "automate your recruiting",
                        "book more interviews", "ai automation framework",
                    ],
                ),
                category(
                    "wrong-industry",
                    &[
                        "stone crab", "seafood restaurant", "waterfront restaurant",
                        "arctic taste", "spice combination", "mail-order crabs",
                        "hard-shell crabs", "we sell", "shipped nationwide",
                        "registered agent service", "service of process", "board of trade",
                        "actor talent", "talent agencies", "actor resource", "real estate",
                        "property", "python governance platform", "warehouse automation",
                        "robotic process automation", "claw machine arcade",
                        "minnesota's largest", "bots capital", "let the kingdom come",
                    ],
                ),
                category(
                    "generic-platform",
                    &[
                        "whatsapp business", "telegram bot builder", "advertising platform",
                        "job search platform", "website builder", "agent based modeling",
                    ],
                ),
                category(
                    "malicious",
                    &["phishing", "malware", "wallet drainer", "connect your wallet to claim"],
                ),
            ],
            red_flags: strings(&[
                "parked domain", "domain for sale", "coming soon", "under construction",
                "database vulnerability", "compromised", "scam", "phishing", "malware",
                "do not use", "hostinger dns system", "future home of",
            ]),
            non_http_markers: strings(&["mailto:", "tel:", "javascript:", "data:", "ftp:", "file:"]),
            known_different,
            weak_description_markers: strings(&["Parked", "Hostinger"]),
            tld_priority,
            thresholds: Thresholds::default(),
        }
    }
}
