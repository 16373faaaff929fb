// src/crawl/session.rs
// =============================================================================
// One crawl run, from lead sources to brute force.
//
// How a domain moves through a run:
// 1. UNVISITED -> FETCHED: the visited tracker lets exactly one path claim
//    the domain, then the probe fetches it
// 2. FETCHED -> CLASSIFIED: parked or real content, plus the page title
// 3. CLASSIFIED -> EXPANDED: only real content below the depth limit; the
//    page's interesting outbound domains (first 20) are crawled at depth+1
//    Everything else stops here (TERMINAL)
//
// The phases of run():
// - Phase 0: deep-scrape lead sources (every outbound domain except
//   mainstream sites is checked, no keyword filter, no expansion)
// - Phase 1: crawl the seeds
// - Phase 2: brute-force candidate names, DNS first, then HTTP
//
// All futures are driven from the caller's task, so the shared state only
// ever sees short, non-overlapping lock sections. Results arrive in
// completion order.
//
// Rust concepts:
// - LocalBoxFuture: recursive async calls need a boxed future
// - join_all: wait for a whole batch; one failed site never stops the others
// - buffer_unordered: DNS answers are consumed as they arrive
// - Mutex: shared registry and discovery list behind &self
// =============================================================================

use futures::future::{join_all, FutureExt, LocalBoxFuture};
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{CandidateGenerator, VisitedTracker};
use crate::classify::{classify, extract_domains, normalize_domain, Classification};
use crate::fetch::Probe;
use crate::policy::Policy;
use crate::store::{SiteRegistry, Source, Visit};

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Domains first seen in this run that have real content, sorted.
    pub discoveries: Vec<String>,
    pub visited: usize,
    pub candidates: usize,
    pub resolving: usize,
}

/// Per-run context handed to every concurrent task.
pub struct CrawlSession<P: Probe> {
    probe: P,
    policy: Arc<Policy>,
    visited: VisitedTracker,
    registry: Mutex<SiteRegistry>,
    discoveries: Mutex<Vec<String>>,
    candidates: Mutex<(usize, usize)>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<P: Probe> CrawlSession<P> {
    pub fn new(probe: P, policy: Arc<Policy>, registry: SiteRegistry) -> Self {
        Self {
            probe,
            policy,
            visited: VisitedTracker::new(),
            registry: Mutex::new(registry),
            discoveries: Mutex::new(Vec::new()),
            candidates: Mutex::new((0, 0)),
        }
    }

    // Runs all three phases
    //
    // Parameters:
    //   lead_sources: (name, url) pairs of aggregator pages to harvest
    pub async fn run(&self, lead_sources: &[(String, String)]) {
        if !lead_sources.is_empty() {
            println!("\n🎯 PHASE 0: SCRAPING {} LEAD SOURCES", lead_sources.len());
            println!("{}", "-".repeat(40));
            for (name, url) in lead_sources {
                self.scrape_lead_source(name, url).await;
            }
        }

        println!("\n📡 PHASE 1: CRAWLING {} SEEDS", self.policy.seeds.len());
        println!("{}", "-".repeat(40));
        let seeds = self
            .policy
            .seeds
            .iter()
            .map(|url| self.crawl(url.clone(), 0, Source::SeedCrawl));
        join_all(seeds).await;

        println!("\n🔨 PHASE 2: DOMAIN ENUMERATION");
        println!("{}", "-".repeat(40));
        self.bruteforce().await;
    }

    // Crawls one URL and, if it has real content, the interesting domains
    // it links to (recursively, up to the depth limit)
    pub fn crawl(&self, url: String, depth: usize, source: Source) -> LocalBoxFuture<'_, ()> {
        async move {
            let domain = normalize_domain(&url);
            let Some(body) = self.visit(&domain, &url, source).await else {
                return;
            };
            if depth >= self.policy.thresholds.max_depth {
                return;
            }

            let mut next: Vec<String> = extract_domains(&body, &url)
                .into_iter()
                .filter(|d| !self.visited.contains(d) && self.policy.is_interesting(d))
                .collect();
            next.sort();
            next.truncate(self.policy.thresholds.max_links_per_page);

            if !next.is_empty() {
                tracing::debug!(from = %domain, links = next.len(), depth, "expanding");
            }
            let children = next
                .into_iter()
                .map(|d| self.crawl(format!("https://{}", d), depth + 1, Source::Link));
            join_all(children).await;
        }
        .boxed_local()
    }

    // Harvests every outbound domain of an aggregator page
    //
    // Returns: the candidate domains that were handed to classification
    pub async fn scrape_lead_source(&self, name: &str, url: &str) -> Vec<String> {
        println!("\n  🔍 Deep scraping {} ({})", name, url);
        let outcome = self.probe.fetch(url).await;
        let Some(html) = outcome.body else {
            println!("    ❌ Could not fetch {}", name);
            return Vec::new();
        };

        let mut leads: Vec<String> = extract_domains(&html, url)
            .into_iter()
            .filter(|d| !self.visited.contains(d) && !self.policy.is_skipped(d))
            .collect();
        leads.sort();
        println!("    Found {} potential leads", leads.len());

        self.check_sites(leads.clone(), Source::LeadSource(name.to_string()))
            .await;
        leads
    }

    /// Classifies a batch of bare domains over https, without expansion.
    pub async fn check_sites(&self, domains: Vec<String>, source: Source) {
        let checks = domains.into_iter().map(|domain| {
            let source = source.clone();
            async move {
                let url = format!("https://{}", domain);
                self.visit(&domain, &url, source).await;
            }
        });
        join_all(checks).await;
    }

    // Generates candidate names, keeps the ones that resolve, then checks
    // those for real content
    pub async fn bruteforce(&self) {
        let limits = &self.policy.thresholds;
        let mut known = lock(&self.registry).known();
        known.extend(self.visited.snapshot());

        let generator = CandidateGenerator::from_tokens(&self.policy.generator);
        let candidates: Vec<String> = generator.iter(&known).collect();
        println!(
            "  Generated {} candidates ({} combinations)",
            candidates.len(),
            generator.combinations()
        );
        println!("  Running parallel DNS checks...");

        let mut resolving = Vec::new();
        for (i, batch) in candidates.chunks(limits.dns_batch_size.max(1)).enumerate() {
            let alive = self.resolve_batch(batch).await;
            println!("    DNS batch {}: {} alive domains", i + 1, alive.len());
            resolving.extend(alive);
        }

        println!("  Found {} domains with DNS", resolving.len());
        println!("  Checking for real content...");
        for batch in resolving.chunks(limits.http_batch_size.max(1)) {
            self.check_sites(batch.to_vec(), Source::Bruteforce).await;
        }

        *lock(&self.candidates) = (candidates.len(), resolving.len());
    }

    /// DNS-checks a batch concurrently and returns the names that resolved.
    pub async fn resolve_batch(&self, domains: &[String]) -> Vec<String> {
        let in_flight = self.policy.thresholds.dns_concurrency.max(1);
        stream::iter(domains)
            .map(|d| self.probe.dns_check(d))
            .buffer_unordered(in_flight)
            .filter_map(|(domain, resolved)| async move { resolved.then_some(domain) })
            .collect()
            .await
    }

    // Claim, fetch, classify and record one domain
    //
    // Returns: the page body when the page has real content
    async fn visit(&self, domain: &str, url: &str, source: Source) -> Option<String> {
        if domain.is_empty() || !self.visited.claim(domain) {
            return None;
        }

        let outcome = self.probe.fetch(url).await;
        let classification = classify(outcome.body.as_deref(), &self.policy);
        print_status(domain, outcome.alive, &classification);

        // Seeds are tracked even when down; discovered names only once they answer
        if outcome.alive || source == Source::SeedCrawl {
            self.record(domain, url, source, outcome.alive, &classification);
        }

        if classification.has_content {
            outcome.body
        } else {
            None
        }
    }

    fn record(&self, domain: &str, url: &str, source: Source, alive: bool, c: &Classification) {
        let is_new = lock(&self.registry).record_visit(Visit {
            domain: domain.to_string(),
            url: url.to_string(),
            source,
            alive,
            has_content: c.has_content,
            title: c.title.clone(),
        });
        if is_new && c.has_content {
            lock(&self.discoveries).push(domain.to_string());
        }
    }

    /// Ends the session, handing back the merged registry.
    pub fn finish(self) -> (SiteRegistry, CrawlReport) {
        let mut discoveries = self
            .discoveries
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        discoveries.sort();
        let (candidates, resolving) = self
            .candidates
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let report = CrawlReport {
            discoveries,
            visited: self.visited.len(),
            candidates,
            resolving,
        };
        let registry = self
            .registry
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (registry, report)
    }
}

// ✅ = real content | ⚪ = parked/empty | ❌ = down
fn print_status(domain: &str, alive: bool, c: &Classification) {
    if c.has_content {
        if c.title.is_empty() {
            println!("  ✅ {}", domain);
        } else {
            let title: String = c.title.chars().take(40).collect();
            println!("  ✅ {} - {}", domain, title);
        }
    } else if alive {
        tracing::debug!(domain, "parked or empty");
    } else {
        tracing::debug!(domain, "down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchOutcome;
    use crate::policy::GeneratorTokens;
    use std::collections::{HashMap, HashSet};

    // What the fake network saw; shared with the test after the session
    // takes ownership of the probe
    #[derive(Default)]
    struct NetLog {
        fetched: Mutex<Vec<String>>,
        resolved: Mutex<Vec<String>>,
    }

    impl NetLog {
        fn fetch_count(&self, domain: &str) -> usize {
            lock(&self.fetched)
                .iter()
                .filter(|d| d.as_str() == domain)
                .count()
        }
    }

    // An in-memory network: pages keyed by domain, a set of resolvable names
    #[derive(Default)]
    struct FakeNet {
        pages: HashMap<String, FetchOutcome>,
        resolvable: HashSet<String>,
        log: Arc<NetLog>,
    }

    impl FakeNet {
        fn page(mut self, domain: &str, links: &[&str]) -> Self {
            self.pages
                .insert(domain.to_string(), FetchOutcome::content(real_page(domain, links)));
            self
        }

        fn outcome(mut self, domain: &str, outcome: FetchOutcome) -> Self {
            self.pages.insert(domain.to_string(), outcome);
            self
        }
    }

    impl Probe for FakeNet {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            let domain = normalize_domain(url);
            lock(&self.log.fetched).push(domain.clone());
            self.pages
                .get(&domain)
                .cloned()
                .unwrap_or_else(FetchOutcome::unreachable)
        }

        async fn dns_check(&self, domain: &str) -> (String, bool) {
            lock(&self.log.resolved).push(domain.to_string());
            (domain.to_string(), self.resolvable.contains(domain))
        }
    }

    fn real_page(domain: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|l| format!("<a href=\"https://{}/\">{}</a>\n", l, l))
            .collect();
        let prose: Vec<String> = (0..100).map(|i| format!("word{}", i)).collect();
        format!(
            "<html><head><title>{} home</title></head><body><p>{}</p>{}</body></html>",
            domain,
            prose.join(" "),
            anchors
        )
    }

    fn policy(seeds: &[&str]) -> Policy {
        Policy {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            generator: GeneratorTokens {
                bases: vec![],
                suffixes: vec![],
                tlds: vec![],
            },
            ..Policy::default()
        }
    }

    async fn run(net: FakeNet, policy: Policy) -> (SiteRegistry, CrawlReport, Arc<NetLog>) {
        let log = Arc::clone(&net.log);
        let session = CrawlSession::new(net, Arc::new(policy), SiteRegistry::default());
        session.run(&[]).await;
        let (registry, report) = session.finish();
        (registry, report, log)
    }

    #[tokio::test]
    async fn test_seed_expands_to_interesting_links_only() {
        let net = FakeNet::default()
            .page("moltseed.com", &["clawfriend.io", "example.org", "github.com", "moltdead.net"])
            .page("clawfriend.io", &[]);

        let (registry, report, log) = run(net, policy(&["https://moltseed.com"])).await;

        let seed = registry.get("moltseed.com").unwrap();
        assert!(seed.has_content);
        assert_eq!(seed.source, Source::SeedCrawl);
        assert_eq!(seed.title, "moltseed.com home");

        let linked = registry.get("clawfriend.io").unwrap();
        assert_eq!(linked.source, Source::Link);
        assert!(linked.has_content);

        // not interesting / mainstream: never fetched
        assert_eq!(log.fetch_count("example.org"), 0);
        assert_eq!(log.fetch_count("github.com"), 0);
        // fetched, but discovered names that are down are not recorded
        assert_eq!(log.fetch_count("moltdead.net"), 1);
        assert!(!registry.contains("moltdead.net"));

        assert_eq!(report.discoveries, vec!["clawfriend.io", "moltseed.com"]);
    }

    #[tokio::test]
    async fn test_depth_limit_stops_expansion() {
        let net = FakeNet::default()
            .page("molta.com", &["moltb.com"])
            .page("moltb.com", &["moltc.com"])
            .page("moltc.com", &["moltd.com"])
            .page("moltd.com", &[]);

        let (registry, _, log) = run(net, policy(&["https://molta.com"])).await;

        assert!(registry.contains("moltc.com"));
        assert!(!registry.contains("moltd.com"));
        assert_eq!(log.fetch_count("moltd.com"), 0);
    }

    #[tokio::test]
    async fn test_each_domain_fetched_once_per_run() {
        let net = FakeNet::default()
            .page("molta.com", &["clawshared.ai", "moltb.com"])
            .page("moltb.com", &["clawshared.ai", "molta.com"])
            .page("clawshared.ai", &["molta.com"]);

        let (registry, report, log) = run(
            net,
            policy(&["https://molta.com", "https://moltb.com", "https://www.molta.com"]),
        )
        .await;

        for domain in ["molta.com", "moltb.com", "clawshared.ai"] {
            assert_eq!(log.fetch_count(domain), 1, "{domain}");
        }
        assert_eq!(registry.len(), 3);
        assert_eq!(report.visited, 3);
    }

    #[tokio::test]
    async fn test_parked_and_dead_seeds() {
        let parked = "<html><title>Buy this domain</title>domain for sale</html>".to_string();
        let net = FakeNet::default()
            .outcome("moltparked.com", FetchOutcome::content(parked))
            .outcome("moltforbidden.com", FetchOutcome::reachable());

        let (registry, report, _) = run(
            net,
            policy(&[
                "https://moltparked.com",
                "https://moltforbidden.com",
                "https://moltdown.com",
            ]),
        )
        .await;

        let parked = registry.get("moltparked.com").unwrap();
        assert!(parked.alive && !parked.has_content);
        assert_eq!(parked.title, "Buy this domain");
        let forbidden = registry.get("moltforbidden.com").unwrap();
        assert!(forbidden.alive && !forbidden.has_content);
        let down = registry.get("moltdown.com").unwrap();
        assert!(!down.alive);
        assert!(report.discoveries.is_empty());
    }

    #[tokio::test]
    async fn test_lead_source_skips_keyword_filter() {
        let net = FakeNet::default()
            .page("agentsy.live", &["example.org", "github.com", "clawk.ai"])
            .page("example.org", &["moltdeep.com"])
            .page("clawk.ai", &[]);
        let session = CrawlSession::new(net, Arc::new(policy(&[])), SiteRegistry::default());

        let leads = session
            .scrape_lead_source("agentsy", "https://agentsy.live/list")
            .await;
        assert_eq!(leads, vec!["clawk.ai", "example.org"]);

        let (registry, _) = session.finish();
        let lead = registry.get("example.org").unwrap();
        assert_eq!(lead.source, Source::LeadSource("agentsy".to_string()));
        assert!(lead.has_content);
        // leads are classified, not expanded
        assert!(!registry.contains("moltdeep.com"));
        assert!(!registry.contains("github.com"));
    }

    #[tokio::test]
    async fn test_bruteforce_checks_only_resolving_unknown_names() {
        let mut net = FakeNet::default()
            .page("moltbook.com", &[])
            .page("clawbook.ai", &[]);
        net.resolvable = ["moltbook.com", "clawbook.ai", "clawbook.com"]
            .into_iter()
            .map(String::from)
            .collect();
        let log = Arc::clone(&net.log);

        let mut policy = policy(&[]);
        policy.generator = GeneratorTokens {
            bases: vec!["molt".into(), "claw".into()],
            suffixes: vec!["book".into()],
            tlds: vec!["com".into(), "ai".into()],
        };
        policy.thresholds.dns_batch_size = 2;
        policy.thresholds.http_batch_size = 1;

        let mut registry = SiteRegistry::default();
        registry.record_visit(Visit {
            domain: "moltbook.ai".into(),
            url: "https://moltbook.ai".into(),
            source: Source::SeedCrawl,
            alive: true,
            has_content: true,
            title: String::new(),
        });

        let session = CrawlSession::new(net, Arc::new(policy), registry);
        session.bruteforce().await;
        let (registry, report) = session.finish();

        assert_eq!(report.candidates, 3);
        assert_eq!(report.resolving, 3);
        assert!(!lock(&log.resolved).contains(&"moltbook.ai".to_string()));
        assert_eq!(registry.get("moltbook.com").unwrap().source, Source::Bruteforce);
        // resolves, but nothing answers over HTTP
        assert_eq!(log.fetch_count("clawbook.com"), 1);
        assert!(registry.get("clawbook.com").is_none());
        assert_eq!(report.discoveries, vec!["clawbook.ai", "moltbook.com"]);
    }
}
