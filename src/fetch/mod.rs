// src/fetch/mod.rs
// =============================================================================
// Network probing: one HTTP GET per site and one DNS lookup per candidate.
//
// Submodules:
// - http: the reqwest-backed implementation of both probes
//
// Every failure (timeout, refused connection, 5xx, unresolvable name) is
// reported as data. Nothing in this module returns an error to the crawl.
//
// Rust concepts:
// - Traits: Probe lets the crawl run against a fake network in tests
// - async fn in traits: supported natively since Rust 1.75
// =============================================================================

mod http;

pub use http::HttpProbe;

/// Result of fetching one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Page body, only present for HTTP 200.
    pub body: Option<String>,
    /// The server answered with something other than an error or a 5xx.
    pub alive: bool,
}

impl FetchOutcome {
    pub fn content(body: String) -> Self {
        Self {
            body: Some(body),
            alive: true,
        }
    }

    /// Reachable, but nothing to classify (3xx/4xx and friends).
    pub fn reachable() -> Self {
        Self {
            body: None,
            alive: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            body: None,
            alive: false,
        }
    }
}

/// The two network primitives the crawl needs.
#[allow(async_fn_in_trait)]
pub trait Probe {
    /// Fetches a URL. Never fails; failures come back as `alive == false`.
    async fn fetch(&self, url: &str) -> FetchOutcome;

    /// Resolves a domain name. Returns the domain with whether it resolved.
    async fn dns_check(&self, domain: &str) -> (String, bool);
}
