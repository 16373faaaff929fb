// src/fetch/http.rs
// =============================================================================
// The real network probe.
//
// Key functionality:
// - Makes one HTTP GET per URL (following redirects) with a fixed timeout
// - Maps the response status to a FetchOutcome
// - Resolves domain names on tokio's blocking thread pool
// - Caps in-flight HTTP requests and DNS lookups with two semaphores
//
// DNS resolution goes through the system resolver, which blocks. Running it
// on the async threads would stall every other fetch, so each lookup is
// handed to spawn_blocking and awaited like any other future.
// =============================================================================

use anyhow::{Context, Result};
use reqwest::Client;
use std::net::ToSocketAddrs;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use super::{FetchOutcome, Probe};
use crate::policy::Thresholds;

const USER_AGENT: &str = concat!("molt-crawler/", env!("CARGO_PKG_VERSION"));

/// reqwest client plus the two concurrency gates of a crawl session.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
    http_gate: Arc<Semaphore>,
    dns_gate: Arc<Semaphore>,
    dns_timeout: Duration,
}

impl HttpProbe {
    pub fn new(limits: &Thresholds) -> Result<Self> {
        // One client for the whole run (connection pooling)
        let client = Client::builder()
            .timeout(limits.fetch_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            http_gate: Arc::new(Semaphore::new(limits.http_concurrency.max(1))),
            dns_gate: Arc::new(Semaphore::new(limits.dns_concurrency.max(1))),
            dns_timeout: limits.dns_timeout(),
        })
    }
}

impl Probe for HttpProbe {
    async fn fetch(&self, url: &str) -> FetchOutcome {
        // The permit is released when it goes out of scope
        let Ok(_permit) = self.http_gate.acquire().await else {
            return FetchOutcome::unreachable();
        };

        match self.client.get(url).send().await {
            Ok(response) => read_response(url, response).await,
            Err(e) => {
                tracing::debug!(url, timeout = e.is_timeout(), error = %e, "fetch failed");
                FetchOutcome::unreachable()
            }
        }
    }

    async fn dns_check(&self, domain: &str) -> (String, bool) {
        let Ok(permit) = self.dns_gate.clone().acquire_owned().await else {
            return (domain.to_string(), false);
        };

        let host = domain.to_string();
        let lookup = tokio::task::spawn_blocking(move || {
            // Held until the blocking call returns, even if the caller has
            // already given up on it.
            let _permit = permit;
            (host.as_str(), 80)
                .to_socket_addrs()
                .map(|mut addrs| addrs.next().is_some())
                .unwrap_or(false)
        });

        let resolved = matches!(
            tokio::time::timeout(self.dns_timeout, lookup).await,
            Ok(Ok(true))
        );
        (domain.to_string(), resolved)
    }
}

// HTTP status codes:
// - 200:     content to classify
// - 201-499: the host is up, but there is nothing to classify
// - 500+:    treated as down
async fn read_response(url: &str, response: reqwest::Response) -> FetchOutcome {
    let status = response.status().as_u16();

    match status {
        200 => match response.text().await {
            Ok(body) => FetchOutcome::content(body),
            Err(e) => {
                tracing::debug!(url, error = %e, "failed to read body");
                FetchOutcome::unreachable()
            }
        },
        s if s < 500 => FetchOutcome::reachable(),
        s => {
            tracing::debug!(url, status = s, "server error");
            FetchOutcome::unreachable()
        }
    }
}
