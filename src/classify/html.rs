// src/classify/html.rs
// =============================================================================
// This module pulls structured facts out of raw HTML pages.
//
// We use the `scraper` crate to:
// - Parse HTML into a DOM and query it with CSS selectors
// - Find the <title> and every <a href> on a page
//
// And the `url` crate to:
// - Resolve relative links against the page URL
// - Reduce any URL to a bare, normalized domain
//
// A raw regex scan complements the anchor walk: aggregator pages often list
// sites inside scripts, JSON blobs or comments rather than in <a> tags.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const MAX_TITLE_CHARS: usize = 100;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("valid selector"));
static RAW_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https?://([a-zA-Z0-9][-a-zA-Z0-9.]*\.[a-zA-Z]{2,})").expect("valid regex")
});

// Reduces a URL (or bare host) to the registry key for its site
//
// Examples:
//   "https://WWW.MoltBook.com/feed" -> "moltbook.com"
//   "moltbook.com"                  -> "moltbook.com"
//   "not a url"                     -> ""
//
// Applying it twice gives the same result as applying it once.
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let Some(first) = Url::parse(&candidate).ok().and_then(|u| host_key(&u)) else {
        return String::new();
    };

    // Hosts of non-http schemes are opaque strings; re-reading them as
    // https gives exactly what a second normalization pass would see.
    Url::parse(&format!("https://{}", first))
        .ok()
        .and_then(|u| host_key(&u))
        .unwrap_or_default()
}

// Lowercase host without leading "www." labels, with the port kept only
// when it is not the default one
fn host_key(url: &Url) -> Option<String> {
    let mut host = url.host_str()?.to_lowercase();
    while let Some(rest) = host.strip_prefix("www.") {
        host = rest.to_string();
    }
    if host.is_empty() {
        return None;
    }
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Text of the first `<title>`, trimmed and cut to 100 characters.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    document
        .select(&TITLE)
        .next()
        .map(|title| {
            let text: String = title.text().collect();
            text.trim().chars().take(MAX_TITLE_CHARS).collect()
        })
        .unwrap_or_default()
}

// Extracts every domain a page points at
//
// Parameters:
//   html: the page body
//   base_url: the URL the page was fetched from (for relative links)
//
// Returns: the set of normalized domains, never containing ""
pub fn extract_domains(html: &str, base_url: &str) -> HashSet<String> {
    let mut domains = HashSet::new();

    match Url::parse(base_url) {
        Ok(base) => {
            let document = Html::parse_document(html);
            for element in document.select(&ANCHOR) {
                if let Some(href) = element.value().attr("href") {
                    if let Some(url) = resolve_url(&base, href) {
                        insert_normalized(&mut domains, url.as_str());
                    }
                }
            }
        }
        Err(e) => {
            tracing::debug!(base_url, error = %e, "invalid base URL, scanning raw text only");
        }
    }

    for capture in RAW_URL.captures_iter(html) {
        insert_normalized(&mut domains, &capture[1]);
    }

    domains
}

fn insert_normalized(domains: &mut HashSet<String>, raw: &str) {
    let domain = normalize_domain(raw);
    if !domain.is_empty() {
        domains.insert(domain);
    }
}

// Resolves an href against the page URL, keeping only http(s) targets
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs"              -> Some(https://example.com/docs)
//   href = "https://other.com"  -> Some(https://other.com/)
//   href = "mailto:a@b.com"     -> None
fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_scheme_case_and_www() {
        assert_eq!(normalize_domain("https://WWW.MoltBook.com/feed?x=1"), "moltbook.com");
        assert_eq!(normalize_domain("moltbook.com"), "moltbook.com");
        assert_eq!(normalize_domain("http://www.www.clawk.ai"), "clawk.ai");
        assert_eq!(normalize_domain("https://clawk.ai:8443/"), "clawk.ai:8443");
    }

    #[test]
    fn test_normalize_malformed_is_empty() {
        assert_eq!(normalize_domain(""), "");
        assert_eq!(normalize_domain("not a url"), "");
        assert_eq!(normalize_domain("file:///etc/hosts"), "");
        assert_eq!(normalize_domain("https://www."), "");
        assert_eq!(normalize_domain("https://www.:8080"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://WWW.MoltBook.com/feed",
            "www.www.clawk.ai",
            "ftp://Files.Molt.Church:443/pub",
            "https://user:pw@Shellmates.app:8080/x",
            "HTTP://[::1]:3000",
            "https://www.:8080",
            "www.www.:9000/x",
            "4claw.org",
            "https://bücher.example/",
            "garbage ::: input",
            "",
        ];
        for input in inputs {
            let once = normalize_domain(input);
            assert_eq!(normalize_domain(&once), once, "input: {input}");
        }
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>  Moltbook  </title></head><body></body></html>";
        assert_eq!(extract_title(html), "Moltbook");
        assert_eq!(extract_title("<p>no title here</p>"), "");

        let long = format!("<title>{}</title>", "x".repeat(250));
        assert_eq!(extract_title(&long).chars().count(), 100);
    }

    #[test]
    fn test_extract_domains_from_anchors() {
        let html = r#"
            <a href="https://www.Moltbook.com/u/1">Moltbook</a>
            <a href="/about">About</a>
            <a href="mailto:hi@clawk.ai">Mail</a>
            <a href="javascript:void(0)">Nothing</a>
        "#;
        let domains = extract_domains(html, "https://agentsy.live/index");
        assert!(domains.contains("moltbook.com"));
        assert!(domains.contains("agentsy.live"));
        assert!(!domains.contains("clawk.ai"));
        assert_eq!(domains.len(), 2);
    }

    #[test]
    fn test_extract_domains_from_raw_text() {
        let html = r#"
            <script>const sites = ["https://www.clawnews.io", "http://4claw.org/b/"];</script>
            <!-- https://moltroad.com -->
        "#;
        let domains = extract_domains(html, "https://agentsy.live");
        assert!(domains.contains("clawnews.io"));
        assert!(domains.contains("4claw.org"));
        assert!(domains.contains("moltroad.com"));
    }

    #[test]
    fn test_invalid_base_still_scans_text() {
        let html = r#"<a href="/x">x</a> see https://moltx.io"#;
        let domains = extract_domains(html, "not a base");
        assert_eq!(domains.len(), 1);
        assert!(domains.contains("moltx.io"));
    }
}
