// src/classify/parked.rs
// =============================================================================
// Parked-page detection.
//
// A parked domain is registered but commercially unused: it serves a
// "buy this domain" page, a registrar placeholder or almost nothing at all.
// The checks run from cheapest to most expensive:
//
// 1. Tiny bodies are parked.
// 2. Two or more distinct indicator phrases mean parked.
// 3. Too little visible text (scripts and styles don't count) means parked.
// 4. A single indicator on a small page means parked.
// =============================================================================

use scraper::{Html, Node};

use crate::policy::Policy;

const INVISIBLE_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Returns true when the page looks like a parked or placeholder page.
pub fn is_parked(html: &str, policy: &Policy) -> bool {
    let limits = &policy.thresholds;

    if html.len() < limits.parked_min_bytes {
        return true;
    }

    let lower = html.to_lowercase();
    let hits = policy
        .parked_indicators
        .iter()
        .filter(|phrase| lower.contains(phrase.as_str()))
        .count();
    if hits >= 2 {
        return true;
    }

    let text = visible_text(html);
    if text.chars().count() < limits.parked_min_text_chars
        || text.split_whitespace().count() < limits.parked_min_words
    {
        return true;
    }

    hits == 1 && html.len() < limits.parked_single_hit_max_bytes
}

// Collects the text a visitor would see: every text node outside
// script/style/noscript, trimmed and joined with single spaces.
fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_TAGS.contains(&el.name()))
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join(" ")
}
