// src/classify/mod.rs
// =============================================================================
// Content classification for fetched pages.
//
// Submodules:
// - html: domain normalization, title and outbound-domain extraction
// - parked: decides whether a page is a parked/placeholder page
//
// Classification never fails: a missing body simply means "no content".
// =============================================================================

mod html;
mod parked;

pub use html::{extract_domains, extract_title, normalize_domain};
pub use parked::is_parked;

use crate::policy::Policy;

/// What the classifier learned about one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub has_content: bool,
    pub title: String,
}

/// Classifies an optional page body. Absent bodies are never real content.
pub fn classify(body: Option<&str>, policy: &Policy) -> Classification {
    match body {
        Some(html) => Classification {
            has_content: !is_parked(html, policy),
            title: extract_title(html),
        },
        None => Classification {
            has_content: false,
            title: String::new(),
        },
    }
}
