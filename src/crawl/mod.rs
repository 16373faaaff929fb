// src/crawl/mod.rs
// =============================================================================
// This module handles discovery: crawling seeds, harvesting lead sources
// and brute-forcing candidate domain names.
//
// Submodules:
// - generator: base × suffix × TLD candidate names
// - visited: the per-run "already claimed" set
// - session: the per-run context that drives fetch → classify → expand
// =============================================================================

mod generator;
mod session;
mod visited;

pub use generator::CandidateGenerator;
pub use session::{CrawlReport, CrawlSession};
pub use visited::VisitedTracker;
