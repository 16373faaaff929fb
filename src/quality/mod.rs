// src/quality/mod.rs
// =============================================================================
// The quality pass: runs over the registry after crawling and decides how
// much each site can be trusted.
//
// Submodules:
// - rules: the ordered false-positive rule table
// - score: relevance, trust and the featured rule
// - batch: registry-wide operations (score, audit, export, cleanup, stats)
// =============================================================================

mod batch;
mod rules;
mod score;

pub use batch::{
    cleanup, exclude_manually, export_csv, filter_quality, low_quality, mark_featured,
    score_registry, RegistryStats,
};
pub use score::Scorer;
