// src/cli.rs
// =============================================================================
// Command-line interface, declared with clap's derive API.
//
//   molt-crawler [crawl]              discover and classify sites
//   molt-crawler dedupe [--apply]     resolve cross-TLD duplicates
//   molt-crawler quality <action>     score, audit and curate the registry
//
// Global options (--data-dir, --policy) may appear before or after the
// subcommand.
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "molt-crawler",
    version,
    about = "Discovers, classifies and curates sites of the molt agent ecosystem",
    long_about = "molt-crawler crawls seed sites and lead sources, brute-forces candidate \
                  domain names, and keeps a quality-scored registry of what it finds."
)]
pub struct Cli {
    /// Directory holding the registry, exclusions, audit log and lead sources
    #[arg(long, global = true, env = "MOLT_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// JSON file overriding the built-in classification policy
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    /// Subcommand to run; `crawl` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Crawl lead sources and seeds, then brute-force candidate domains
    Crawl,

    /// Find sites registered under several TLDs and keep the best one
    ///
    /// Prints the plan only, unless --apply is given.
    Dedupe {
        /// Actually remove the flagged duplicates
        #[arg(long)]
        apply: bool,
    },

    /// Quality pass over the registry
    Quality {
        #[command(subcommand)]
        action: QualityAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QualityAction {
    /// Recompute relevance and trust for every site
    Score,
    /// Score, then mark high-quality sites as featured
    Featured,
    /// List low and untrusted sites for manual review
    Audit,
    /// Write the review queue to audit_queue.csv
    Export,
    /// Remove false positives from the registry
    Cleanup,
    /// List excluded domains
    Exclusions,
    /// List exclusions due for re-verification
    Recheck,
    /// Registry and exclusion counts
    Stats,
    /// Exclude a domain by hand
    ///
    /// Example: molt-crawler quality exclude crabs.com seafood shop
    Exclude {
        domain: String,
        /// Free-text reason; the remaining words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        reason: Vec<String>,
    },
}

impl Cli {
    pub fn resolved_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Crawl)
    }
}
