// src/main.rs
// =============================================================================
// Entry point of the molt-crawler CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up tracing (RUST_LOG, default "info") on stderr
// 3. Load the policy and the JSON stores from the data directory
// 4. Dispatch to the subcommand handler, save what changed, print a report
// 5. Exit with 0 on success, 2 on error
//
// Reports for humans go to stdout with println!; diagnostics go through
// tracing so they can be filtered or silenced.
// =============================================================================

mod classify; // src/classify/ - parked detection, titles, outbound domains
mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - the crawl session and candidate generator
mod dedupe; // src/dedupe.rs - cross-TLD duplicate resolution
mod fetch; // src/fetch/ - HTTP and DNS probes
mod policy; // src/policy.rs - keyword lists and thresholds
mod quality; // src/quality/ - relevance, trust and curation passes
mod store; // src/store/ - JSON persistence

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, QualityAction};
use crawl::CrawlSession;
use dedupe::DedupePlan;
use fetch::HttpProbe;
use policy::Policy;
use quality::Scorer;
use store::{AuditLog, DataPaths, ExclusionRegistry, LeadConfig, SiteRegistry, Trust};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let paths = DataPaths::new(&cli.data_dir);
    let policy = Arc::new(load_policy(cli.policy.as_deref())?);

    match cli.resolved_command() {
        Commands::Crawl => handle_crawl(&paths, policy).await,
        Commands::Dedupe { apply } => handle_dedupe(&paths, &policy, apply),
        Commands::Quality { action } => handle_quality(&paths, policy, action),
    }
}

fn load_policy(path: Option<&Path>) -> Result<Policy> {
    match path {
        Some(path) => Policy::load(path),
        None => Ok(Policy::default()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// Handles the 'crawl' subcommand: lead sources, seeds, brute force
async fn handle_crawl(paths: &DataPaths, policy: Arc<Policy>) -> Result<i32> {
    println!("🦞 MOLT ECOSYSTEM CRAWLER");
    println!("{}", "=".repeat(50));

    let registry = SiteRegistry::load(&paths.registry);
    println!("📚 Known sites: {}", registry.len());

    let leads = LeadConfig::load(&paths.lead_sources).lead_urls();
    let probe = HttpProbe::new(&policy.thresholds)?;

    let session = CrawlSession::new(probe, Arc::clone(&policy), registry);
    session.run(&leads).await;
    let (mut registry, report) = session.finish();

    registry
        .save(&paths.registry)
        .context("saving the site registry")?;

    println!("\n{}", "=".repeat(50));
    println!("📊 CRAWL COMPLETE");
    println!("   Visited: {} domains", report.visited);
    println!(
        "   Brute force: {} candidates, {} resolving",
        report.candidates, report.resolving
    );
    println!("   Total known: {} sites", registry.len());
    println!("   Real sites: {}", registry.real_count());
    println!("   New this run: {}", report.discoveries.len());
    for domain in &report.discoveries {
        let title = registry.get(domain).map(|r| r.title.as_str()).unwrap_or("");
        println!("     🆕 {} - {}", domain, title);
    }

    Ok(0)
}

// Handles the 'dedupe' subcommand
// Parameters:
//   apply: remove the flagged duplicates instead of only printing the plan
fn handle_dedupe(paths: &DataPaths, policy: &Policy, apply: bool) -> Result<i32> {
    let mut registry = SiteRegistry::load(&paths.registry);
    let plan = DedupePlan::build(&registry, policy);

    println!("🔍 Found {} base names with multiple TLDs\n", plan.groups.len());
    for group in &plan.groups {
        let keep = group.keep();
        println!("  ✅ {:40} (score: {}) <- KEEP", keep.domain, keep.score);
        for member in &group.members[1..] {
            let mark = if member.remove { "❌" } else { "➖" };
            println!("  {} {:40} (score: {})", mark, member.domain, member.score);
        }
        println!();
    }

    let removals = plan.removals();
    if removals.is_empty() {
        println!("No duplicates to remove");
        return Ok(0);
    }

    if !apply {
        println!("[DRY RUN] Would remove {} duplicates", removals.len());
        println!("\nRun with --apply to actually remove them");
        return Ok(0);
    }

    let mut audit = AuditLog::load(&paths.audit_log);
    let removed = plan.apply(&mut registry, &mut audit, today());
    registry
        .save(&paths.registry)
        .context("saving the site registry")?;
    audit.save(&paths.audit_log).context("saving the audit log")?;

    println!("✅ Removed {} duplicates", removed);
    println!("📁 Remaining: {} sites", registry.len());
    Ok(0)
}

// Handles the 'quality' subcommand family
fn handle_quality(paths: &DataPaths, policy: Arc<Policy>, action: QualityAction) -> Result<i32> {
    let mut registry = SiteRegistry::load(&paths.registry);
    let mut exclusions = ExclusionRegistry::load(&paths.exclusions);
    let featured = LeadConfig::load(&paths.lead_sources).featured_set();
    let scorer = Scorer::new(Arc::clone(&policy), &exclusions, featured);

    match action {
        QualityAction::Score => {
            score(&mut registry, &scorer);
            registry.save(&paths.registry)?;
        }
        QualityAction::Featured => {
            score(&mut registry, &scorer);
            let marked = quality::mark_featured(&mut registry, &policy);
            for domain in &marked {
                println!("  ⭐ Featured: {}", domain);
            }
            println!("\n✅ Marked {} new sites as featured", marked.len());
            registry.save(&paths.registry)?;
        }
        QualityAction::Audit => print_audit(&registry),
        QualityAction::Export => {
            let rows = quality::export_csv(&registry, &paths.audit_csv)?;
            println!("📄 Exported {} sites to {}", rows, paths.audit_csv.display());
        }
        QualityAction::Cleanup => {
            let mut audit = AuditLog::load(&paths.audit_log);
            let report =
                quality::cleanup(&mut registry, &mut exclusions, &mut audit, &scorer, today());

            println!("🧹 Cleanup complete:");
            println!("   Removed: {} false positives", report.removed.len());
            println!("   Remaining: {} sites", registry.len());
            println!("   Newly excluded: {}", report.auto_excluded.len());
            for (domain, fp) in &report.removed {
                println!("    - {} [{}]", domain, fp);
            }

            registry.save(&paths.registry)?;
            exclusions.save(&paths.exclusions)?;
            audit.save(&paths.audit_log)?;
        }
        QualityAction::Exclusions => {
            println!("🚫 {} excluded domains\n", exclusions.len());
            for (domain, record) in &exclusions.excluded {
                println!(
                    "  {:30} {:24} recheck {}  {}",
                    domain, record.category, record.recheck_after, record.reason
                );
            }
        }
        QualityAction::Recheck => {
            let due = exclusions.due_for_recheck(today());
            println!("🔁 {} exclusions due for recheck\n", due.len());
            for (domain, record) in due {
                println!("  {:30} since {}  {}", domain, record.recheck_after, record.reason);
            }
        }
        QualityAction::Stats => print_stats(&registry, &exclusions),
        QualityAction::Exclude { domain, reason } => {
            let normalized = classify::normalize_domain(&domain);
            if normalized.is_empty() {
                bail!("not a valid domain: {}", domain);
            }
            let reason = reason.join(" ");

            let mut audit = AuditLog::load(&paths.audit_log);
            quality::exclude_manually(
                &mut exclusions,
                &mut audit,
                &normalized,
                &reason,
                today(),
                policy.thresholds.recheck_after_days,
            );
            exclusions.save(&paths.exclusions)?;
            audit.save(&paths.audit_log)?;
            println!("🚫 Excluded {}: {}", normalized, reason);
        }
    }

    Ok(0)
}

fn score(registry: &mut SiteRegistry, scorer: &Scorer) {
    println!("🔍 Scoring sites for quality...\n");
    let summary = quality::score_registry(registry, scorer);

    for (domain, trust, relevance) in &summary.needs_review {
        println!("  ⚠️  {}: trust={}, relevance={}", domain, trust, relevance);
    }

    println!("\n📊 Quality Distribution:");
    println!("  ✅ Verified: {}", summary.count(Trust::Verified));
    println!("  🟢 High trust: {}", summary.count(Trust::High));
    println!("  🟡 Medium trust: {}", summary.count(Trust::Medium));
    println!("  🟠 Low trust: {}", summary.count(Trust::Low));
    println!("  🔴 Untrusted: {}", summary.count(Trust::Untrusted));

    if !summary.false_positives.is_empty() {
        println!("\n🚫 Detected {} false positives:", summary.false_positives.len());
        for (domain, fp) in summary.false_positives.iter().take(10) {
            println!("    - {} [{}]", domain, fp);
        }
        if summary.false_positives.len() > 10 {
            println!("    ... and {} more", summary.false_positives.len() - 10);
        }
    }
}

fn print_audit(registry: &SiteRegistry) {
    let sites = quality::low_quality(registry);
    println!("🔍 AUDIT: {} sites need review\n", sites.len());
    println!("{}", "-".repeat(60));

    for (domain, record) in sites {
        let description: String = record.description_or_title().chars().take(50).collect();
        println!("{:10} | rel:{:3} | {}", record.trust.as_str(), record.relevance, domain);
        println!("           | {}", description);
        println!();
    }

    println!("{}", "-".repeat(60));
    println!("To upgrade a site, edit molt_sites_db.json and set:");
    println!("  \"trust\": \"medium\"  or  \"verified\": true");
}

fn print_stats(registry: &SiteRegistry, exclusions: &ExclusionRegistry) {
    let stats = quality::RegistryStats::collect(registry, exclusions, today());
    let quality_sites = quality::filter_quality(registry, Trust::Medium, 30).len();

    println!("📊 Registry");
    println!("   Total: {}", stats.total);
    println!("   Alive: {}", stats.alive);
    println!("   Real content: {}", stats.with_content);
    println!("   Medium+ trust, relevance 30+: {}", quality_sites);
    println!("   Featured: {}", stats.featured);
    println!("   Verified: {}", stats.verified);

    println!("\n   By trust:");
    for trust in Trust::ALL {
        let count = stats.by_trust.get(&trust).copied().unwrap_or(0);
        println!("     {:10} {}", trust.as_str(), count);
    }
    println!("\n   By source:");
    for (source, count) in &stats.by_source {
        println!("     {:10} {}", source, count);
    }

    println!("\n🚫 Exclusions: {} ({} due for recheck)", stats.excluded, stats.due_for_recheck);
}
