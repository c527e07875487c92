//! Bump command: propagate one version across the roster

use super::RepoLocation;
use crate::core::error::LockstepResult;
use crate::core::replace::{EditStrategy, ReplacementOutcome};
use crate::core::sync::{CommitMode, SyncOrchestrator, SyncReport};

/// Flags of `cargo lockstep bump`
pub struct BumpOptions {
  pub dry_run: bool,
  /// Overrides `[settings] strategy`
  pub strategy: Option<EditStrategy>,
  /// Overrides `[settings] commit`
  pub commit: Option<CommitMode>,
  /// Combined with `[settings] strict`
  pub strict: bool,
  pub json: bool,
}

/// Run the bump command
pub fn run_bump(location: RepoLocation, old: &str, new: &str, options: BumpOptions) -> LockstepResult<()> {
  let (root, config) = location.load()?;
  let catalog = config.to_catalog()?;

  let strategy = options.strategy.unwrap_or(config.settings.strategy);
  let commit = options.commit.unwrap_or(config.settings.commit);
  let strict = options.strict || config.settings.strict;

  if !options.json {
    println!("📦 Bumping {} → {} in {}", old, new, root.display());
    println!();
  }

  let report = SyncOrchestrator::new(&catalog, &root)
    .strategy(strategy)
    .commit(commit)
    .strict(strict)
    .dry_run(options.dry_run)
    .run(old, new)?;

  if options.json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    print_report(&report);
  }

  Ok(())
}

fn print_report(report: &SyncReport) {
  for record in &report.records {
    let detail = match &record.found {
      Some(found) => format!("left at {}", found),
      None => record.outcome.to_string(),
    };
    println!(
      "  {} {} ({}): {}",
      record.outcome.icon(),
      record.path.display(),
      record.pattern,
      detail
    );
  }
  println!();

  println!(
    "  {} replaced, {} already current, {} not found",
    report.count(ReplacementOutcome::Replaced),
    report.count(ReplacementOutcome::AlreadyCurrent),
    report.count(ReplacementOutcome::ToleratedAbsent)
  );

  if report.dry_run {
    println!();
    println!("🔍 Dry-run mode (no changes applied)");
    if !report.written.is_empty() {
      println!("   Would write {} file(s):", report.written.len());
      for path in &report.written {
        println!("     {}", path.display());
      }
    }
  } else if report.written.is_empty() {
    println!();
    println!("✅ Already at {}, nothing to write", report.new_version);
  } else {
    println!();
    println!(
      "✅ Wrote {} file(s) (plan {})",
      report.written.len(),
      report.plan_id
    );
  }
}
