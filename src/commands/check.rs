//! Check command: verify every manifest already carries one version

use super::RepoLocation;
use crate::core::error::{LockstepError, LockstepResult};
use crate::core::replace::{EditStrategy, ReplacementOutcome};
use crate::core::sync::{SyncOrchestrator, TaskRecord};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct CheckReport<'a> {
  version: &'a str,
  strict: bool,
  ok: bool,
  records: &'a [TaskRecord],
}

/// Run the check command
pub fn run_check(
  location: RepoLocation,
  version: &str,
  strategy: Option<EditStrategy>,
  strict: bool,
  json: bool,
) -> LockstepResult<()> {
  let (root, config) = location.load()?;
  let catalog = config.to_catalog()?;
  let strategy = strategy.unwrap_or(config.settings.strategy);

  let records = SyncOrchestrator::new(&catalog, &root)
    .strategy(strategy)
    .verify(version)?;

  let mut failing: Vec<PathBuf> = Vec::new();
  for record in records.iter().filter(|r| is_failure(r, strict)) {
    if !failing.contains(&record.path) {
      failing.push(record.path.clone());
    }
  }

  if json {
    let report = CheckReport {
      version,
      strict,
      ok: failing.is_empty(),
      records: &records,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    println!("🔍 Checking for {} in {}", version, root.display());
    println!();
    for record in &records {
      let icon = if is_failure(record, strict) {
        "❌"
      } else {
        record.outcome.icon()
      };
      let detail = match (&record.found, record.outcome) {
        (Some(found), _) => format!("found {}", found),
        (None, ReplacementOutcome::AlreadyCurrent) => "ok".to_string(),
        (None, outcome) => outcome.to_string(),
      };
      println!("  {} {} ({}): {}", icon, record.path.display(), record.pattern, detail);
    }
    println!();
  }

  if failing.is_empty() {
    if !json {
      println!("✅ All manifests carry {}", version);
    }
    Ok(())
  } else {
    Err(LockstepError::OutOfSync {
      version: version.to_string(),
      paths: failing,
    })
  }
}

/// A field holding another version always fails; a missing one only when strict
fn is_failure(record: &TaskRecord, strict: bool) -> bool {
  record.outcome.is_fatal()
    || record.found.is_some()
    || (strict && record.outcome == ReplacementOutcome::ToleratedAbsent)
}
