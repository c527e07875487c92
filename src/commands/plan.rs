//! Plan command: the ordered task list for one propagation

use super::RepoLocation;
use crate::core::error::LockstepResult;
use crate::core::plan::SyncPlan;
use crate::core::version::validate_pair;

/// Run the plan command
pub fn run_plan(location: RepoLocation, old: &str, new: &str, json: bool) -> LockstepResult<()> {
  let (old, new) = validate_pair(old, new)?;
  let (_, config) = location.load()?;
  let catalog = config.to_catalog()?;

  let plan = SyncPlan::new(&catalog, &old, &new);

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
  } else if plan.is_empty() {
    println!("⚠️  The roster expands to no tasks");
  } else {
    print!("{}", plan.to_human_readable());
  }

  Ok(())
}
