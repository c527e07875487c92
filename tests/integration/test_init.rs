//! Integration tests for `cargo lockstep init`

use crate::helpers::*;
use anyhow::Result;

/// (path, pattern kind, new literal) of every planned task, sorted
fn planned_tasks(repo: &TestRepo, extra: &[&str]) -> Result<Vec<String>> {
  let mut args = vec!["lockstep", "plan", "0.1.0", "0.2.0", "--json"];
  args.extend_from_slice(extra);
  let output = run_cargo_lockstep(&repo.path, &args)?;
  let plan: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  let mut tasks: Vec<String> = plan["tasks"]
    .as_array()
    .unwrap()
    .iter()
    .map(|t| format!("{} {} {}", t["path"], t["kind"]["kind"], t["new_literal"]))
    .collect();
  tasks.sort();
  Ok(tasks)
}

#[test]
fn test_init_discovers_mixed_repo() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?;
  repo.write("hand-written.toml", MIXED_ROSTER)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "init", "--core", "@scope/core"])?;
  let out = stdout(&output);

  assert!(out.contains("Successfully initialized"), "stdout:\n{}", out);
  assert!(out.contains("crates/app/Cargo.toml pins: lib-core"), "stdout:\n{}", out);
  assert!(out.contains("npm manifests pin @scope/core (^)"), "stdout:\n{}", out);
  assert!(repo.file_exists("lockstep.toml"));

  // The generated roster covers the same fields as the hand-written one
  let generated = planned_tasks(&repo, &[])?;
  let expected = planned_tasks(&repo, &["--config", "hand-written.toml"])?;
  assert_eq!(generated.len(), 8);
  assert_eq!(generated, expected);

  Ok(())
}

#[test]
fn test_init_roster_drives_a_bump() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?;

  run_cargo_lockstep(&repo.path, &["lockstep", "init", "--core", "@scope/core"])?;
  run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  run_cargo_lockstep(&repo.path, &["lockstep", "check", "0.2.0", "--strict"])?;

  let app = repo.read_file("crates/app/Cargo.toml")?;
  assert!(app.contains("version = \"=0.2.0\""));

  Ok(())
}

#[test]
fn test_init_skips_inherited_versions() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?;
  repo.add_crate(
    "member",
    "[package]\nname = \"member\"\nversion.workspace = true\nedition.workspace = true\n",
  )?;

  run_cargo_lockstep(&repo.path, &["lockstep", "init"])?;
  let roster = repo.read_file("lockstep.toml")?;

  assert!(!roster.contains("crates/member/Cargo.toml"), "roster:\n{}", roster);
  assert!(roster.contains("crates/lib-core/Cargo.toml"));

  Ok(())
}

#[test]
fn test_init_refuses_to_overwrite() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "init"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("already exists"));
  assert_eq!(repo.read_file("lockstep.toml")?, MIXED_ROSTER);

  run_cargo_lockstep(&repo.path, &["lockstep", "init", "--force"])?;
  assert_ne!(repo.read_file("lockstep.toml")?, MIXED_ROSTER);

  Ok(())
}

#[test]
fn test_init_custom_npm_glob_without_cargo() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.write("js/ui/package.json", "{\n  \"name\": \"ui\",\n  \"version\": \"2.0.0\"\n}\n")?;
  repo.write(
    "js/ui/node_modules/dep/package.json",
    "{\n  \"name\": \"dep\",\n  \"version\": \"9.9.9\"\n}\n",
  )?;

  run_cargo_lockstep(&repo.path, &["lockstep", "init", "--npm", "js/**/package.json"])?;
  let roster = repo.read_file("lockstep.toml")?;

  assert!(roster.contains("js/ui/package.json"), "roster:\n{}", roster);
  assert!(!roster.contains("node_modules"), "roster:\n{}", roster);

  Ok(())
}

#[test]
fn test_init_empty_repo_fails() -> Result<()> {
  let repo = TestRepo::new()?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "init"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("No manifests"));
  assert!(!repo.file_exists("lockstep.toml"));

  Ok(())
}
