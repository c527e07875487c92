//! Integration tests for `cargo lockstep bump`

use crate::helpers::*;
use anyhow::Result;

/// What the mixed layout looks like after a clean 0.1.0 → 0.2.0 bump
fn bumped_snapshot() -> Result<Vec<String>> {
  let mut expected = TestRepo::new_mixed("0.2.0")?.snapshot()?;
  // Unrelated URL keeps the old version
  expected[1] = expected[1].replace("/lib-core/0.2.0/", "/lib-core/0.1.0/");
  Ok(expected)
}

#[test]
fn test_bump_updates_every_manifest() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  let out = stdout(&output);

  assert!(out.contains("Wrote 5 file(s)"), "stdout:\n{}", out);
  assert_eq!(repo.snapshot()?, bumped_snapshot()?);

  let app = repo.read_file("packages/app/package.json")?;
  assert!(app.contains("\"@scope/core\": \"^0.2.0\""));
  assert!(app.contains("\"left-pad\": \"^1.3.0\""));

  Ok(())
}

#[test]
fn test_bump_twice_is_a_no_op() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  let after_first = repo.snapshot()?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  let out = stdout(&output);

  assert!(out.contains("Already at 0.2.0"), "stdout:\n{}", out);
  assert!(out.contains("0 replaced, 8 already current"), "stdout:\n{}", out);
  assert_eq!(repo.snapshot()?, after_first);

  Ok(())
}

#[test]
fn test_bump_dry_run_writes_nothing() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let before = repo.snapshot()?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0", "--dry-run"])?;
  let out = stdout(&output);

  assert!(out.contains("Dry-run mode"), "stdout:\n{}", out);
  assert!(out.contains("Would write 5 file(s)"), "stdout:\n{}", out);
  assert_eq!(repo.snapshot()?, before);

  Ok(())
}

#[test]
fn test_bump_rejects_malformed_versions() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let before = repo.snapshot()?;

  for (old, new) in [("0.1", "0.2.0"), ("0.1.0", "0.2.x"), ("0.1.0", "1.2.3.4")] {
    let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "bump", old, new])?;
    assert_eq!(output.status.code(), Some(1), "bump {} {}", old, new);
    assert!(stderr(&output).contains("Version string"), "stderr:\n{}", stderr(&output));
  }

  assert_eq!(repo.snapshot()?, before);
  Ok(())
}

#[test]
fn test_bump_leaves_other_versions_alone() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let app = repo.read_file("crates/app/Cargo.toml")?;
  let pinned_elsewhere = app.replace("name = \"app\"\nversion = \"0.1.0\"", "name = \"app\"\nversion = \"0.0.9\"");
  repo.write("crates/app/Cargo.toml", &pinned_elsewhere)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  let out = stdout(&output);

  assert!(out.contains("crates/app/Cargo.toml (self version): left at 0.0.9"), "stdout:\n{}", out);
  assert!(out.contains("7 replaced, 0 already current, 1 not found"), "stdout:\n{}", out);
  // The pin in the same file still moves, every other manifest too
  assert_eq!(
    repo.read_file("crates/app/Cargo.toml")?,
    pinned_elsewhere.replace("\"=0.1.0\"", "\"=0.2.0\"")
  );
  assert!(repo.read_file("packages/app/package.json")?.contains("\"@scope/core\": \"^0.2.0\""));

  Ok(())
}

#[test]
fn test_strict_bump_mismatch_fails_without_writing() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let app = repo.read_file("crates/app/Cargo.toml")?;
  repo.write(
    "crates/app/Cargo.toml",
    &app.replace("name = \"app\"\nversion = \"0.1.0\"", "name = \"app\"\nversion = \"0.0.9\""),
  )?;
  let before = repo.snapshot()?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0", "--strict"])?;
  let err = stderr(&output);

  assert_eq!(output.status.code(), Some(3));
  assert!(err.contains("crates/app/Cargo.toml"), "stderr:\n{}", err);
  assert!(err.contains("found `0.0.9`"), "stderr:\n{}", err);
  // Earlier manifests in the plan are untouched too
  assert_eq!(repo.snapshot()?, before);

  Ok(())
}

#[test]
fn test_bump_keeps_package_json_bytes() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let original = r#"{"name": "@scope/core", "description": "caf\u00e9", "version": "0.1.0", "files": ["dist", "src"], "repository": "https:\/\/example.com\/core"}
"#;
  repo.write("packages/core/package.json", original)?;

  run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;

  assert_eq!(
    repo.read_file("packages/core/package.json")?,
    original.replace("\"0.1.0\"", "\"0.2.0\"")
  );

  Ok(())
}

#[test]
fn test_missing_manifest_sequential_vs_transactional() -> Result<()> {
  let roster = r#"[[manifests]]
path = "Cargo.toml"

[[manifests]]
path = "crates/missing/Cargo.toml"

[[manifests]]
path = "crates/lib-core/Cargo.toml"
"#;

  let transactional = TestRepo::new_mixed("0.1.0")?.with_roster(roster)?;
  let before = transactional.snapshot()?;
  let output = run_cargo_lockstep_raw(&transactional.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("crates/missing/Cargo.toml"));
  assert_eq!(transactional.snapshot()?, before);

  let sequential = TestRepo::new_mixed("0.1.0")?.with_roster(roster)?;
  let output = run_cargo_lockstep_raw(
    &sequential.path,
    &["lockstep", "bump", "0.1.0", "0.2.0", "--commit", "sequential"],
  )?;
  assert_eq!(output.status.code(), Some(2));
  assert!(stderr(&output).contains("crates/missing/Cargo.toml"));
  // The file before the failure was already rewritten, the one after was never reached
  assert!(sequential.read_file("Cargo.toml")?.contains("version = \"0.2.0\""));
  assert!(
    sequential
      .read_file("crates/lib-core/Cargo.toml")?
      .contains("version = \"0.1.0\"")
  );

  Ok(())
}

#[test]
fn test_bump_json_report() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  assert_eq!(report["old_version"], "0.1.0");
  assert_eq!(report["new_version"], "0.2.0");
  assert_eq!(report["strategy"], "structured");
  assert_eq!(report["commit"], "transactional");
  assert_eq!(report["dry_run"], false);

  let records = report["records"].as_array().unwrap();
  assert_eq!(records.len(), 8);
  assert!(records.iter().all(|r| r["outcome"] == "replaced"));
  assert_eq!(report["written"].as_array().unwrap().len(), 5);

  Ok(())
}

#[test]
fn test_literal_strategy_misses_inline_table_pins() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  let output = run_cargo_lockstep(
    &repo.path,
    &["lockstep", "bump", "0.1.0", "0.2.0", "--strategy", "literal", "--json"],
  )?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let outcomes: Vec<&str> = report["records"]
    .as_array()
    .unwrap()
    .iter()
    .map(|r| r["outcome"].as_str().unwrap())
    .collect();

  // `lib-core = "..."` never appears verbatim: both crate pins are inline tables
  assert_eq!(
    outcomes,
    vec![
      "replaced",
      "tolerated_absent",
      "replaced",
      "replaced",
      "tolerated_absent",
      "replaced",
      "replaced",
      "replaced",
    ]
  );

  let app = repo.read_file("crates/app/Cargo.toml")?;
  assert!(app.contains("version = \"0.2.0\""));
  assert!(app.contains("version = \"=0.1.0\""));

  Ok(())
}

#[test]
fn test_settings_from_roster_apply() -> Result<()> {
  let roster = format!("[settings]\nstrategy = \"literal\"\ncommit = \"sequential\"\n\n{}", MIXED_ROSTER);
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(&roster)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["strategy"], "literal");
  assert_eq!(report["commit"], "sequential");

  // Flags take precedence over the roster
  let fresh = TestRepo::new_mixed("0.1.0")?.with_roster(&roster)?;
  let output = run_cargo_lockstep(
    &fresh.path,
    &["lockstep", "bump", "0.1.0", "0.2.0", "--json", "--strategy", "structured"],
  )?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["strategy"], "structured");

  Ok(())
}
