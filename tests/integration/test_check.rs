//! Integration tests for `cargo lockstep check`

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_check_passes_on_consistent_repo() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  let output = run_cargo_lockstep(&repo.path, &["lockstep", "check", "0.1.0"])?;
  assert!(stdout(&output).contains("All manifests carry 0.1.0"));

  Ok(())
}

#[test]
fn test_check_fails_on_other_version() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let before = repo.snapshot()?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "check", "0.2.0"])?;
  let err = stderr(&output);

  assert_eq!(output.status.code(), Some(3));
  assert!(err.contains("5 manifest(s) do not carry 0.2.0"), "stderr:\n{}", err);
  assert_eq!(repo.snapshot()?, before);

  Ok(())
}

#[test]
fn test_check_after_bump() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;

  run_cargo_lockstep(&repo.path, &["lockstep", "bump", "0.1.0", "0.2.0"])?;
  run_cargo_lockstep(&repo.path, &["lockstep", "check", "0.2.0"])?;

  Ok(())
}

#[test]
fn test_check_strict_rejects_absent_fields() -> Result<()> {
  let roster = format!("{}\n[[manifests]]\npath = \"packages/docs/package.json\"\n", MIXED_ROSTER);
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(&roster)?;
  repo.write("packages/docs/package.json", "{\n  \"name\": \"docs\",\n  \"private\": true\n}\n")?;

  run_cargo_lockstep(&repo.path, &["lockstep", "check", "0.1.0"])?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "check", "0.1.0", "--strict"])?;
  let err = stderr(&output);
  assert_eq!(output.status.code(), Some(3));
  assert!(err.contains("packages/docs/package.json"), "stderr:\n{}", err);

  Ok(())
}

#[test]
fn test_check_json() -> Result<()> {
  let repo = TestRepo::new_mixed("0.1.0")?.with_roster(MIXED_ROSTER)?;
  let app = repo.read_file("packages/app/package.json")?;
  repo.write(
    "packages/app/package.json",
    &app.replace("\"@scope/core\": \"^0.1.0\"", "\"@scope/core\": \"^0.0.3\""),
  )?;

  let output = run_cargo_lockstep_raw(&repo.path, &["lockstep", "check", "0.1.0", "--json"])?;
  assert_eq!(output.status.code(), Some(3));

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["ok"], false);
  let records = report["records"].as_array().unwrap();
  assert_eq!(records.len(), 8);

  let failing: Vec<_> = records.iter().filter(|r| r["found"].is_string()).collect();
  assert_eq!(failing.len(), 1);
  assert_eq!(failing[0]["path"], "packages/app/package.json");
  assert_eq!(failing[0]["outcome"], "tolerated_absent");
  assert_eq!(failing[0]["found"], "^0.0.3");

  Ok(())
}
