//! Init command: scaffold lockstep.toml from what the repository declares

use super::{display_path, resolve_root};
use crate::cargo::metadata::WorkspaceMetadata;
use crate::core::catalog::requirement_of;
use crate::core::config::{CoreConfig, LockstepConfig, ManifestConfig, PinConfig};
use crate::core::error::{LockstepError, LockstepResult, ResultExt};
use crate::manifest::{cargo, node};
use std::fs;
use std::path::{Component, Path, PathBuf};

const DEFAULT_NPM_GLOB: &str = "packages/*/package.json";

/// Run the init command to set up cargo-lockstep configuration
pub fn run_init(root: Option<PathBuf>, core: Option<String>, npm: Vec<String>, force: bool) -> LockstepResult<()> {
  let root = resolve_root(root)?;
  println!("📦 Scanning repository at: {}", root.display());

  if LockstepConfig::exists(&root) && !force {
    return Err(LockstepError::with_help(
      "Configuration already exists",
      "Pass --force to overwrite it",
    ));
  }

  let mut config = LockstepConfig::default();

  println!("🔍 Discovering Cargo manifests...");
  let cargo_manifests = discover_cargo(&root)?;
  println!("   {} tracked", cargo_manifests.len());
  config.manifests.extend(cargo_manifests);

  println!("🔍 Discovering package.json manifests...");
  let patterns = if npm.is_empty() {
    vec![DEFAULT_NPM_GLOB.to_string()]
  } else {
    npm
  };
  let npm_manifests = discover_npm(&root, &patterns)?;
  println!("   {} tracked", npm_manifests.len());

  if let Some(package) = core {
    config.core = Some(core_config(&root, &npm_manifests, package)?);
  }
  config.manifests.extend(npm_manifests);

  if config.manifests.is_empty() {
    return Err(LockstepError::with_help(
      "No manifests with a version found",
      "Point --npm at your package.json files, or run from the repository root",
    ));
  }

  println!("\n📋 Roster:");
  for manifest in &config.manifests {
    let pins: Vec<&str> = manifest.pins.iter().map(|p| p.package.as_str()).collect();
    let mut line = format!("  ✅ {}", manifest.path.display());
    if !manifest.self_version {
      line.push_str(" (inherited version)");
    }
    if !pins.is_empty() {
      line.push_str(&format!(" pins: {}", pins.join(", ")));
    }
    println!("{}", line);
  }
  if let Some(core) = &config.core {
    println!("  🔗 npm manifests pin {} ({})", core.package, display_requirement(&core.requirement));
  }

  config
    .validate()
    .map_err(|reason| LockstepError::message(format!("Generated roster is invalid: {}", reason)))?;

  println!("\n💾 Saving configuration...");
  let saved = config.save(&root)?;

  println!("\n✅ Successfully initialized cargo-lockstep!");
  println!("   Configuration saved to: {}", display_path(&root, &saved));
  println!("\n🚀 Next steps:");
  println!("   1. Review {} and drop manifests that should not move", display_path(&root, &saved));
  println!("   2. Run: cargo lockstep plan <OLD> <NEW>");
  println!("   3. Run: cargo lockstep bump <OLD> <NEW>");

  Ok(())
}

/// Workspace root (when it declares a version or pins) plus every member that does
fn discover_cargo(root: &Path) -> LockstepResult<Vec<ManifestConfig>> {
  if !root.join("Cargo.toml").exists() {
    return Ok(Vec::new());
  }

  let members = WorkspaceMetadata::load(root)?.members();
  let internal: Vec<String> = members.iter().map(|m| m.name.clone()).collect();

  let mut paths: Vec<PathBuf> = members.into_iter().map(|m| m.manifest).collect();
  if !paths.iter().any(|p| p == Path::new("Cargo.toml")) {
    paths.insert(0, PathBuf::from("Cargo.toml"));
  }

  let mut manifests = Vec::new();
  for path in paths {
    let content = fs::read_to_string(root.join(&path)).map_err(|e| LockstepError::io(&path, e))?;
    let found = cargo::survey(&content, &internal).with_context(|| format!("Failed to parse {}", path.display()))?;

    if !found.self_version && found.pins.is_empty() {
      tracing::debug!(path = %path.display(), "no version of its own, skipped");
      continue;
    }

    let mut manifest = ManifestConfig::new(path);
    manifest.self_version = found.self_version;
    manifest.pins = found
      .pins
      .into_iter()
      .map(|(package, requirement)| PinConfig { package, requirement })
      .collect();
    manifests.push(manifest);
  }

  Ok(manifests)
}

fn discover_npm(root: &Path, patterns: &[String]) -> LockstepResult<Vec<ManifestConfig>> {
  let mut manifests: Vec<ManifestConfig> = Vec::new();

  for pattern in patterns {
    let full = root.join(pattern);
    let mut matched = 0;
    for entry in glob::glob(&full.to_string_lossy())? {
      let path = entry.map_err(|e| LockstepError::message(format!("Cannot read {}", e.path().display())))?;
      let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
      if is_vendored(&relative) || manifests.iter().any(|m| m.path == relative) {
        continue;
      }

      let content = fs::read_to_string(&path).map_err(|e| LockstepError::io(&relative, e))?;
      let found = node::survey(&content).with_context(|| format!("Failed to parse {}", relative.display()))?;
      if !found.self_version {
        tracing::debug!(path = %relative.display(), "no version field, skipped");
        continue;
      }

      let mut manifest = ManifestConfig::new(relative);
      manifest.package = found.name;
      manifests.push(manifest);
      matched += 1;
    }

    if matched == 0 {
      tracing::warn!(pattern = %pattern, "matched no package.json with a version");
    }
  }

  Ok(manifests)
}

fn is_vendored(path: &Path) -> bool {
  path
    .components()
    .any(|c| matches!(c, Component::Normal(name) if name == "node_modules"))
}

/// Core pin config, with the operator dependents already use (`^` otherwise)
fn core_config(root: &Path, manifests: &[ManifestConfig], package: String) -> LockstepResult<CoreConfig> {
  if !manifests.iter().any(|m| m.package.as_deref() == Some(package.as_str())) {
    tracing::warn!(package = %package, "core package is not among the discovered npm manifests");
  }

  for manifest in manifests {
    let content = fs::read_to_string(root.join(&manifest.path)).map_err(|e| LockstepError::io(&manifest.path, e))?;
    let found = node::survey(&content)?;
    if let Some(requirement) = found.dependency(&package).and_then(requirement_of) {
      return Ok(CoreConfig {
        package,
        requirement: requirement.to_string(),
      });
    }
  }

  Ok(CoreConfig {
    package,
    requirement: "^".to_string(),
  })
}

fn display_requirement(requirement: &str) -> &str {
  if requirement.is_empty() { "exact" } else { requirement }
}
