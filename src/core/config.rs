//! Roster configuration (lockstep.toml)
//!
//! Searched in order: lockstep.toml, .lockstep.toml, .cargo/lockstep.toml,
//! .config/lockstep.toml
//!
//! ```toml
//! [settings]
//! strategy = "structured"
//! commit = "transactional"
//! strict = false
//!
//! [core]
//! package = "@scope/core"
//! requirement = "^"
//!
//! [[manifests]]
//! path = "Cargo.toml"
//!
//! [[manifests]]
//! path = "crates/app/Cargo.toml"
//! pins = [{ package = "lib-core", requirement = "=" }]
//!
//! [[manifests]]
//! path = "packages/core/package.json"
//! package = "@scope/core"
//! ```

use crate::core::catalog::{Catalog, ManifestFamily, ManifestTarget, PIN_REQUIREMENTS, PatternKind};
use crate::core::error::{ConfigError, LockstepError, LockstepResult, ResultExt};
use crate::core::replace::EditStrategy;
use crate::core::sync::CommitMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const CONFIG_FILE: &str = "lockstep.toml";

/// Configuration for cargo-lockstep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockstepConfig {
  #[serde(default)]
  pub settings: Settings,
  /// Package every npm manifest pins, except its own
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub core: Option<CoreConfig>,
  #[serde(default)]
  pub manifests: Vec<ManifestConfig>,
}

/// Run defaults; command-line flags take precedence
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Settings {
  #[serde(default)]
  pub strategy: EditStrategy,
  #[serde(default)]
  pub commit: CommitMode,
  /// Fail on manifests that carry a version other than the old or the new one
  #[serde(default)]
  pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
  pub package: String,
  #[serde(default)]
  pub requirement: String,
}

/// One `[[manifests]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
  /// Path relative to the repository root
  pub path: PathBuf,

  /// Inferred from the file extension when omitted
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub family: Option<ManifestFamily>,

  /// Package this manifest declares (needed to spot the core manifest)
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub package: Option<String>,

  /// Whether the manifest declares its own version
  #[serde(default = "default_true", skip_serializing_if = "is_true")]
  pub self_version: bool,

  /// Pins on other packages of the repository
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub pins: Vec<PinConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
  pub package: String,
  #[serde(default)]
  pub requirement: String,
}

fn default_true() -> bool {
  true
}

fn is_true(value: &bool) -> bool {
  *value
}

impl ManifestConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      family: None,
      package: None,
      self_version: true,
      pins: Vec::new(),
    }
  }

  /// Declared family, or the one the file name implies
  pub fn resolved_family(&self) -> Option<ManifestFamily> {
    self.family.or_else(|| ManifestFamily::infer(&self.path))
  }
}

impl LockstepConfig {
  /// Find config file in search order: lockstep.toml, .lockstep.toml, .cargo/lockstep.toml, .config/lockstep.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join(CONFIG_FILE),
      path.join(".lockstep.toml"),
      path.join(".cargo").join(CONFIG_FILE),
      path.join(".config").join(CONFIG_FILE),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from the repository root (searches multiple locations)
  pub fn load(root: &Path) -> LockstepResult<Self> {
    let config_path = Self::find_config_path(root).ok_or_else(|| {
      LockstepError::Config(ConfigError::NotFound {
        workspace_root: root.to_path_buf(),
      })
    })?;
    Self::load_from(&config_path)
  }

  /// Load and validate a specific config file
  pub fn load_from(config_path: &Path) -> LockstepResult<Self> {
    let content = fs::read_to_string(config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: LockstepConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate().map_err(|reason| {
      LockstepError::Config(ConfigError::Invalid {
        path: config_path.to_path_buf(),
        reason,
      })
    })?;

    Ok(config)
  }

  /// Save config to lockstep.toml (default location)
  pub fn save(&self, root: &Path) -> LockstepResult<PathBuf> {
    let config_path = root.join(CONFIG_FILE);
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(config_path)
  }

  /// Check if config exists at the given path
  pub fn exists(root: &Path) -> bool {
    Self::find_config_path(root).is_some()
  }

  /// Validate the roster, returning the first problem found
  pub fn validate(&self) -> Result<(), String> {
    if self.manifests.is_empty() {
      return Err("no [[manifests]] entries; nothing to propagate".to_string());
    }

    if let Some(core) = &self.core {
      if core.package.is_empty() {
        return Err("[core] package must not be empty".to_string());
      }
      check_requirement(&core.requirement, "[core]")?;
    }

    let mut seen = HashSet::new();
    for manifest in &self.manifests {
      let shown = manifest.path.display();

      if manifest.path.as_os_str().is_empty() {
        return Err("manifest path must not be empty".to_string());
      }
      let escapes = manifest
        .path
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
      if escapes {
        return Err(format!(
          "manifest path '{}' must be relative to the repository root and stay inside it",
          shown
        ));
      }
      if !seen.insert(&manifest.path) {
        return Err(format!("manifest '{}' is listed more than once", shown));
      }
      if manifest.resolved_family().is_none() {
        return Err(format!(
          "cannot infer the family of '{}'; set family = \"cargo\" or family = \"npm\"",
          shown
        ));
      }
      for pin in &manifest.pins {
        if pin.package.is_empty() {
          return Err(format!("a pin in '{}' has an empty package name", shown));
        }
        check_requirement(&pin.requirement, &format!("pin on '{}' in '{}'", pin.package, shown))?;
      }
    }

    Ok(())
  }

  /// Build the pattern catalog this roster describes
  pub fn to_catalog(&self) -> LockstepResult<Catalog> {
    let mut targets = Vec::with_capacity(self.manifests.len());
    for manifest in &self.manifests {
      let family = manifest.resolved_family().ok_or_else(|| {
        LockstepError::message(format!("Cannot infer the family of '{}'", manifest.path.display()))
      })?;

      let mut target = ManifestTarget::new(manifest.path.clone(), family);
      target.package = manifest.package.clone();
      if manifest.self_version {
        target = target.pattern(PatternKind::SelfVersion);
      }
      for pin in &manifest.pins {
        target = target.pattern(PatternKind::pin(pin.package.clone(), pin.requirement.clone()));
      }
      targets.push(target);
    }

    let catalog = Catalog::new(targets);
    Ok(match &self.core {
      Some(core) => catalog.with_core_pin(&core.package, &core.requirement),
      None => catalog,
    })
  }
}

fn check_requirement(requirement: &str, owner: &str) -> Result<(), String> {
  if PIN_REQUIREMENTS.contains(&requirement) {
    Ok(())
  } else {
    Err(format!(
      "{} has requirement '{}'; expected one of \"\", \"^\", \"~\", \"=\", \">=\"",
      owner, requirement
    ))
  }
}
