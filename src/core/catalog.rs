//! Pattern catalog: which manifests carry which version fragments
//!
//! The catalog is declarative data. It is normally built from `lockstep.toml`
//! (see [`crate::core::config`]), but the engine only sees a [`Catalog`]
//! value, so tests can hand it a synthetic roster.
//!
//! # Expansion order
//!
//! Family order (Cargo, then npm), then file order within the family as the
//! roster lists it, then pattern order within the file. This order is the
//! order tasks run in, and therefore decides which file fails first.

use crate::core::plan::ReplacementTask;
use crate::core::version::VersionString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Manifest family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestFamily {
  /// Build descriptors (`Cargo.toml`)
  Cargo,
  /// Package metadata manifests (`package.json`)
  Npm,
}

impl ManifestFamily {
  /// Infer the family from a manifest's file name
  pub fn infer(path: &Path) -> Option<Self> {
    match path.extension().and_then(|e| e.to_str()) {
      Some("toml") => Some(ManifestFamily::Cargo),
      Some("json") => Some(ManifestFamily::Npm),
      _ => None,
    }
  }
}

impl fmt::Display for ManifestFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestFamily::Cargo => f.write_str("cargo"),
      ManifestFamily::Npm => f.write_str("npm"),
    }
  }
}

/// Requirement operators a dependency pin may carry
pub const PIN_REQUIREMENTS: &[&str] = &["", "^", "~", "=", ">="];

/// Split the operator off a pin value (`^0.1.0` → `^`)
///
/// Returns `None` when the operator is not one of [`PIN_REQUIREMENTS`].
pub fn requirement_of(value: &str) -> Option<&str> {
  let start = value.find(|c: char| c.is_ascii_digit())?;
  let operator = value[..start].trim_end();
  PIN_REQUIREMENTS.contains(&operator).then_some(operator)
}

/// A kind of version fragment a manifest is expected to contain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PatternKind {
  /// The package's own version declaration
  SelfVersion,
  /// A pin on another package of the repository
  DependencyPin {
    package: String,
    /// Operator written in front of the version (`^`, `=`, ... or empty)
    #[serde(default)]
    requirement: String,
  },
}

impl PatternKind {
  pub fn pin(package: impl Into<String>, requirement: impl Into<String>) -> Self {
    PatternKind::DependencyPin {
      package: package.into(),
      requirement: requirement.into(),
    }
  }

  /// The value a field of this kind holds at `version` (`^1.2.3` for a caret pin)
  pub fn field_value(&self, version: &VersionString) -> String {
    match self {
      PatternKind::SelfVersion => version.to_string(),
      PatternKind::DependencyPin { requirement, .. } => format!("{}{}", requirement, version),
    }
  }

  /// Literal text fragment for this kind in a manifest of `family`
  pub fn literal(&self, family: ManifestFamily, version: &VersionString) -> String {
    let value = self.field_value(version);
    match (self, family) {
      (PatternKind::SelfVersion, ManifestFamily::Cargo) => format!("version = \"{}\"", value),
      (PatternKind::SelfVersion, ManifestFamily::Npm) => format!("\"version\": \"{}\"", value),
      (PatternKind::DependencyPin { package, .. }, ManifestFamily::Cargo) => format!("{} = \"{}\"", package, value),
      (PatternKind::DependencyPin { package, .. }, ManifestFamily::Npm) => format!("\"{}\": \"{}\"", package, value),
    }
  }
}

impl fmt::Display for PatternKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PatternKind::SelfVersion => f.write_str("self version"),
      PatternKind::DependencyPin { package, requirement } if requirement.is_empty() => {
        write!(f, "pin on {}", package)
      }
      PatternKind::DependencyPin { package, requirement } => write!(f, "pin on {} ({})", package, requirement),
    }
  }
}

/// One manifest file and the fragments it must carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTarget {
  /// Path relative to the repository root
  pub path: PathBuf,
  pub family: ManifestFamily,
  /// Name of the package this manifest declares, if known
  pub package: Option<String>,
  pub patterns: Vec<PatternKind>,
}

impl ManifestTarget {
  pub fn new(path: impl Into<PathBuf>, family: ManifestFamily) -> Self {
    Self {
      path: path.into(),
      family,
      package: None,
      patterns: Vec::new(),
    }
  }

  pub fn package(mut self, name: impl Into<String>) -> Self {
    self.package = Some(name.into());
    self
  }

  pub fn pattern(mut self, kind: PatternKind) -> Self {
    self.patterns.push(kind);
    self
  }
}

/// Ordered roster of manifest targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
  targets: Vec<ManifestTarget>,
}

impl Catalog {
  /// Build a catalog; targets are grouped by family, keeping roster order within each family
  pub fn new(mut targets: Vec<ManifestTarget>) -> Self {
    // sort_by_key is stable
    targets.sort_by_key(|t| t.family);
    Self { targets }
  }

  /// Add a pin on the core package to every npm manifest except the core's own
  ///
  /// The pin goes after the manifest's other patterns. Manifests that already
  /// pin the core package are left alone.
  pub fn with_core_pin(mut self, core_package: &str, requirement: &str) -> Self {
    for target in self.targets.iter_mut().filter(|t| t.family == ManifestFamily::Npm) {
      if target.package.as_deref() == Some(core_package) {
        continue;
      }
      let already_pinned = target
        .patterns
        .iter()
        .any(|p| matches!(p, PatternKind::DependencyPin { package, .. } if package == core_package));
      if !already_pinned {
        target.patterns.push(PatternKind::pin(core_package, requirement));
      }
    }
    self
  }

  pub fn targets(&self) -> &[ManifestTarget] {
    &self.targets
  }

  /// Expand into the ordered task sequence for one old→new propagation
  pub fn expand(&self, old: &VersionString, new: &VersionString) -> Vec<ReplacementTask> {
    self
      .targets
      .iter()
      .flat_map(|target| {
        target.patterns.iter().map(move |kind| ReplacementTask {
          path: target.path.clone(),
          family: target.family,
          kind: kind.clone(),
          old_literal: kind.literal(target.family, old),
          new_literal: kind.literal(target.family, new),
          old_version: old.clone(),
          new_version: new.clone(),
        })
      })
      .collect()
  }
}
