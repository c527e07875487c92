//! Replacement tasks and the ordered plan a run executes
//!
//! A `SyncPlan` is the catalog expanded for one old→new pair. It is computed
//! without reading any manifest, serializes to JSON for review, and carries a
//! fingerprint so two runs can be compared.

use crate::core::catalog::{Catalog, ManifestFamily, PatternKind};
use crate::core::version::VersionString;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::PathBuf;

/// Plan identifier (SHA256 hash of plan contents)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Unit of work handed to the replacer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementTask {
  /// Manifest path relative to the repository root
  pub path: PathBuf,
  pub family: ManifestFamily,
  pub kind: PatternKind,
  pub old_literal: String,
  pub new_literal: String,
  pub old_version: VersionString,
  pub new_version: VersionString,
}

/// Ordered task list for one propagation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPlan {
  pub id: PlanId,
  pub old_version: VersionString,
  pub new_version: VersionString,
  pub tasks: Vec<ReplacementTask>,
}

impl SyncPlan {
  pub fn new(catalog: &Catalog, old: &VersionString, new: &VersionString) -> Self {
    let tasks = catalog.expand(old, new);
    let id = Self::fingerprint(&tasks);
    Self {
      id,
      old_version: old.clone(),
      new_version: new.clone(),
      tasks,
    }
  }

  fn fingerprint(tasks: &[ReplacementTask]) -> PlanId {
    // Serializing plain data into a Vec cannot fail
    let bytes = serde_json::to_vec(tasks).unwrap_or_default();
    PlanId::from_contents(&bytes)
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  /// Human-readable listing, one task per line
  pub fn to_human_readable(&self) -> String {
    let mut out = format!(
      "Plan {} ({} → {}, {} task(s))\n",
      self.id,
      self.old_version,
      self.new_version,
      self.tasks.len()
    );
    for (i, task) in self.tasks.iter().enumerate() {
      out.push_str(&format!(
        "  {:>3}. [{}] {} ({})\n       - {}\n       + {}\n",
        i + 1,
        task.family,
        task.path.display(),
        task.kind,
        task.old_literal,
        task.new_literal
      ));
    }
    out
  }
}
