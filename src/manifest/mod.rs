//! Structure-aware manifest editing
//!
//! Each manifest family gets an editor that parses the file into a keyed
//! tree, finds the fields a [`PatternKind`] addresses, and rewrites only
//! those values:
//!
//! - **cargo**: `Cargo.toml` through `toml_edit` (lossless, comments kept)
//! - **node**: `package.json` through `serde_json`, with the new value
//!   spliced into the original text
//!
//! A version that happens to appear elsewhere in the file (a URL, a
//! comment, an unrelated dependency) is never touched, and bytes outside the
//! rewritten values stay as they were.

use crate::core::catalog::{ManifestFamily, PatternKind};
use crate::core::error::LockstepResult;

pub mod cargo;
pub mod node;

pub use cargo::CargoManifest;
pub use node::NodeManifest;

/// Result of looking for one pattern's fields in a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldScan {
  /// No addressed field exists in the manifest
  Absent,
  /// Every addressed field already holds the new value
  Current,
  /// At least one field held the old value; full rewritten text
  Rewritten(String),
  /// Fields exist but none holds the old or the new value
  Unrelated { found: String },
}

/// What an addressed field currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FieldValue {
  Str(String),
  /// Present but not a string (rendered for the error message)
  Other(String),
}

/// Decide the scan result from the values found, before any mutation
///
/// Same precedence as a literal run: any old value is rewritten, then any new
/// value means current. Returns `None` when the old values need rewriting.
pub(crate) fn classify(found: &[FieldValue], old: &str, new: &str) -> Option<FieldScan> {
  let holds = |wanted: &str| found.iter().any(|v| matches!(v, FieldValue::Str(s) if s == wanted));

  if old != new && holds(old) {
    return None;
  }
  if holds(new) {
    return Some(FieldScan::Current);
  }

  match found.first() {
    None => Some(FieldScan::Absent),
    Some(FieldValue::Str(s) | FieldValue::Other(s)) => Some(FieldScan::Unrelated { found: s.clone() }),
  }
}

/// Field-level editor for one manifest family
pub trait ManifestEditor {
  /// Look up the fields `kind` addresses and rewrite `old` values to `new`
  ///
  /// `old` and `new` are full field values, requirement operator included.
  fn rewrite(&self, content: &str, kind: &PatternKind, old: &str, new: &str) -> LockstepResult<FieldScan>;
}

/// Editor for a manifest family
pub fn editor_for(family: ManifestFamily) -> &'static dyn ManifestEditor {
  match family {
    ManifestFamily::Cargo => &CargoManifest,
    ManifestFamily::Npm => &NodeManifest,
  }
}
