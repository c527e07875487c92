//! `package.json` field editing
//!
//! Self versions live in the top-level `version` field; pins are entries in
//! `dependencies`, `devDependencies`, `peerDependencies` and
//! `optionalDependencies`. Fields are located through borrowed
//! [`RawValue`]s, so each one comes with its byte span in the original text
//! and a rewrite splices the new value there. Everything else in the file,
//! escapes and layout included, stays byte for byte.

use super::{FieldScan, FieldValue, ManifestEditor, classify};
use crate::core::catalog::PatternKind;
use crate::core::error::{LockstepError, LockstepResult};
use serde_json::Value;
use serde_json::value::RawValue;
use std::collections::BTreeMap;
use std::ops::Range;

const DEPENDENCY_SECTIONS: &[&str] = &[
  "dependencies",
  "devDependencies",
  "peerDependencies",
  "optionalDependencies",
];

/// A JSON object whose values still point into the source text
type RawObject<'a> = BTreeMap<String, &'a RawValue>;

/// Editor for package metadata manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeManifest;

impl ManifestEditor for NodeManifest {
  fn rewrite(&self, content: &str, kind: &PatternKind, old: &str, new: &str) -> LockstepResult<FieldScan> {
    let slots = locate_slots(content, kind)?;

    let found: Vec<FieldValue> = slots
      .iter()
      .map(|(_, value)| match value {
        Value::String(s) => FieldValue::Str(s.clone()),
        other => FieldValue::Other(other.to_string()),
      })
      .collect();

    if let Some(scan) = classify(&found, old, new) {
      return Ok(scan);
    }

    let replacement = serde_json::to_string(new)?;
    let mut text = content.to_string();
    // Back to front, so the spans still ahead stay valid
    for (span, value) in slots.into_iter().rev() {
      if value.as_str() == Some(old) {
        text.replace_range(span, &replacement);
      }
    }
    Ok(FieldScan::Rewritten(text))
  }
}

/// Name, own version and dependency entries of a `package.json`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSurvey {
  pub name: Option<String>,
  pub self_version: bool,
  /// (package, value) across every dependency section, in file order
  pub dependencies: Vec<(String, String)>,
}

impl NodeSurvey {
  /// First value this manifest gives for `package`
  pub fn dependency(&self, package: &str) -> Option<&str> {
    self
      .dependencies
      .iter()
      .find(|(name, _)| name == package)
      .map(|(_, value)| value.as_str())
  }
}

pub fn survey(content: &str) -> LockstepResult<NodeSurvey> {
  let root: Value = serde_json::from_str(content)?;
  let object = root
    .as_object()
    .ok_or_else(|| LockstepError::message("package.json root is not a JSON object"))?;

  let dependencies = DEPENDENCY_SECTIONS
    .iter()
    .filter_map(|section| object.get(*section).and_then(Value::as_object))
    .flat_map(|deps| deps.iter())
    .filter_map(|(name, value)| value.as_str().map(|v| (name.clone(), v.to_string())))
    .collect();

  Ok(NodeSurvey {
    name: object.get("name").and_then(Value::as_str).map(str::to_string),
    self_version: object.get("version").is_some_and(Value::is_string),
    dependencies,
  })
}

/// Byte span and parsed value of every field `kind` addresses, in file order
fn locate_slots(content: &str, kind: &PatternKind) -> LockstepResult<Vec<(Range<usize>, Value)>> {
  if !content.trim_start().starts_with('{') {
    return Err(LockstepError::message("package.json root is not a JSON object"));
  }
  let root: RawObject<'_> = serde_json::from_str(content)?;

  let raw: Vec<&RawValue> = match kind {
    PatternKind::SelfVersion => root.get("version").copied().into_iter().collect(),
    PatternKind::DependencyPin { package, .. } => {
      let mut pins = Vec::new();
      for section in DEPENDENCY_SECTIONS {
        let Some(deps) = root.get(*section).copied().filter(|raw| raw.get().starts_with('{')) else {
          continue;
        };
        let deps: RawObject<'_> = serde_json::from_str(deps.get())?;
        pins.extend(deps.get(package.as_str()).copied());
      }
      pins
    }
  };

  let base = content.as_ptr() as usize;
  let mut slots = Vec::with_capacity(raw.len());
  for raw in raw {
    // Borrowed raw values are slices of `content`
    let start = raw.get().as_ptr() as usize - base;
    let value: Value = serde_json::from_str(raw.get())?;
    slots.push((start..start + raw.get().len(), value));
  }
  slots.sort_by_key(|(span, _)| span.start);
  Ok(slots)
}
