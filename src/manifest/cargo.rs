//! `Cargo.toml` field editing
//!
//! Self versions live at `package.version`, or at `workspace.package.version`
//! for a virtual workspace root. Pins are dependency entries, in either the
//! `dep = "1.2.3"` or the `dep = { version = "1.2.3", ... }` form, found in
//! `[dependencies]`, `[dev-dependencies]`, `[build-dependencies]`,
//! `[workspace.dependencies]` and the `[target.'cfg'.*]` variants. Renamed
//! entries (`alias = { package = "dep", ... }`) count as pins on `dep`.

use super::{FieldScan, FieldValue, ManifestEditor, classify};
use crate::core::catalog::{PatternKind, requirement_of};
use crate::core::error::LockstepResult;
use toml_edit::{DocumentMut, Item, TableLike, Value};

const DEPENDENCY_SECTIONS: &[&str] = &["dependencies", "dev-dependencies", "build-dependencies"];

/// Editor for build descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoManifest;

impl ManifestEditor for CargoManifest {
  fn rewrite(&self, content: &str, kind: &PatternKind, old: &str, new: &str) -> LockstepResult<FieldScan> {
    let mut doc: DocumentMut = content.parse()?;

    let mut found = Vec::new();
    visit_slots(&mut doc, kind, &mut |item: &mut Item| {
      if let Some(value) = read_slot(item) {
        found.push(value);
      }
    });

    if let Some(scan) = classify(&found, old, new) {
      return Ok(scan);
    }

    visit_slots(&mut doc, kind, &mut |item: &mut Item| {
      if item.as_str() == Some(old) {
        set_string(item, old, new);
      }
    });

    Ok(FieldScan::Rewritten(doc.to_string()))
  }
}

/// What a build descriptor declares, as far as version propagation goes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoSurvey {
  /// Carries a literal version of its own (not inherited from the workspace)
  pub self_version: bool,
  /// Versioned path dependencies on `internal` packages: (package, operator)
  pub pins: Vec<(String, String)>,
}

/// Find the version fields of a manifest that propagation should track
///
/// A pin is tracked when the dependency names one of `internal`, has a
/// `path` and carries a `version` whose operator is supported.
pub fn survey(content: &str, internal: &[String]) -> LockstepResult<CargoSurvey> {
  let mut doc: DocumentMut = content.parse()?;
  let self_version = self_version_slot(&mut doc).is_some_and(|item| item.is_str());

  let mut pins: Vec<(String, String)> = Vec::new();
  for_each_dependency_table(&mut doc, &mut |table: &mut dyn TableLike| {
    for (key, entry) in table.iter() {
      let Some(entry) = entry.as_table_like() else {
        continue;
      };
      let package = entry.get("package").and_then(Item::as_str).unwrap_or(key);
      if !internal.iter().any(|name| name == package) || !entry.contains_key("path") {
        continue;
      }
      let Some(version) = entry.get("version").and_then(Item::as_str) else {
        continue;
      };
      let Some(requirement) = requirement_of(version) else {
        tracing::warn!(package, version, "unsupported requirement, pin not tracked");
        continue;
      };
      if !pins.iter().any(|(name, _)| name == package) {
        pins.push((package.to_string(), requirement.to_string()));
      }
    }
  });

  Ok(CargoSurvey { self_version, pins })
}

/// Call `f` on every version item `kind` addresses
fn visit_slots(doc: &mut DocumentMut, kind: &PatternKind, f: &mut dyn FnMut(&mut Item)) {
  match kind {
    PatternKind::SelfVersion => {
      if let Some(item) = self_version_slot(doc) {
        f(item);
      }
    }
    PatternKind::DependencyPin { package, .. } => {
      for_each_dependency_table(doc, &mut |table: &mut dyn TableLike| {
        let keys: Vec<String> = table
          .iter()
          .filter(|(key, entry)| *key == package.as_str() || renamed_to(entry) == Some(package.as_str()))
          .map(|(key, _)| key.to_string())
          .collect();

        for key in keys {
          let Some(entry) = table.get_mut(&key) else {
            continue;
          };
          if entry.is_str() {
            f(entry);
          } else if let Some(version) = entry.as_table_like_mut().and_then(|t| t.get_mut("version")) {
            f(version);
          }
        }
      });
    }
  }
}

fn self_version_slot(doc: &mut DocumentMut) -> Option<&mut Item> {
  if doc.contains_key("package") {
    doc.get_mut("package")?.as_table_like_mut()?.get_mut("version")
  } else {
    doc
      .get_mut("workspace")?
      .as_table_like_mut()?
      .get_mut("package")?
      .as_table_like_mut()?
      .get_mut("version")
  }
}

fn for_each_dependency_table(doc: &mut DocumentMut, f: &mut dyn FnMut(&mut dyn TableLike)) {
  for section in DEPENDENCY_SECTIONS {
    if let Some(table) = doc.get_mut(section).and_then(Item::as_table_like_mut) {
      f(table);
    }
  }

  if let Some(table) = doc
    .get_mut("workspace")
    .and_then(Item::as_table_like_mut)
    .and_then(|ws| ws.get_mut("dependencies"))
    .and_then(Item::as_table_like_mut)
  {
    f(table);
  }

  if let Some(targets) = doc.get_mut("target").and_then(Item::as_table_like_mut) {
    for (_, cfg) in targets.iter_mut() {
      let Some(cfg) = cfg.as_table_like_mut() else {
        continue;
      };
      for section in DEPENDENCY_SECTIONS {
        if let Some(table) = cfg.get_mut(section).and_then(Item::as_table_like_mut) {
          f(table);
        }
      }
    }
  }
}

fn renamed_to(entry: &Item) -> Option<&str> {
  entry.as_table_like()?.get("package")?.as_str()
}

fn read_slot(item: &Item) -> Option<FieldValue> {
  match item {
    Item::Value(Value::String(s)) => Some(FieldValue::Str(s.value().clone())),
    // `version = { workspace = true }` inherits, nothing to pin here
    Item::Value(Value::InlineTable(_)) => None,
    Item::Value(other) => Some(FieldValue::Other(other.to_string().trim().to_string())),
    // `version.workspace = true` and empty slots
    _ => None,
  }
}

/// Replace a string value, keeping its quote style, whitespace and comments
///
/// The new value is parsed back from the old one's source text with the
/// version swapped, so `'0.1.0'` stays a literal string.
fn set_string(item: &mut Item, old: &str, new: &str) {
  let Some(Value::String(current)) = item.as_value() else {
    return;
  };
  let decor = current.decor().clone();
  let mut value = current
    .display_repr()
    .replacen(old, new, 1)
    .parse::<Value>()
    .ok()
    .filter(|value| value.as_str() == Some(new))
    .unwrap_or_else(|| Value::from(new));
  *value.decor_mut() = decor;
  *item = Item::Value(value);
}
