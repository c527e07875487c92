//! Version strings as the propagation engine sees them
//!
//! A `VersionString` is an opaque literal. The engine never orders or
//! increments it; it only checks its shape, renders it into manifest
//! fragments, and compares it for equality.

use crate::core::error::FormatError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated `x.y.z` version literal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionString(String);

impl VersionString {
  /// Validate and wrap a version literal
  ///
  /// Splitting on `.` must yield exactly three components. The first two are
  /// plain digits; the third starts with digits and may carry a `-`/`+`
  /// suffix, so `0.5.0-rc7` passes while `1.2.x` does not.
  pub fn parse(raw: &str) -> Result<Self, FormatError> {
    let components: Vec<&str> = raw.split('.').collect();
    if components.len() != 3 {
      return Err(FormatError::ComponentCount {
        value: raw.to_string(),
        found: components.len(),
      });
    }

    let invalid = |component: &str| FormatError::InvalidComponent {
      value: raw.to_string(),
      component: component.to_string(),
    };

    for component in &components[..2] {
      if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(component));
      }
    }

    let last = components[2];
    let digits = last.bytes().take_while(|b| b.is_ascii_digit()).count();
    let suffix = &last[digits..];
    if digits == 0 || !(suffix.is_empty() || suffix.starts_with('-') || suffix.starts_with('+')) {
      return Err(invalid(last));
    }

    Ok(Self(raw.to_string()))
  }

  /// Interpret as semver, when it happens to be one
  pub fn to_semver(&self) -> Option<semver::Version> {
    semver::Version::parse(&self.0).ok()
  }
}

impl fmt::Display for VersionString {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for VersionString {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// Validate the old/new pair of a run
///
/// Both must parse; nothing is touched otherwise. Ordering is not enforced,
/// but a bump that does not move forward in semver terms is logged.
pub fn validate_pair(old: &str, new: &str) -> Result<(VersionString, VersionString), FormatError> {
  let old = VersionString::parse(old)?;
  let new = VersionString::parse(new)?;

  if let (Some(o), Some(n)) = (old.to_semver(), new.to_semver())
    && n <= o
  {
    tracing::warn!(old = %old, new = %new, "new version does not come after the old one; propagating anyway");
  }

  Ok((old, new))
}
