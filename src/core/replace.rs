//! Pattern replacement: decide and apply one task's outcome
//!
//! Two strategies share one outcome model:
//!
//! - **literal**: plain substring substitution of the old fragment by the new
//!   one. Every occurrence is replaced, including collateral ones inside URLs
//!   or comments.
//! - **structured**: the manifest is parsed and only the addressed fields are
//!   rewritten (see [`crate::manifest`]).
//!
//! A structured field holding neither version is a tolerated absence, like a
//! literal run that finds neither fragment, but the value found is kept for
//! the report. A strict replacer treats it as a fatal mismatch instead.
//!
//! Deciding an outcome (`evaluate`) is pure; `apply` wraps it with the read
//! and the optional write, one file at a time.

use crate::core::error::{LockstepError, LockstepResult, ResultExt};
use crate::core::plan::ReplacementTask;
use crate::manifest::{FieldScan, editor_for};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// How fragments are located in a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EditStrategy {
  /// Substring substitution over the raw text
  Literal,
  /// Key-path editing of the parsed manifest
  #[default]
  Structured,
}

/// Outcome of one replacement task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementOutcome {
  /// The old fragment was found and rewritten
  Replaced,
  /// The file already carries the new fragment
  AlreadyCurrent,
  /// Neither fragment is present; the pattern does not apply here
  ToleratedAbsent,
  /// The file disagrees with both versions; the run must stop
  FatalMismatch,
}

impl ReplacementOutcome {
  pub fn is_fatal(self) -> bool {
    matches!(self, ReplacementOutcome::FatalMismatch)
  }

  pub fn icon(self) -> &'static str {
    match self {
      ReplacementOutcome::Replaced => "✏️ ",
      ReplacementOutcome::AlreadyCurrent => "✅",
      ReplacementOutcome::ToleratedAbsent => "⚪",
      ReplacementOutcome::FatalMismatch => "❌",
    }
  }
}

impl fmt::Display for ReplacementOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReplacementOutcome::Replaced => f.write_str("replaced"),
      ReplacementOutcome::AlreadyCurrent => f.write_str("already current"),
      ReplacementOutcome::ToleratedAbsent => f.write_str("not found (tolerated)"),
      ReplacementOutcome::FatalMismatch => f.write_str("fatal mismatch"),
    }
  }
}

/// A decided outcome plus the text to write, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
  pub outcome: ReplacementOutcome,
  /// New file content; only set for `Replaced`
  pub content: Option<String>,
  /// Value a structured field held in place of either version
  pub found: Option<String>,
}

impl Evaluation {
  fn unchanged(outcome: ReplacementOutcome) -> Self {
    Self {
      outcome,
      content: None,
      found: None,
    }
  }
}

/// Applies replacement tasks with one edit strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternReplacer {
  strategy: EditStrategy,
  strict: bool,
}

impl PatternReplacer {
  pub fn new(strategy: EditStrategy) -> Self {
    Self { strategy, strict: false }
  }

  pub fn with_strategy(mut self, strategy: EditStrategy) -> Self {
    self.strategy = strategy;
    self
  }

  /// Fail on structured fields that hold some other version
  pub fn strict(mut self, strict: bool) -> Self {
    self.strict = strict;
    self
  }

  pub fn strategy(&self) -> EditStrategy {
    self.strategy
  }

  pub fn is_strict(&self) -> bool {
    self.strict
  }

  /// Decide the outcome of `task` against `content` without touching disk
  pub fn evaluate(&self, task: &ReplacementTask, content: &str) -> LockstepResult<Evaluation> {
    match self.strategy {
      EditStrategy::Literal => Ok(evaluate_literal(content, &task.old_literal, &task.new_literal)),
      EditStrategy::Structured => {
        let old = task.kind.field_value(&task.old_version);
        let new = task.kind.field_value(&task.new_version);
        let scan = editor_for(task.family)
          .rewrite(content, &task.kind, &old, &new)
          .with_context(|| format!("Failed to parse {}", task.path.display()))?;

        Ok(match scan {
          FieldScan::Absent => Evaluation::unchanged(ReplacementOutcome::ToleratedAbsent),
          FieldScan::Current => Evaluation::unchanged(ReplacementOutcome::AlreadyCurrent),
          FieldScan::Rewritten(text) => Evaluation {
            outcome: ReplacementOutcome::Replaced,
            content: Some(text),
            found: None,
          },
          FieldScan::Unrelated { found } => Evaluation {
            outcome: if self.strict {
              ReplacementOutcome::FatalMismatch
            } else {
              ReplacementOutcome::ToleratedAbsent
            },
            content: None,
            found: Some(found),
          },
        })
      }
    }
  }

  /// Read the task's file under `root`, decide, and write back on `Replaced`
  pub fn apply(&self, root: &Path, task: &ReplacementTask) -> LockstepResult<Evaluation> {
    let path = root.join(&task.path);
    let content = fs::read_to_string(&path).map_err(|e| LockstepError::io(&task.path, e))?;

    let evaluation = self.evaluate(task, &content)?;
    if let Some(new_content) = &evaluation.content {
      fs::write(&path, new_content).map_err(|e| LockstepError::io(&task.path, e))?;
    }
    Ok(evaluation)
  }
}

/// Substring substitution with the outcome rules of a literal run
fn evaluate_literal(content: &str, old_literal: &str, new_literal: &str) -> Evaluation {
  let candidate = content.replace(old_literal, new_literal);
  if candidate != content {
    return Evaluation {
      outcome: ReplacementOutcome::Replaced,
      content: Some(candidate),
      found: None,
    };
  }

  if content.contains(new_literal) {
    Evaluation::unchanged(ReplacementOutcome::AlreadyCurrent)
  } else if !content.contains(old_literal) {
    Evaluation::unchanged(ReplacementOutcome::ToleratedAbsent)
  } else {
    // Unreachable: an old fragment that is present always changes the text
    Evaluation::unchanged(ReplacementOutcome::FatalMismatch)
  }
}
