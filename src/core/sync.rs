//! Propagation runs: validate, expand, execute
//!
//! A run validates both versions, expands the catalog into an ordered
//! [`SyncPlan`] and drives the [`PatternReplacer`] over it, stopping at the
//! first fatal outcome or I/O failure.
//!
//! Two commit modes:
//!
//! - **sequential**: each task reads and rewrites its file before the next
//!   one starts. A failure leaves earlier files already updated.
//! - **transactional**: every task is evaluated against staged in-memory
//!   contents first; files are written only when the whole plan is clean.
//!   New contents go to temporary siblings, which are then renamed over the
//!   manifests. A failed write leaves every manifest untouched; only a rename
//!   failing partway can leave part of the plan committed.
//!
//! Both modes, and dry runs, yield the same outcome sequence for the same
//! starting files.

use crate::core::catalog::{Catalog, PatternKind};
use crate::core::error::{LockstepError, LockstepResult, MismatchError};
use crate::core::plan::{PlanId, ReplacementTask, SyncPlan};
use crate::core::replace::{EditStrategy, Evaluation, PatternReplacer, ReplacementOutcome};
use crate::core::version::{VersionString, validate_pair};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// When manifest writes happen relative to evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
  /// Write each file as soon as its task is decided
  Sequential,
  /// Decide every task first, write only if none is fatal
  #[default]
  Transactional,
}

/// One executed task, as reported to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
  pub path: PathBuf,
  pub pattern: PatternKind,
  pub old_literal: String,
  pub new_literal: String,
  pub outcome: ReplacementOutcome,
  /// Value found in place of the expected one
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub found: Option<String>,
}

impl TaskRecord {
  fn new(task: &ReplacementTask, evaluation: &Evaluation) -> Self {
    Self {
      path: task.path.clone(),
      pattern: task.kind.clone(),
      old_literal: task.old_literal.clone(),
      new_literal: task.new_literal.clone(),
      outcome: evaluation.outcome,
      found: evaluation.found.clone(),
    }
  }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
  pub plan_id: PlanId,
  pub old_version: VersionString,
  pub new_version: VersionString,
  pub strategy: EditStrategy,
  pub commit: CommitMode,
  pub strict: bool,
  pub dry_run: bool,
  pub records: Vec<TaskRecord>,
  /// Files rewritten (or, on a dry run, files that would be)
  pub written: Vec<PathBuf>,
}

impl SyncReport {
  pub fn count(&self, outcome: ReplacementOutcome) -> usize {
    self.records.iter().filter(|r| r.outcome == outcome).count()
  }
}

/// Drives a catalog through the replacer
pub struct SyncOrchestrator<'a> {
  catalog: &'a Catalog,
  root: PathBuf,
  replacer: PatternReplacer,
  commit: CommitMode,
  dry_run: bool,
}

impl<'a> SyncOrchestrator<'a> {
  pub fn new(catalog: &'a Catalog, root: impl Into<PathBuf>) -> Self {
    Self {
      catalog,
      root: root.into(),
      replacer: PatternReplacer::new(EditStrategy::default()),
      commit: CommitMode::default(),
      dry_run: false,
    }
  }

  pub fn strategy(mut self, strategy: EditStrategy) -> Self {
    self.replacer = self.replacer.with_strategy(strategy);
    self
  }

  /// Stop on fields that carry a version other than old or new
  pub fn strict(mut self, strict: bool) -> Self {
    self.replacer = self.replacer.strict(strict);
    self
  }

  pub fn commit(mut self, commit: CommitMode) -> Self {
    self.commit = commit;
    self
  }

  /// Evaluate every task without writing anything
  pub fn dry_run(mut self, dry_run: bool) -> Self {
    self.dry_run = dry_run;
    self
  }

  /// Validate `old`/`new`, then propagate
  pub fn run(&self, old: &str, new: &str) -> LockstepResult<SyncReport> {
    let (old, new) = validate_pair(old, new)?;
    let plan = SyncPlan::new(self.catalog, &old, &new);
    self.execute(&plan)
  }

  /// Execute an already expanded plan
  pub fn execute(&self, plan: &SyncPlan) -> LockstepResult<SyncReport> {
    tracing::debug!(
      plan = %plan.id,
      tasks = plan.len(),
      strategy = ?self.replacer.strategy(),
      commit = ?self.commit,
      strict = self.replacer.is_strict(),
      dry_run = self.dry_run,
      "executing plan"
    );

    let (records, written) = match (self.dry_run, self.commit) {
      (true, _) => self.run_staged(plan, false)?,
      (false, CommitMode::Sequential) => self.run_sequential(plan)?,
      (false, CommitMode::Transactional) => self.run_staged(plan, true)?,
    };

    Ok(SyncReport {
      plan_id: plan.id.clone(),
      old_version: plan.old_version.clone(),
      new_version: plan.new_version.clone(),
      strategy: self.replacer.strategy(),
      commit: self.commit,
      strict: self.replacer.is_strict(),
      dry_run: self.dry_run,
      records,
      written,
    })
  }

  /// Evaluate every task with `version` as both old and new
  ///
  /// Nothing is written and a fatal outcome does not stop the survey: every
  /// task gets a record. I/O failures still abort.
  pub fn verify(&self, version: &str) -> LockstepResult<Vec<TaskRecord>> {
    let version = VersionString::parse(version)?;
    let plan = SyncPlan::new(self.catalog, &version, &version);

    let mut files: Vec<StagedFile> = Vec::new();
    let mut records = Vec::with_capacity(plan.len());
    for task in &plan.tasks {
      let file = stage(&mut files, &self.root, &task.path)?;
      let evaluation = self.replacer.evaluate(task, &file.current)?;
      tracing::debug!(path = %task.path.display(), pattern = %task.kind, outcome = %evaluation.outcome, "checked");
      records.push(TaskRecord::new(task, &evaluation));
    }

    Ok(records)
  }

  fn run_sequential(&self, plan: &SyncPlan) -> LockstepResult<(Vec<TaskRecord>, Vec<PathBuf>)> {
    let mut records = Vec::with_capacity(plan.len());
    let mut written: Vec<PathBuf> = Vec::new();

    for task in &plan.tasks {
      let evaluation = self.replacer.apply(&self.root, task)?;
      let record = settle(task, &evaluation)?;
      if evaluation.content.is_some() && !written.contains(&task.path) {
        written.push(task.path.clone());
      }
      records.push(record);
    }

    Ok((records, written))
  }

  fn run_staged(&self, plan: &SyncPlan, commit: bool) -> LockstepResult<(Vec<TaskRecord>, Vec<PathBuf>)> {
    let mut records = Vec::with_capacity(plan.len());
    let mut staged: Vec<StagedFile> = Vec::new();

    for task in &plan.tasks {
      let file = stage(&mut staged, &self.root, &task.path)?;
      let evaluation = self.replacer.evaluate(task, &file.current)?;
      records.push(settle(task, &evaluation)?);
      if let Some(content) = evaluation.content {
        file.current = content;
      }
    }

    let changed: Vec<&StagedFile> = staged.iter().filter(|s| s.current != s.original).collect();
    if commit {
      commit_files(&self.root, &changed)?;
    }

    Ok((records, changed.into_iter().map(|s| s.path.clone()).collect()))
  }
}

/// A manifest's content held in memory during a staged run
struct StagedFile {
  path: PathBuf,
  original: String,
  current: String,
}

impl StagedFile {
  fn read(root: &Path, path: &Path) -> LockstepResult<Self> {
    let original = fs::read_to_string(root.join(path)).map_err(|e| LockstepError::io(path, e))?;
    Ok(Self {
      path: path.to_path_buf(),
      current: original.clone(),
      original,
    })
  }
}

/// The staged copy of `path`, read on first use
fn stage<'f>(files: &'f mut Vec<StagedFile>, root: &Path, path: &Path) -> LockstepResult<&'f mut StagedFile> {
  let index = match files.iter().position(|f| f.path == path) {
    Some(index) => index,
    None => {
      files.push(StagedFile::read(root, path)?);
      files.len() - 1
    }
  };
  Ok(&mut files[index])
}

/// Write every staged file to a temporary sibling, then rename them all into place
fn commit_files(root: &Path, files: &[&StagedFile]) -> LockstepResult<()> {
  let mut pending: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
  for file in files {
    let target = root.join(&file.path);
    let temp = temp_sibling(&target);
    if let Err(e) = fs::write(&temp, &file.current) {
      pending.push((temp, target));
      discard(&pending);
      return Err(LockstepError::io(&file.path, e));
    }
    pending.push((temp, target));
  }

  for (index, (temp, target)) in pending.iter().enumerate() {
    if let Err(e) = fs::rename(temp, target) {
      discard(&pending[index..]);
      return Err(LockstepError::io(&files[index].path, e));
    }
    tracing::debug!(path = %files[index].path.display(), "committed");
  }
  Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
  let mut temp = path.as_os_str().to_owned();
  temp.push(".lockstep-tmp");
  PathBuf::from(temp)
}

/// Best-effort removal of temporaries that will not be renamed
fn discard(pending: &[(PathBuf, PathBuf)]) {
  for (temp, _) in pending {
    if temp.is_file() {
      let _ = fs::remove_file(temp);
    }
  }
}

/// Log the outcome; turn a fatal one into the run's error
fn settle(task: &ReplacementTask, evaluation: &Evaluation) -> LockstepResult<TaskRecord> {
  let path = task.path.display();
  match evaluation.outcome {
    ReplacementOutcome::Replaced => {
      tracing::info!(path = %path, pattern = %task.kind, "{} -> {}", task.old_literal, task.new_literal);
    }
    ReplacementOutcome::AlreadyCurrent => {
      tracing::info!(path = %path, pattern = %task.kind, "already set to {}", task.new_version);
    }
    ReplacementOutcome::ToleratedAbsent => match &evaluation.found {
      Some(found) => {
        tracing::warn!(path = %path, pattern = %task.kind, found = %found, "carries another version, left as is");
      }
      None => {
        tracing::info!(path = %path, pattern = %task.kind, "not found, did not set to {}", task.new_version);
      }
    },
    ReplacementOutcome::FatalMismatch => {
      tracing::error!(path = %path, pattern = %task.kind, found = ?evaluation.found, "fatal mismatch");
      return Err(
        MismatchError {
          path: task.path.clone(),
          old_literal: task.old_literal.clone(),
          new_literal: task.new_literal.clone(),
          found: evaluation.found.clone(),
        }
        .into(),
      );
    }
  }

  Ok(TaskRecord::new(task, evaluation))
}
