//! CLI commands for cargo-lockstep
//!
//! - **bump**: propagate OLD → NEW across every manifest of the roster
//! - **plan**: show the expanded task list without touching any manifest
//! - **check**: verify the manifests already carry a version
//! - **init**: scaffold lockstep.toml from the Cargo workspace and npm packages
//!
//! All commands but `init` resolve the repository through [`RepoLocation`].

pub mod bump;
pub mod check;
pub mod init;
pub mod plan;

pub use bump::{BumpOptions, run_bump};
pub use check::run_check;
pub use init::run_init;
pub use plan::run_plan;

use crate::core::config::LockstepConfig;
use crate::core::error::LockstepResult;
use std::env;
use std::path::{Path, PathBuf};

/// Repository root and roster file given on the command line
pub struct RepoLocation {
  root: Option<PathBuf>,
  config: Option<PathBuf>,
}

impl RepoLocation {
  pub fn new(root: Option<PathBuf>, config: Option<PathBuf>) -> Self {
    Self { root, config }
  }

  /// Resolve the root (current directory by default) and load the roster
  pub fn load(self) -> LockstepResult<(PathBuf, LockstepConfig)> {
    let root = resolve_root(self.root)?;
    let config = match self.config {
      Some(path) => LockstepConfig::load_from(&root.join(path))?,
      None => LockstepConfig::load(&root)?,
    };
    tracing::debug!(root = %root.display(), manifests = config.manifests.len(), "loaded roster");
    Ok((root, config))
  }
}

pub(crate) fn resolve_root(root: Option<PathBuf>) -> LockstepResult<PathBuf> {
  match root {
    Some(root) => Ok(root),
    None => Ok(env::current_dir()?),
  }
}

/// Path shown to the user, relative to `root` when possible
pub(crate) fn display_path(root: &Path, path: &Path) -> String {
  path.strip_prefix(root).unwrap_or(path).display().to_string()
}
