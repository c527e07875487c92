use crate::core::error::LockstepResult;
use cargo_metadata::MetadataCommand;
use std::path::{Path, PathBuf};

/// A workspace member as `init` needs it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
  pub name: String,
  /// Manifest path relative to the workspace root
  pub manifest: PathBuf,
}

/// Workspace introspection using cargo_metadata
pub struct WorkspaceMetadata {
  metadata: cargo_metadata::Metadata,
}

impl WorkspaceMetadata {
  pub fn load(workspace_root: &Path) -> LockstepResult<Self> {
    let metadata = MetadataCommand::new()
      .manifest_path(workspace_root.join("Cargo.toml"))
      .no_deps()
      .exec()?;
    Ok(Self { metadata })
  }

  /// Workspace members, sorted by manifest path
  pub fn members(&self) -> Vec<Member> {
    let root = self.metadata.workspace_root.as_std_path();
    let mut members: Vec<Member> = self
      .metadata
      .workspace_packages()
      .into_iter()
      .map(|pkg| {
        let manifest = pkg.manifest_path.as_std_path();
        Member {
          name: pkg.name.to_string(),
          manifest: manifest.strip_prefix(root).unwrap_or(manifest).to_path_buf(),
        }
      })
      .collect();
    members.sort_by(|a, b| a.manifest.cmp(&b.manifest));
    members
  }
}
