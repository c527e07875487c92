//! Error types for cargo-lockstep with contextual messages and exit codes
//!
//! Every fatal condition of a propagation run maps onto one variant here:
//! a malformed version string, a missing or invalid roster, an unreadable or
//! unwritable manifest, or a fatal mismatch between a manifest and the
//! versions being propagated.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cargo-lockstep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad version string, config, invalid args)
  User = 1,
  /// System error (manifest I/O)
  System = 2,
  /// Validation failure (a manifest disagrees with the propagated versions)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cargo-lockstep
#[derive(Debug)]
pub enum LockstepError {
  /// Version string shape errors (raised before any file is touched)
  Format(FormatError),

  /// Roster configuration errors
  Config(ConfigError),

  /// Manifest I/O errors, always tied to the offending file
  Io { path: PathBuf, source: io::Error },

  /// A task ended in `FatalMismatch`
  Mismatch(MismatchError),

  /// `check` found manifests that do not carry the expected version
  OutOfSync { version: String, paths: Vec<PathBuf> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl LockstepError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    LockstepError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    LockstepError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Wrap an I/O failure on a specific manifest
  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    LockstepError::Io {
      path: path.into(),
      source,
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      LockstepError::Message { message, context, help } => LockstepError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      LockstepError::Format(_) => ExitCode::User,
      LockstepError::Config(_) => ExitCode::User,
      LockstepError::Io { .. } => ExitCode::System,
      LockstepError::Mismatch(_) => ExitCode::Validation,
      LockstepError::OutOfSync { .. } => ExitCode::Validation,
      LockstepError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      LockstepError::Format(e) => e.help_message(),
      LockstepError::Config(e) => e.help_message(),
      LockstepError::Io { .. } => {
        Some("Check that every path listed in lockstep.toml exists relative to the repository root.".to_string())
      }
      LockstepError::Mismatch(e) => e.help_message(),
      LockstepError::OutOfSync { version, .. } => Some(format!(
        "Run `cargo lockstep bump <OLD> {}` to bring them in line, or fix the listed files by hand.",
        version
      )),
      LockstepError::Message { help, .. } => help.clone(),
    }
  }
}

impl fmt::Display for LockstepError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LockstepError::Format(e) => write!(f, "{}", e),
      LockstepError::Config(e) => write!(f, "{}", e),
      LockstepError::Io { path, source } => write!(f, "I/O error on {}: {}", path.display(), source),
      LockstepError::Mismatch(e) => write!(f, "{}", e),
      LockstepError::OutOfSync { version, paths } => {
        write!(f, "{} manifest(s) do not carry {}:", paths.len(), version)?;
        for path in paths {
          write!(f, "\n  {}", path.display())?;
        }
        Ok(())
      }
      LockstepError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for LockstepError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      LockstepError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<FormatError> for LockstepError {
  fn from(err: FormatError) -> Self {
    LockstepError::Format(err)
  }
}

impl From<ConfigError> for LockstepError {
  fn from(err: ConfigError) -> Self {
    LockstepError::Config(err)
  }
}

impl From<MismatchError> for LockstepError {
  fn from(err: MismatchError) -> Self {
    LockstepError::Mismatch(err)
  }
}

impl From<io::Error> for LockstepError {
  fn from(err: io::Error) -> Self {
    LockstepError::message(format!("I/O error: {}", err))
  }
}

impl From<String> for LockstepError {
  fn from(msg: String) -> Self {
    LockstepError::message(msg)
  }
}

impl From<&str> for LockstepError {
  fn from(msg: &str) -> Self {
    LockstepError::message(msg)
  }
}

impl From<toml_edit::TomlError> for LockstepError {
  fn from(err: toml_edit::TomlError) -> Self {
    LockstepError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for LockstepError {
  fn from(err: toml_edit::de::Error) -> Self {
    LockstepError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for LockstepError {
  fn from(err: toml_edit::ser::Error) -> Self {
    LockstepError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for LockstepError {
  fn from(err: serde_json::Error) -> Self {
    LockstepError::message(format!("JSON error: {}", err))
  }
}

impl From<cargo_metadata::Error> for LockstepError {
  fn from(err: cargo_metadata::Error) -> Self {
    LockstepError::message(format!("Cargo metadata error: {}", err))
  }
}

impl From<glob::PatternError> for LockstepError {
  fn from(err: glob::PatternError) -> Self {
    LockstepError::message(format!("Invalid glob pattern: {}", err))
  }
}

/// Version string shape errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
  /// Splitting on '.' did not yield exactly three components
  ComponentCount { value: String, found: usize },

  /// A component is empty or not numeric where it must be
  InvalidComponent { value: String, component: String },
}

impl FormatError {
  fn help_message(&self) -> Option<String> {
    Some("Versions must be in the form x.y.z (a pre-release suffix like 1.2.3-rc1 is allowed).".to_string())
  }
}

impl fmt::Display for FormatError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      FormatError::ComponentCount { value, found } => {
        write!(
          f,
          "Version string \"{}\" must be in the form x.y.z (found {} component(s))",
          value, found
        )
      }
      FormatError::InvalidComponent { value, component } => {
        write!(
          f,
          "Version string \"{}\" has an invalid component \"{}\"",
          value, component
        )
      }
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// lockstep.toml not found
  NotFound { workspace_root: PathBuf },

  /// Config file exists but is unusable
  Invalid { path: PathBuf, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => Some("Run `cargo lockstep init` to create a roster file.".to_string()),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { workspace_root } => {
        write!(
          f,
          "No cargo-lockstep configuration found.\nExpected file: {}/lockstep.toml",
          workspace_root.display()
        )
      }
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
    }
  }
}

/// A manifest that disagrees with the versions being propagated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MismatchError {
  pub path: PathBuf,
  pub old_literal: String,
  pub new_literal: String,
  /// What the manifest actually holds, when the structured editor found it
  pub found: Option<String>,
}

impl MismatchError {
  fn help_message(&self) -> Option<String> {
    match &self.found {
      Some(_) => Some(
        "The field holds neither the old nor the new version. Fix it by hand, pass the version it actually holds as OLD, or drop strict mode to leave it as is."
          .to_string(),
      ),
      None => None,
    }
  }
}

impl fmt::Display for MismatchError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "Failed to replace version in {} from `{}` to `{}`",
      self.path.display(),
      self.old_literal,
      self.new_literal
    )?;
    if let Some(found) = &self.found {
      write!(f, " (found `{}`)", found)?;
    }
    Ok(())
  }
}

/// Result type alias for cargo-lockstep
pub type LockstepResult<T> = Result<T, LockstepError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> LockstepResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> LockstepResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<LockstepError>,
{
  fn context(self, ctx: impl Into<String>) -> LockstepResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> LockstepResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &LockstepError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
