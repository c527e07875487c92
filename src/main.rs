mod cargo;
mod commands;
mod core;
mod manifest;

use clap::{Parser, Subcommand};
use core::error::{LockstepError, print_error};
use core::replace::EditStrategy;
use core::sync::CommitMode;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Keep every manifest of a multi-language repository on one version
#[derive(Parser)]
#[command(name = "cargo")]
#[command(bin_name = "cargo")]
#[command(styles = get_styles())]
enum CargoCli {
  Lockstep(LockstepCli),
}

#[derive(Parser)]
#[command(name = "lockstep")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct LockstepCli {
  #[command(subcommand)]
  command: Commands,
}

/// Where to find the repository and its roster
#[derive(clap::Args)]
struct RepoArgs {
  /// Repository root (default: current directory)
  #[arg(long)]
  root: Option<PathBuf>,
  /// Roster file (default: lockstep.toml search order under the root)
  #[arg(long)]
  config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Rewrite every manifest from OLD to NEW
  Bump {
    /// Version the manifests currently carry
    old: String,
    /// Version to propagate
    new: String,
    /// Evaluate every task without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Edit strategy (default: from lockstep.toml, else structured)
    #[arg(long, value_enum)]
    strategy: Option<EditStrategy>,
    /// Commit mode (default: from lockstep.toml, else transactional)
    #[arg(long, value_enum)]
    commit: Option<CommitMode>,
    /// Fail when a manifest carries a version other than OLD or NEW
    #[arg(long)]
    strict: bool,
    /// Output the report in JSON format
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    repo: RepoArgs,
  },

  /// Show the ordered task list for OLD → NEW without reading manifests
  Plan {
    old: String,
    new: String,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    repo: RepoArgs,
  },

  /// Verify every manifest already carries VERSION
  Check {
    #[arg(id = "check_version", value_name = "VERSION")]
    version: String,
    /// Edit strategy used to locate fields
    #[arg(long, value_enum)]
    strategy: Option<EditStrategy>,
    /// Treat fragments that are not found as errors
    #[arg(long)]
    strict: bool,
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
    #[command(flatten)]
    repo: RepoArgs,
  },

  /// Write a starter lockstep.toml for this repository
  Init {
    /// Package every npm manifest pins (e.g. @scope/core)
    #[arg(long)]
    core: Option<String>,
    /// Glob for package.json files (repeatable, default: packages/*/package.json)
    #[arg(long = "npm")]
    npm: Vec<String>,
    /// Overwrite an existing configuration
    #[arg(long)]
    force: bool,
    /// Repository root (default: current directory)
    #[arg(long)]
    root: Option<PathBuf>,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

/// Log to stderr, filtered by LOCKSTEP_LOG (default: info)
fn init_logging() {
  let default_level = "info";
  let _ = tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("LOCKSTEP_LOG")
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .compact()
    .try_init();
}

fn main() {
  let CargoCli::Lockstep(cli) = CargoCli::parse();
  init_logging();

  let result = match cli.command {
    Commands::Bump {
      old,
      new,
      dry_run,
      strategy,
      commit,
      strict,
      json,
      repo,
    } => commands::run_bump(
      commands::RepoLocation::new(repo.root, repo.config),
      &old,
      &new,
      commands::BumpOptions {
        dry_run,
        strategy,
        commit,
        strict,
        json,
      },
    ),
    Commands::Plan { old, new, json, repo } => {
      commands::run_plan(commands::RepoLocation::new(repo.root, repo.config), &old, &new, json)
    }
    Commands::Check {
      version,
      strategy,
      strict,
      json,
      repo,
    } => commands::run_check(
      commands::RepoLocation::new(repo.root, repo.config),
      &version,
      strategy,
      strict,
      json,
    ),
    Commands::Init { core, npm, force, root } => commands::run_init(root, core, npm, force),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: LockstepError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
