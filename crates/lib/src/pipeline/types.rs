//! Stages, errors and results of a pipeline run.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::buildsys::{BuildDefinitions, CommandError, CommandOutput};
use crate::requires::{ResolveError, ResolvedDependency};

/// A step of the pipeline that can fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  Dependencies,
  Configure,
  Build,
  Test,
  Install,
  PostInstall(String),
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Dependencies => f.write_str("dependencies"),
      Self::Configure => f.write_str("configure"),
      Self::Build => f.write_str("build"),
      Self::Test => f.write_str("test"),
      Self::Install => f.write_str("install"),
      Self::PostInstall(name) => write!(f, "post-install:{}", name),
    }
  }
}

/// Where a run is. Transitions only move forward, one stage at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  Init,
  DependenciesResolved,
  Configured,
  Built,
  Tested,
  Installed,
  CoverageChecked,
  Done,
  Failed(Step),
}

impl Stage {
  /// The only stage that may follow this one on success.
  pub fn next(&self) -> Option<Stage> {
    match self {
      Self::Init => Some(Self::DependenciesResolved),
      Self::DependenciesResolved => Some(Self::Configured),
      Self::Configured => Some(Self::Built),
      Self::Built => Some(Self::Tested),
      Self::Tested => Some(Self::Installed),
      Self::Installed => Some(Self::CoverageChecked),
      Self::CoverageChecked => Some(Self::Done),
      Self::Done | Self::Failed(_) => None,
    }
  }

  pub fn is_terminal(&self) -> bool {
    matches!(self, Self::Done | Self::Failed(_))
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Init => f.write_str("init"),
      Self::DependenciesResolved => f.write_str("dependencies-resolved"),
      Self::Configured => f.write_str("configured"),
      Self::Built => f.write_str("built"),
      Self::Tested => f.write_str("tested"),
      Self::Installed => f.write_str("installed"),
      Self::CoverageChecked => f.write_str("coverage-checked"),
      Self::Done => f.write_str("done"),
      Self::Failed(step) => write!(f, "failed({})", step),
    }
  }
}

/// Terminal failure of a run. Every variant maps to the step it came from.
#[derive(Debug, Error)]
pub enum BuildError {
  #[error("dependency resolution failed")]
  DependencyResolution(#[from] ResolveError),

  #[error("source root '{}' does not contain {project_file}", path.display())]
  InvalidSourceRoot { path: PathBuf, project_file: &'static str },

  #[error("configure failed")]
  Configuration(#[source] CommandError),

  #[error("compilation failed")]
  Compilation(#[source] CommandError),

  #[error("tests failed")]
  TestFailure(#[source] CommandError),

  #[error("install failed")]
  Installation(#[source] CommandError),

  #[error("coverage below {min_coverage}% ('{target}' failed)")]
  CoverageGate {
    target: String,
    min_coverage: u32,
    #[source]
    source: CommandError,
  },

  #[error("post-install hook '{name}' failed")]
  Hook {
    name: String,
    #[source]
    source: CommandError,
  },
}

impl BuildError {
  pub fn step(&self) -> Step {
    match self {
      Self::DependencyResolution(_) => Step::Dependencies,
      Self::InvalidSourceRoot { .. } | Self::Configuration(_) => Step::Configure,
      Self::Compilation(_) => Step::Build,
      Self::TestFailure(_) => Step::Test,
      Self::Installation(_) => Step::Install,
      Self::CoverageGate { target, .. } => Step::PostInstall(target.clone()),
      Self::Hook { name, .. } => Step::PostInstall(name.clone()),
    }
  }

  pub fn stage(&self) -> Stage {
    Stage::Failed(self.step())
  }

  /// Native output of the failing tool (compiler errors, test report,
  /// coverage shortfall), unmodified.
  pub fn diagnostics(&self) -> Option<&CommandOutput> {
    match self {
      Self::Configuration(e) | Self::Compilation(e) | Self::TestFailure(e) | Self::Installation(e) => e.output(),
      Self::CoverageGate { source, .. } | Self::Hook { source, .. } => source.output(),
      Self::DependencyResolution(_) | Self::InvalidSourceRoot { .. } => None,
    }
  }
}

/// Time spent reaching a stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
  pub stage: Stage,
  pub elapsed: Duration,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
  pub stages: Vec<StageRecord>,
  pub dependencies: Vec<ResolvedDependency>,
  pub definitions: BuildDefinitions,
  pub hooks_run: Vec<String>,
  pub hooks_skipped: Vec<String>,
}

impl PipelineReport {
  pub fn final_stage(&self) -> Option<&Stage> {
    self.stages.last().map(|r| &r.stage)
  }

  pub fn total_elapsed(&self) -> Duration {
    self.stages.iter().map(|r| r.elapsed).sum()
  }
}
