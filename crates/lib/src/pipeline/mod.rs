//! The build pipeline.
//!
//! [`run_build`] walks one package through a strict sequence:
//!
//! ```text
//! Init -> DependenciesResolved -> Configured -> Built -> Tested
//!      -> Installed -> CoverageChecked -> Done
//! ```
//!
//! Every step is gated on the previous one. The first failure ends the run
//! with a [`BuildError`] naming the step; nothing after it is attempted.

pub mod generators;
pub mod hooks;
pub mod types;

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::buildsys::{BuildDefinitions, BuildSystem, CommandError, TestOutput};
use crate::recipe::{CoverageGate, Generator, Recipe};
use crate::requires::{DependencyResolver, ResolvedDependency, resolve_dependencies};
use crate::settings::Settings;

pub use generators::{root_variable, write_cmake_buildinfo};
pub use hooks::{HookKind, PostInstallHook, post_install_hooks};
pub use types::{BuildError, PipelineReport, Stage, StageRecord, Step};

/// Everything a run needs besides the resolver and the build system.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
  pub recipe: &'a Recipe,
  /// Settings after `configure_options`.
  pub settings: &'a Settings,
  /// Directory containing the project file.
  pub source_root: &'a Path,
  pub install_prefix: &'a Path,
}

/// The definition set handed to configure.
///
/// Static recipe definitions come first so the computed entries win on a
/// clash.
pub fn compute_definitions(
  recipe: &Recipe,
  settings: &Settings,
  dependencies: &[ResolvedDependency],
  install_prefix: &Path,
) -> BuildDefinitions {
  let mut definitions = recipe.definitions.clone();

  if let Some(gate) = &recipe.coverage {
    definitions.set(CoverageGate::FLAG, gate.enabled(settings));
    definitions.set(CoverageGate::THRESHOLD, gate.min_coverage);
  }

  definitions.set("CMAKE_BUILD_TYPE", settings.build_type.as_str());
  definitions.set("CMAKE_INSTALL_PREFIX", generators::cmake_path(install_prefix));

  if !dependencies.is_empty() {
    let prefixes: Vec<_> = dependencies.iter().map(|d| generators::cmake_path(&d.root)).collect();
    definitions.set("CMAKE_PREFIX_PATH", prefixes.join(";"));
    for dependency in dependencies {
      definitions.set(
        root_variable(&dependency.requirement.name),
        generators::cmake_path(&dependency.root),
      );
    }
  }

  definitions
}

/// Records stage transitions and how long each took.
struct Tracker {
  stage: Stage,
  since: Instant,
  records: Vec<StageRecord>,
}

impl Tracker {
  fn new() -> Self {
    Self {
      stage: Stage::Init,
      since: Instant::now(),
      records: Vec::new(),
    }
  }

  fn advance(&mut self) {
    let Some(next) = self.stage.next() else {
      return;
    };
    let elapsed = self.since.elapsed();
    info!(stage = %next, elapsed = ?elapsed, "stage reached");
    self.records.push(StageRecord {
      stage: next.clone(),
      elapsed,
    });
    self.stage = next;
    self.since = Instant::now();
  }
}

/// Run the whole pipeline for one package.
pub async fn run_build<B, R>(
  ctx: &BuildContext<'_>,
  resolver: &R,
  build_system: &mut B,
) -> Result<PipelineReport, BuildError>
where
  B: BuildSystem,
  R: DependencyResolver,
{
  let mut tracker = Tracker::new();
  info!(
    package = %ctx.recipe.reference(),
    settings = %ctx.settings,
    tool = build_system.name(),
    "starting build"
  );

  let dependencies = resolve_dependencies(ctx.settings, &ctx.recipe.requires, resolver)?;
  tracker.advance();

  let project_file = build_system.project_file();
  if !ctx.source_root.join(project_file).is_file() {
    return Err(BuildError::InvalidSourceRoot {
      path: ctx.source_root.to_path_buf(),
      project_file,
    });
  }

  let mut definitions = compute_definitions(ctx.recipe, ctx.settings, &dependencies, ctx.install_prefix);
  for generator in &ctx.recipe.generators {
    match generator {
      Generator::Cmake => {
        let path = write_cmake_buildinfo(build_system.build_dir(), ctx.settings, &dependencies)
          .await
          .map_err(|e| BuildError::Configuration(CommandError::Io(e)))?;
        definitions.set("CMAKE_PROJECT_INCLUDE", generators::cmake_path(&path));
      }
    }
  }
  debug!(definitions = ?definitions, "computed definitions");

  build_system
    .configure(ctx.source_root, &definitions)
    .await
    .map_err(BuildError::Configuration)?;
  tracker.advance();

  build_system.build().await.map_err(BuildError::Compilation)?;
  tracker.advance();

  build_system
    .test(TestOutput::OnFailure)
    .await
    .map_err(BuildError::TestFailure)?;
  tracker.advance();

  build_system.install().await.map_err(BuildError::Installation)?;
  tracker.advance();

  let mut hooks_run = Vec::new();
  let mut hooks_skipped = Vec::new();
  for hook in post_install_hooks(ctx.recipe, ctx.settings, &definitions) {
    if !hook.enabled {
      debug!(hook = %hook.name, "hook disabled for these settings");
      hooks_skipped.push(hook.name);
      continue;
    }
    info!(hook = %hook.name, target = %hook.target, "running post-install hook");
    build_system
      .build_target(&hook.target)
      .await
      .map_err(|source| hook.failure(source))?;
    hooks_run.push(hook.name);
  }
  tracker.advance();

  tracker.advance();
  info!(package = %ctx.recipe.reference(), "build finished");

  Ok(PipelineReport {
    stages: tracker.records,
    dependencies,
    definitions,
    hooks_run,
    hooks_skipped,
  })
}
