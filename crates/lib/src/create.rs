//! `forge create`: export, identify, and build one package into the store.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::buildsys::{BuildSystem, CMake};
use crate::options::configure_options;
use crate::package::{ExportError, PackageIdInputs, PackageLayout, PackageManifest, export_sources};
use crate::pipeline::{BuildContext, BuildError, PipelineReport, run_build};
use crate::platform::paths::{deps_dir, packages_dir, store_dir};
use crate::recipe::{BuildPolicy, Recipe};
use crate::requires::{StoreResolver, active_requirements};
use crate::scm::resolve_scm;
use crate::settings::{BuildType, Settings};
use crate::util::hash::{Hashable, PackageId, TreeHashError, hash_directory};

#[derive(Debug, Error)]
pub enum CreateError {
  #[error("export failed")]
  Export(#[from] ExportError),

  #[error("failed to hash exported sources")]
  SourceHash(#[from] TreeHashError),

  #[error("failed to compute package id")]
  PackageId(#[from] serde_json::Error),

  #[error("no binary for {reference} with package id {package_id} and build policy 'never'")]
  NoBinary { reference: String, package_id: PackageId },

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("failed to {action} '{}'", path.display())]
  Store {
    action: &'static str,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl CreateError {
  fn store<'a>(action: &'static str, path: &'a Path) -> impl FnOnce(std::io::Error) -> Self + 'a {
    move |source| Self::Store {
      action,
      path: path.to_path_buf(),
      source,
    }
  }
}

#[derive(Debug, Clone)]
pub struct CreateOptions {
  /// Directory holding the sources to export.
  pub source_dir: PathBuf,
  /// Overrides the recipe's build policy when set.
  pub policy: Option<BuildPolicy>,
  /// Store root; packages go under `packages/`, dependencies come from `deps/`.
  pub store_dir: PathBuf,
}

impl CreateOptions {
  pub fn new(source_dir: impl Into<PathBuf>) -> Self {
    Self {
      source_dir: source_dir.into(),
      policy: None,
      store_dir: store_dir(),
    }
  }

  pub fn with_policy(mut self, policy: Option<BuildPolicy>) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_store(mut self, store_dir: impl Into<PathBuf>) -> Self {
    self.store_dir = store_dir.into();
    self
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CreateStatus {
  /// The pipeline ran.
  Built { report: PipelineReport },
  /// An existing binary satisfied the build policy.
  Cached,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
  pub package_id: PackageId,
  pub package_dir: PathBuf,
  pub manifest: PackageManifest,
  #[serde(flatten)]
  pub status: CreateStatus,
}

/// Build with CMake, honouring `FORGE_CMAKE`/`FORGE_CTEST`.
pub async fn create_package(recipe: &Recipe, settings: &Settings, options: &CreateOptions) -> Result<CreateOutcome, CreateError> {
  create_package_with(recipe, settings, options, |build_dir, build_type, parallel| {
    CMake::new(build_dir, build_type).parallel(parallel)
  })
  .await
}

/// As [`create_package`], with the build system made by `make_build_system`
/// from the build folder, build type and the recipe's parallel flag.
pub async fn create_package_with<B, F>(
  recipe: &Recipe,
  settings: &Settings,
  options: &CreateOptions,
  make_build_system: F,
) -> Result<CreateOutcome, CreateError>
where
  B: BuildSystem,
  F: FnOnce(PathBuf, BuildType, bool) -> B,
{
  let mut settings = settings.clone();
  configure_options(&mut settings, &recipe.abi_pins);

  let layout = PackageLayout::new(&packages_dir(&options.store_dir), &recipe.name, &recipe.version);
  let source_root = layout.source_root(recipe.source_subfolder());
  export_sources(&options.source_dir, &source_root, &recipe.exports_sources)?;
  let sources_hash = hash_directory(&source_root)?;

  let requires = active_requirements(&settings, &recipe.requires);
  let package_id = PackageIdInputs {
    name: &recipe.name,
    version: &recipe.version,
    settings: &settings,
    requires: &requires,
    sources_hash: &sources_hash,
  }
  .compute_id()?;

  let package_dir = layout.package_dir(&package_id);
  let manifest_path = layout.manifest_path(&package_id);
  let policy = options.policy.unwrap_or(recipe.build_policy);
  info!(package = %recipe.reference(), id = %package_id, policy = %policy, settings = %settings, "creating package");

  let has_binary = layout.has_binary(&package_id);
  match policy {
    BuildPolicy::Missing | BuildPolicy::Never if has_binary => {
      info!(id = %package_id, "binary already in store");
      let manifest = PackageManifest::read(&manifest_path).map_err(CreateError::store("read", &manifest_path))?;
      return Ok(CreateOutcome {
        package_id,
        package_dir,
        manifest,
        status: CreateStatus::Cached,
      });
    }
    BuildPolicy::Never => {
      return Err(CreateError::NoBinary {
        reference: recipe.reference(),
        package_id,
      });
    }
    BuildPolicy::Missing | BuildPolicy::Always => {}
  }

  let scm = recipe.scm.as_ref().map(|spec| resolve_scm(spec, &options.source_dir));

  if package_dir.exists() {
    warn!(path = %package_dir.display(), "removing stale package folder");
    std::fs::remove_dir_all(&package_dir).map_err(CreateError::store("remove", &package_dir))?;
  }
  let build_dir = layout.build_dir(&package_id);
  let mut build_system = make_build_system(build_dir, settings.build_type, recipe.parallel);
  let resolver = StoreResolver::new(deps_dir(&options.store_dir));

  let ctx = BuildContext {
    recipe,
    settings: &settings,
    source_root: &source_root,
    install_prefix: &package_dir,
  };
  let report = run_build(&ctx, &resolver, &mut build_system).await?;

  let manifest = PackageManifest::new(recipe, package_id.clone(), &settings, &requires, scm, sources_hash);
  manifest
    .write(&manifest_path)
    .map_err(CreateError::store("write", &manifest_path))?;
  info!(path = %manifest_path.display(), "package complete");

  Ok(CreateOutcome {
    package_id,
    package_dir,
    manifest,
    status: CreateStatus::Built { report },
  })
}
