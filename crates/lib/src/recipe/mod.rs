//! Package recipes.
//!
//! A recipe carries the static package metadata together with the policy
//! tables the orchestrator evaluates: ABI pins, dependency rules, the
//! coverage gate and post-install hooks. It is built once, either from
//! [`Recipe::encryption_lib`] or from a Lua file via [`load_recipe`], and
//! never mutated afterwards.

pub mod builtin;
pub mod lua;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buildsys::BuildDefinitions;
use crate::options::AbiPin;
use crate::requires::RequirementRule;
use crate::settings::{Condition, Settings};

pub use lua::{RecipeError, load_recipe, parse_recipe};

/// When `forge create` runs the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPolicy {
  /// Build only if no package exists for the package id.
  #[default]
  Missing,
  /// Always rebuild.
  Always,
  /// Never build; a missing package is an error.
  Never,
}

impl fmt::Display for BuildPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Missing => "missing",
      Self::Always => "always",
      Self::Never => "never",
    })
  }
}

impl FromStr for BuildPolicy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "missing" => Ok(Self::Missing),
      "always" => Ok(Self::Always),
      "never" => Ok(Self::Never),
      other => Err(format!("unknown build policy '{}'", other)),
    }
  }
}

/// Files produced for the build system before configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generator {
  Cmake,
}

impl FromStr for Generator {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "cmake" => Ok(Self::Cmake),
      other => Err(format!("unknown generator '{}'", other)),
    }
  }
}

/// Where the sources come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScmSpec {
  /// Only `git` is understood.
  pub kind: String,
  /// Repository URL, or `auto` to capture it from the working copy.
  pub url: String,
  /// Commit, or `auto` to capture `HEAD`.
  pub revision: String,
  /// Directory under the source folder the tree is placed in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subfolder: Option<String>,
}

/// Fails the run when measured coverage drops below `min_coverage`.
///
/// The measurement and the comparison happen inside the project's own
/// `target`; the orchestrator only switches it on and runs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGate {
  pub when: Condition,
  pub min_coverage: u32,
  pub target: String,
}

impl CoverageGate {
  /// Definition that switches instrumentation on.
  pub const FLAG: &'static str = "CODE_COVERAGE";
  /// Definition carrying the percentage threshold.
  pub const THRESHOLD: &'static str = "MIN_COVERAGE";

  pub fn enabled(&self, settings: &Settings) -> bool {
    self.when.matches(settings)
  }
}

/// An extra build target run after install when `when` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDef {
  pub name: String,
  #[serde(default)]
  pub when: Condition,
  pub target: String,
}

/// What consumers link against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
  pub libs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
  pub name: String,
  pub version: String,
  pub license: String,
  pub description: String,
  pub url: String,
  pub scm: Option<ScmSpec>,
  pub exports_sources: Vec<String>,
  pub build_policy: BuildPolicy,
  pub generators: Vec<Generator>,
  pub parallel: bool,
  pub abi_pins: Vec<AbiPin>,
  pub requires: Vec<RequirementRule>,
  pub definitions: BuildDefinitions,
  pub coverage: Option<CoverageGate>,
  pub hooks: Vec<HookDef>,
  pub libs: Vec<String>,
}

impl Recipe {
  /// An otherwise empty recipe: everything exported, `missing` policy.
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      license: String::new(),
      description: String::new(),
      url: String::new(),
      scm: None,
      exports_sources: vec!["*".to_string()],
      build_policy: BuildPolicy::default(),
      generators: Vec::new(),
      parallel: false,
      abi_pins: Vec::new(),
      requires: Vec::new(),
      definitions: BuildDefinitions::new(),
      coverage: None,
      hooks: Vec::new(),
      libs: Vec::new(),
    }
  }

  /// `name/version`
  pub fn reference(&self) -> String {
    format!("{}/{}", self.name, self.version)
  }

  /// Libraries exposed to consumers. Independent of the platform.
  pub fn package_info(&self) -> PackageInfo {
    PackageInfo {
      libs: self.libs.clone(),
    }
  }

  pub fn coverage_enabled(&self, settings: &Settings) -> bool {
    self.coverage.as_ref().is_some_and(|gate| gate.enabled(settings))
  }

  /// Subfolder the sources are placed in, if any.
  pub fn source_subfolder(&self) -> Option<&str> {
    self.scm.as_ref().and_then(|scm| scm.subfolder.as_deref())
  }
}
