//! Conditional dependency requirements.
//!
//! A recipe declares a table of `RequirementRule`s. Evaluating the table
//! against a descriptor is pure; resolving the resulting requirements goes
//! through a [`DependencyResolver`].

pub mod store;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::settings::{Condition, Settings};

pub use store::StoreResolver;

/// Errors that can occur while resolving requirements.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("invalid requirement '{0}': expected name/version")]
  InvalidReference(String),

  #[error("package {requirement} not found (looked in {})", searched.display())]
  NotFound { requirement: Requirement, searched: PathBuf },

  #[error("failed to resolve {requirement}: {message}")]
  Failed { requirement: Requirement, message: String },
}

/// A `(name, version)` pair, written `name/version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Requirement {
  pub name: String,
  pub version: String,
}

impl Requirement {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
    }
  }
}

impl fmt::Display for Requirement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.name, self.version)
  }
}

impl FromStr for Requirement {
  type Err = ResolveError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().split_once('/') {
      Some((name, version)) if !name.is_empty() && !version.is_empty() && !version.contains('/') => {
        Ok(Self::new(name, version))
      }
      _ => Err(ResolveError::InvalidReference(s.to_string())),
    }
  }
}

impl TryFrom<String> for Requirement {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse().map_err(|e: ResolveError| e.to_string())
  }
}

impl From<Requirement> for String {
  fn from(requirement: Requirement) -> Self {
    requirement.to_string()
  }
}

/// Requirements that become active when `when` matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRule {
  #[serde(default)]
  pub when: Condition,
  pub requires: Vec<Requirement>,
}

impl RequirementRule {
  pub fn new(when: Condition, requires: Vec<Requirement>) -> Self {
    Self { when, requires }
  }
}

/// A requirement together with where its files live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependency {
  pub requirement: Requirement,
  pub root: PathBuf,
}

/// Locates the files of a required package.
pub trait DependencyResolver {
  fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError>;
}

impl<T: DependencyResolver + ?Sized> DependencyResolver for &T {
  fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError> {
    (**self).resolve(requirement)
  }
}

/// Evaluate the rule table: requirements of every matching rule, in
/// declaration order, without duplicates.
pub fn active_requirements(settings: &Settings, rules: &[RequirementRule]) -> Vec<Requirement> {
  let mut active: Vec<Requirement> = Vec::new();
  for rule in rules.iter().filter(|rule| rule.when.matches(settings)) {
    for requirement in &rule.requires {
      if !active.contains(requirement) {
        active.push(requirement.clone());
      }
    }
  }
  active
}

/// Resolve every active requirement. The first failure is returned as is.
pub fn resolve_dependencies(
  settings: &Settings,
  rules: &[RequirementRule],
  resolver: &impl DependencyResolver,
) -> Result<Vec<ResolvedDependency>, ResolveError> {
  let requirements = active_requirements(settings, rules);
  if requirements.is_empty() {
    debug!("no dependencies required");
    return Ok(Vec::new());
  }

  let mut resolved = Vec::with_capacity(requirements.len());
  for requirement in &requirements {
    let dependency = resolver.resolve(requirement)?;
    info!(requirement = %requirement, root = %dependency.root.display(), "resolved dependency");
    resolved.push(dependency);
  }
  Ok(resolved)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::RefCell;

  use crate::platform::arch::Arch;
  use crate::platform::os::Os;
  use crate::settings::BuildType;

  /// Records every lookup and resolves to a fake path.
  #[derive(Default)]
  struct RecordingResolver {
    seen: RefCell<Vec<Requirement>>,
    missing: Option<String>,
  }

  impl DependencyResolver for RecordingResolver {
    fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError> {
      self.seen.borrow_mut().push(requirement.clone());
      if self.missing.as_deref() == Some(requirement.name.as_str()) {
        return Err(ResolveError::NotFound {
          requirement: requirement.clone(),
          searched: PathBuf::from("/nowhere"),
        });
      }
      Ok(ResolvedDependency {
        requirement: requirement.clone(),
        root: PathBuf::from("/deps").join(&requirement.name),
      })
    }
  }

  fn windows_openssl() -> Vec<RequirementRule> {
    vec![RequirementRule::new(
      Condition::always().os(Os::Windows),
      vec![Requirement::new("openssl", "3.2.0")],
    )]
  }

  fn settings(os: Os) -> Settings {
    Settings::new(os, Arch::X86_64, BuildType::Release)
  }

  #[test]
  fn parses_references() {
    let req: Requirement = "openssl/3.2.0".parse().unwrap();
    assert_eq!(req, Requirement::new("openssl", "3.2.0"));
    assert_eq!(req.to_string(), "openssl/3.2.0");

    for bad in ["openssl", "/3.2.0", "openssl/", "a/b/c"] {
      assert!(bad.parse::<Requirement>().is_err(), "{}", bad);
    }
  }

  #[test]
  fn windows_requires_openssl() {
    let resolver = RecordingResolver::default();
    let resolved = resolve_dependencies(&settings(Os::Windows), &windows_openssl(), &resolver).unwrap();

    assert_eq!(resolved.len(), 1);
    assert_eq!(resolver.seen.borrow().as_slice(), &[Requirement::new("openssl", "3.2.0")]);
  }

  #[test]
  fn other_systems_register_nothing() {
    for os in [Os::Linux, Os::MacOs] {
      let resolver = RecordingResolver::default();
      let resolved = resolve_dependencies(&settings(os), &windows_openssl(), &resolver).unwrap();
      assert!(resolved.is_empty());
      assert!(resolver.seen.borrow().is_empty());
    }
  }

  #[test]
  fn duplicates_collapse_in_declaration_order() {
    let rules = vec![
      RequirementRule::new(
        Condition::always(),
        vec![Requirement::new("zlib", "1.3"), Requirement::new("openssl", "3.2.0")],
      ),
      RequirementRule::new(Condition::always().os(Os::Windows), vec![Requirement::new("openssl", "3.2.0")]),
    ];

    let active = active_requirements(&settings(Os::Windows), &rules);
    assert_eq!(
      active,
      vec![Requirement::new("zlib", "1.3"), Requirement::new("openssl", "3.2.0")]
    );
  }

  #[test]
  fn first_failure_stops_resolution() {
    let rules = vec![RequirementRule::new(
      Condition::always(),
      vec![Requirement::new("openssl", "3.2.0"), Requirement::new("zlib", "1.3")],
    )];
    let resolver = RecordingResolver {
      missing: Some("openssl".to_string()),
      ..Default::default()
    };

    let err = resolve_dependencies(&settings(Os::Linux), &rules, &resolver).unwrap_err();
    assert!(matches!(err, ResolveError::NotFound { .. }));
    assert_eq!(resolver.seen.borrow().len(), 1);
  }
}
