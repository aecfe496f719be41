//! Resolution of requirements against prebuilt prefixes in the store.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DependencyResolver, Requirement, ResolveError, ResolvedDependency};

/// Looks up `<root>/<name>/<version>` and accepts it when it is a directory.
#[derive(Debug, Clone)]
pub struct StoreResolver {
  root: PathBuf,
}

impl StoreResolver {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn package_dir(&self, requirement: &Requirement) -> PathBuf {
    self.root.join(&requirement.name).join(&requirement.version)
  }
}

impl DependencyResolver for StoreResolver {
  fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError> {
    let dir = self.package_dir(requirement);
    debug!(requirement = %requirement, path = %dir.display(), "looking up dependency");

    if !dir.is_dir() {
      return Err(ResolveError::NotFound {
        requirement: requirement.clone(),
        searched: dir,
      });
    }

    let root = dunce::canonicalize(&dir).map_err(|e| ResolveError::Failed {
      requirement: requirement.clone(),
      message: e.to_string(),
    })?;

    Ok(ResolvedDependency {
      requirement: requirement.clone(),
      root,
    })
  }
}
