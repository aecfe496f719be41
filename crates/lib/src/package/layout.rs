//! Where a package's files live in the store.
//!
//! ```text
//! <store>/packages/<name>/<version>/
//!   source/              exported sources (optionally under a subfolder)
//!   build/<package-id>/  build tree of one binary
//!   package/<package-id>/  install prefix, with package.json once complete
//! ```

use std::path::{Path, PathBuf};

use crate::consts::PACKAGE_MANIFEST_FILE;
use crate::util::hash::PackageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
  root: PathBuf,
}

impl PackageLayout {
  pub fn new(packages_dir: &Path, name: &str, version: &str) -> Self {
    Self {
      root: packages_dir.join(name).join(version),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn source_dir(&self) -> PathBuf {
    self.root.join("source")
  }

  /// Directory the sources are exported to, and configure runs against.
  pub fn source_root(&self, subfolder: Option<&str>) -> PathBuf {
    match subfolder {
      Some(sub) => self.source_dir().join(sub),
      None => self.source_dir(),
    }
  }

  pub fn build_dir(&self, id: &PackageId) -> PathBuf {
    self.root.join("build").join(&id.0)
  }

  pub fn package_dir(&self, id: &PackageId) -> PathBuf {
    self.root.join("package").join(&id.0)
  }

  pub fn manifest_path(&self, id: &PackageId) -> PathBuf {
    self.package_dir(id).join(PACKAGE_MANIFEST_FILE)
  }

  /// A binary is complete once its manifest has been written.
  pub fn has_binary(&self, id: &PackageId) -> bool {
    self.manifest_path(id).is_file()
  }
}
