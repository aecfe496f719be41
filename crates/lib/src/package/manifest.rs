//! `package.json`: the record of one built binary.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::recipe::Recipe;
use crate::requires::Requirement;
use crate::scm::ResolvedScm;
use crate::settings::Settings;
use crate::util::hash::{Hashable, PackageId};

/// Everything that determines a binary. Its hash is the package id.
///
/// The exported source tree is part of it, so editing a source file yields
/// a new id and a fresh build under the `missing` policy.
#[derive(Debug, Clone, Serialize)]
pub struct PackageIdInputs<'a> {
  pub name: &'a str,
  pub version: &'a str,
  pub settings: &'a Settings,
  pub requires: &'a [Requirement],
  pub sources_hash: &'a str,
}

impl Hashable for PackageIdInputs<'_> {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
  pub name: String,
  pub version: String,
  pub package_id: PackageId,
  pub settings: Settings,
  pub requires: Vec<Requirement>,
  pub libs: Vec<String>,
  pub license: String,
  pub description: String,
  pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scm: Option<ResolvedScm>,
  pub sources_hash: String,
}

impl PackageManifest {
  pub fn new(
    recipe: &Recipe,
    package_id: PackageId,
    settings: &Settings,
    requires: &[Requirement],
    scm: Option<ResolvedScm>,
    sources_hash: String,
  ) -> Self {
    Self {
      name: recipe.name.clone(),
      version: recipe.version.clone(),
      package_id,
      settings: settings.clone(),
      requires: requires.to_vec(),
      libs: recipe.package_info().libs,
      license: recipe.license.clone(),
      description: recipe.description.clone(),
      url: recipe.url.clone(),
      scm,
      sources_hash,
    }
  }

  pub fn read(path: &Path) -> std::io::Result<Self> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(std::io::Error::other)
  }

  pub fn write(&self, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
    std::fs::write(path, content)
  }
}
