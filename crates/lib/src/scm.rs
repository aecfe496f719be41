//! Source-control capture.
//!
//! `auto` scm fields are filled in from the git working copy the sources are
//! exported from: the fetch URL of the default remote and the `HEAD` commit.

use std::path::{Path, PathBuf};

use gix::remote::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::SCM_AUTO;
use crate::recipe::ScmSpec;

#[derive(Debug, Error)]
pub enum ScmError {
  #[error("no git repository at or above '{}': {message}", path.display())]
  NotARepository { path: PathBuf, message: String },

  #[error("failed to resolve HEAD: {0}")]
  Head(String),

  #[error("repository has no remote to take the url from")]
  NoRemote,

  #[error("failed to read remote: {0}")]
  Remote(String),
}

/// Concrete scm coordinates recorded in the package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScm {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub revision: Option<String>,
}

/// Replace `auto` fields with values from the repository containing
/// `source_dir`.
///
/// A source directory outside any repository leaves `auto` fields unresolved
/// and logs a warning; explicit values are always kept.
pub fn resolve_scm(spec: &ScmSpec, source_dir: &Path) -> ResolvedScm {
  let explicit = |value: &str| (value != SCM_AUTO).then(|| value.to_string());
  let mut resolved = ResolvedScm {
    url: explicit(&spec.url),
    revision: explicit(&spec.revision),
  };

  if resolved.url.is_some() && resolved.revision.is_some() {
    return resolved;
  }

  let repo = match gix::discover(source_dir) {
    Ok(repo) => repo,
    Err(e) => {
      let err = ScmError::NotARepository {
        path: source_dir.to_path_buf(),
        message: e.to_string(),
      };
      warn!(error = %err, "scm fields left unresolved");
      return resolved;
    }
  };

  if resolved.revision.is_none() {
    match head_revision(&repo) {
      Ok(rev) => resolved.revision = Some(rev),
      Err(e) => warn!(error = %e, "could not capture scm revision"),
    }
  }
  if resolved.url.is_none() {
    match remote_url(&repo) {
      Ok(url) => resolved.url = Some(url),
      Err(e) => warn!(error = %e, "could not capture scm url"),
    }
  }

  debug!(url = ?resolved.url, revision = ?resolved.revision, "captured scm");
  resolved
}

fn head_revision(repo: &gix::Repository) -> Result<String, ScmError> {
  let id = repo.head_id().map_err(|e| ScmError::Head(e.to_string()))?;
  Ok(id.to_string())
}

fn remote_url(repo: &gix::Repository) -> Result<String, ScmError> {
  let remote = repo
    .find_default_remote(Direction::Fetch)
    .ok_or(ScmError::NoRemote)?
    .map_err(|e| ScmError::Remote(e.to_string()))?;
  let url = remote.url(Direction::Fetch).ok_or(ScmError::NoRemote)?;
  Ok(url.to_bstring().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn spec(url: &str, revision: &str) -> ScmSpec {
    ScmSpec {
      kind: "git".to_string(),
      url: url.to_string(),
      revision: revision.to_string(),
      subfolder: None,
    }
  }

  #[test]
  fn explicit_values_pass_through() {
    let temp = TempDir::new().unwrap();
    let resolved = resolve_scm(&spec("https://example.com/lib.git", "abc123"), temp.path());
    assert_eq!(resolved.url.as_deref(), Some("https://example.com/lib.git"));
    assert_eq!(resolved.revision.as_deref(), Some("abc123"));
  }

  #[test]
  fn explicit_revision_survives_missing_repository() {
    let temp = TempDir::new().unwrap();
    let resolved = resolve_scm(&spec(SCM_AUTO, "v1.0"), temp.path());
    assert_eq!(resolved.revision.as_deref(), Some("v1.0"));
  }
}
