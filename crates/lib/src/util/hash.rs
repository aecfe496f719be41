//! Hashing for package ids and exported source trees.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

use crate::consts::PACKAGE_ID_LEN;

/// Identifies one binary of a package: a truncated SHA-256 of the inputs
/// that determine it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageId(pub String);

impl std::fmt::Display for PackageId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Anything whose JSON form identifies it.
pub trait Hashable: Serialize {
  fn compute_id(&self) -> Result<PackageId, serde_json::Error> {
    let serialized = serde_json::to_string(self)?;
    let full = hash_bytes(serialized.as_bytes());
    Ok(PackageId(full[..PACKAGE_ID_LEN].to_string()))
  }
}

#[derive(Debug, Error)]
pub enum TreeHashError {
  #[error("failed to walk {path}: {message}")]
  Walk { path: String, message: String },

  #[error("failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Deterministic hash of a directory tree's file contents and layout.
///
/// Timestamps and permissions are ignored; entries are visited in name order.
pub fn hash_directory(path: &Path) -> Result<String, TreeHashError> {
  let mut hasher = Sha256::new();

  for entry in WalkDir::new(path).sort_by_file_name() {
    let entry = entry.map_err(|e| TreeHashError::Walk {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    let rel = entry
      .path()
      .strip_prefix(path)
      .unwrap_or(entry.path())
      .to_string_lossy()
      .replace('\\', "/");
    if rel.is_empty() {
      continue;
    }

    let file_type = entry.file_type();
    let line = if file_type.is_file() {
      format!("F:{}:{}", rel, hash_file(entry.path())?)
    } else if file_type.is_dir() {
      format!("D:{}", rel)
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|source| TreeHashError::Read {
        path: entry.path().display().to_string(),
        source,
      })?;
      format!("L:{}:{}", rel, target.to_string_lossy())
    } else {
      continue;
    };

    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }

  Ok(format!("{:x}", hasher.finalize()))
}

/// Full SHA-256 of a file.
pub fn hash_file(path: &Path) -> Result<String, TreeHashError> {
  let read_err = |source| TreeHashError::Read {
    path: path.display().to_string(),
    source,
  };
  let mut file = fs::File::open(path).map_err(read_err)?;

  let mut hasher = Sha256::new();
  let mut buffer = [0u8; 8192];
  loop {
    let n = file.read(&mut buffer).map_err(read_err)?;
    if n == 0 {
      break;
    }
    hasher.update(&buffer[..n]);
  }

  Ok(format!("{:x}", hasher.finalize()))
}

/// Full SHA-256 of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  format!("{:x}", hasher.finalize())
}
