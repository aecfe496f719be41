//! Copying a source tree into the store.
//!
//! Patterns are globs matched against `/`-separated paths relative to the
//! source directory. A path is exported when it matches at least one include
//! pattern and no `!`-prefixed exclude pattern. `.git` is never exported.
//! Symlinks are recreated in the destination with their original target.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum ExportError {
  #[error("source directory '{}' does not exist", .0.display())]
  MissingSource(PathBuf),

  #[error("invalid export pattern '{pattern}': {message}")]
  Pattern { pattern: String, message: String },

  #[error("failed to walk '{}': {message}", path.display())]
  Walk { path: PathBuf, message: String },

  #[error("failed to copy '{}' to '{}'", from.display(), to.display())]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Compiled `exports_sources` patterns.
#[derive(Debug, Clone)]
pub struct ExportFilter {
  include: Vec<Pattern>,
  exclude: Vec<Pattern>,
}

impl ExportFilter {
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ExportError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    for raw in patterns {
      let raw = raw.as_ref();
      let (target, text) = match raw.strip_prefix('!') {
        Some(rest) => (&mut exclude, rest),
        None => (&mut include, raw),
      };
      let pattern = Pattern::new(text).map_err(|e| ExportError::Pattern {
        pattern: raw.to_string(),
        message: e.to_string(),
      })?;
      target.push(pattern);
    }
    Ok(Self { include, exclude })
  }

  /// `relative` must use `/` separators.
  pub fn accepts(&self, relative: &str) -> bool {
    self.include.iter().any(|p| p.matches(relative)) && !self.exclude.iter().any(|p| p.matches(relative))
  }
}

/// Summary of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
  pub files: usize,
  pub links: usize,
  pub skipped: usize,
}

fn relative_path(root: &Path, path: &Path) -> String {
  path
    .strip_prefix(root)
    .unwrap_or(path)
    .to_string_lossy()
    .replace('\\', "/")
}

#[cfg(unix)]
fn copy_link(from: &Path, to: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(windows)]
fn copy_link(from: &Path, to: &Path) -> std::io::Result<()> {
  let target = fs::read_link(from)?;
  if from.is_dir() {
    std::os::windows::fs::symlink_dir(target, to)
  } else {
    std::os::windows::fs::symlink_file(target, to)
  }
}

/// Replace `dest` with the accepted files of `source`.
pub fn export_sources<S: AsRef<str>>(source: &Path, dest: &Path, patterns: &[S]) -> Result<ExportReport, ExportError> {
  if !source.is_dir() {
    return Err(ExportError::MissingSource(source.to_path_buf()));
  }
  let filter = ExportFilter::new(patterns)?;

  if dest.exists() {
    debug!(dest = %dest.display(), "clearing previous export");
    fs::remove_dir_all(dest)?;
  }
  fs::create_dir_all(dest)?;

  let mut report = ExportReport::default();
  let walker = WalkDir::new(source)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.file_name() != ".git");

  for entry in walker {
    let entry = entry.map_err(|e| ExportError::Walk {
      path: source.to_path_buf(),
      message: e.to_string(),
    })?;
    let file_type = entry.file_type();
    if !file_type.is_file() && !file_type.is_symlink() {
      continue;
    }

    let relative = relative_path(source, entry.path());
    if !filter.accepts(&relative) {
      report.skipped += 1;
      continue;
    }

    let target = dest.join(&relative);
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent)?;
    }
    let copied = if file_type.is_symlink() {
      debug!(link = %relative, "recreating symlink");
      copy_link(entry.path(), &target)
    } else {
      fs::copy(entry.path(), &target).map(|_| ())
    };
    copied.map_err(|source| ExportError::Copy {
      from: entry.path().to_path_buf(),
      to: target.clone(),
      source,
    })?;

    if file_type.is_symlink() {
      report.links += 1;
    } else {
      report.files += 1;
    }
  }

  info!(
    source = %source.display(),
    dest = %dest.display(),
    files = report.files,
    links = report.links,
    skipped = report.skipped,
    "exported sources"
  );
  Ok(report)
}
