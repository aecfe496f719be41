//! Well-known directories.
//!
//! Every location can be redirected through an environment variable so that
//! tests and CI jobs can run against an isolated store.

use std::path::{Path, PathBuf};

use crate::consts::APP_NAME;

/// Returns the user's home directory
#[cfg(windows)]
pub fn home_dir() -> PathBuf {
  std::env::var("USERPROFILE")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the user's home directory
#[cfg(not(windows))]
pub fn home_dir() -> PathBuf {
  std::env::var("HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| PathBuf::from("."))
}

/// Returns the directory for data files for the application
#[cfg(windows)]
pub fn data_dir() -> PathBuf {
  std::env::var("APPDATA")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join("AppData").join("Roaming"))
    .join(APP_NAME)
}

/// Returns the directory for data files for the application
#[cfg(not(windows))]
pub fn data_dir() -> PathBuf {
  let data_home = std::env::var("XDG_DATA_HOME")
    .map(PathBuf::from)
    .unwrap_or_else(|_| home_dir().join(".local").join("share"));
  data_home.join(APP_NAME)
}

/// Root of the package store. `FORGE_STORE` takes precedence.
pub fn store_dir() -> PathBuf {
  if let Ok(path) = std::env::var("FORGE_STORE") {
    return PathBuf::from(path);
  }
  data_dir().join("store")
}

/// Where prebuilt dependency prefixes are looked up.
pub fn deps_dir(store: &Path) -> PathBuf {
  store.join("deps")
}

/// Where packages built by `forge create` are kept.
pub fn packages_dir(store: &Path) -> PathBuf {
  store.join("packages")
}

#[cfg(test)]
#[cfg(not(windows))]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn forge_store_takes_precedence() {
    temp_env::with_vars(
      [
        ("FORGE_STORE", Some("/custom/store")),
        ("XDG_DATA_HOME", Some("/data")),
      ],
      || {
        assert_eq!(store_dir(), PathBuf::from("/custom/store"));
        assert_eq!(deps_dir(&store_dir()), PathBuf::from("/custom/store/deps"));
        assert_eq!(packages_dir(&store_dir()), PathBuf::from("/custom/store/packages"));
      },
    );
  }

  #[test]
  #[serial]
  fn xdg_fallback_to_home_directories() {
    temp_env::with_vars(
      [
        ("FORGE_STORE", None::<&str>),
        ("XDG_DATA_HOME", None::<&str>),
        ("HOME", Some("/home/user")),
      ],
      || {
        assert_eq!(data_dir(), PathBuf::from("/home/user/.local/share").join(APP_NAME));
        assert_eq!(store_dir(), PathBuf::from("/home/user/.local/share/forge/store"));
      },
    );
  }
}
