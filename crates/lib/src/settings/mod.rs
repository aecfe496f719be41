//! The platform descriptor a package is built for.
//!
//! `Settings` is assembled once per invocation from the host defaults and
//! `key=value` overrides, adjusted by [`crate::options::configure_options`],
//! and then treated as immutable for the rest of the run.

pub mod build_type;
pub mod compiler;
pub mod condition;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Platform;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

pub use build_type::BuildType;
pub use compiler::{Compiler, CompilerKind, CompilerVersion, Libcxx};
pub use condition::Condition;

/// Errors raised while assembling a descriptor.
#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("host platform is not supported")]
  UnsupportedHost,

  #[error("setting '{0}' is not of the form key=value")]
  MalformedPair(String),

  #[error("unknown setting '{0}'")]
  UnknownKey(String),

  #[error("invalid value for '{key}': {message}")]
  InvalidValue { key: String, message: String },

  #[error("'{key}' requires a compiler to be set first")]
  MissingCompiler { key: String },
}

/// Operating system, architecture, build type and compiler of one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Settings {
  pub os: Os,
  pub arch: Arch,
  pub build_type: BuildType,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compiler: Option<Compiler>,
}

impl Settings {
  pub fn new(os: Os, arch: Arch, build_type: BuildType) -> Self {
    Self {
      os,
      arch,
      build_type,
      compiler: None,
    }
  }

  /// Host os and arch, `Release`, no compiler.
  pub fn detect() -> Result<Self, SettingsError> {
    let platform = Platform::host().ok_or(SettingsError::UnsupportedHost)?;
    Ok(Self::new(platform.os, platform.arch, BuildType::default()))
  }

  pub fn with_compiler(mut self, compiler: Compiler) -> Self {
    self.compiler = Some(compiler);
    self
  }

  pub fn compiler_kind(&self) -> Option<CompilerKind> {
    self.compiler.as_ref().map(|c| c.kind)
  }

  pub fn platform(&self) -> Platform {
    Platform::new(self.arch, self.os)
  }

  /// Set a single value by its dotted key.
  pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
    let invalid = |message: String| SettingsError::InvalidValue {
      key: key.to_string(),
      message,
    };

    match key {
      "os" => self.os = value.parse().map_err(invalid)?,
      "arch" => self.arch = value.parse().map_err(invalid)?,
      "build_type" => self.build_type = value.parse().map_err(invalid)?,
      "compiler" => {
        let kind: CompilerKind = value.parse().map_err(invalid)?;
        if self.compiler_kind() != Some(kind) {
          self.compiler = Some(Compiler::new(kind));
        }
      }
      "compiler.version" | "compiler.libcxx" => {
        let compiler = self.compiler.as_mut().ok_or_else(|| SettingsError::MissingCompiler {
          key: key.to_string(),
        })?;
        if key == "compiler.version" {
          compiler.version = Some(value.parse().map_err(invalid)?);
        } else {
          compiler.libcxx = Some(value.parse().map_err(invalid)?);
        }
      }
      other => return Err(SettingsError::UnknownKey(other.to_string())),
    }

    Ok(())
  }

  /// Apply `key=value` overrides.
  ///
  /// `compiler` is applied before any `compiler.*` sub-setting so the order
  /// on the command line does not matter.
  pub fn apply_overrides<S: AsRef<str>>(&mut self, pairs: &[S]) -> Result<(), SettingsError> {
    let mut parsed = Vec::with_capacity(pairs.len());
    for pair in pairs {
      let pair = pair.as_ref();
      let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| SettingsError::MalformedPair(pair.to_string()))?;
      parsed.push((key.trim(), value.trim()));
    }

    parsed.sort_by_key(|(key, _)| key.starts_with("compiler."));

    for (key, value) in parsed {
      self.set(key, value)?;
    }

    Ok(())
  }
}

impl fmt::Display for Settings {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.platform(), self.build_type)?;
    if let Some(compiler) = &self.compiler {
      write!(f, " {}", compiler)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn linux() -> Settings {
    Settings::new(Os::Linux, Arch::X86_64, BuildType::Release)
  }

  #[test]
  fn overrides_apply_in_dependency_order() {
    let mut settings = linux();
    settings
      .apply_overrides(&["compiler.version=11", "build_type=Debug", "compiler=gcc"])
      .unwrap();

    assert_eq!(settings.build_type, BuildType::Debug);
    let compiler = settings.compiler.unwrap();
    assert_eq!(compiler.kind, CompilerKind::Gcc);
    assert_eq!(compiler.version.unwrap().to_string(), "11");
  }

  #[test]
  fn version_without_compiler_is_an_error() {
    let mut settings = linux();
    let err = settings.apply_overrides(&["compiler.version=11"]).unwrap_err();
    assert!(matches!(err, SettingsError::MissingCompiler { .. }));
  }

  #[test]
  fn non_numeric_version_is_an_error() {
    let mut settings = linux();
    let err = settings
      .apply_overrides(&["compiler=gcc", "compiler.version=eleven"])
      .unwrap_err();
    assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == "compiler.version"));
  }

  #[test]
  fn malformed_and_unknown_keys_are_rejected() {
    let mut settings = linux();
    assert!(matches!(
      settings.apply_overrides(&["os"]),
      Err(SettingsError::MalformedPair(_))
    ));
    assert!(matches!(
      settings.apply_overrides(&["cppstd=17"]),
      Err(SettingsError::UnknownKey(_))
    ));
  }

  #[test]
  fn resetting_same_compiler_keeps_version() {
    let mut settings = linux();
    settings.apply_overrides(&["compiler=gcc", "compiler.version=9"]).unwrap();
    settings.set("compiler", "gcc").unwrap();
    assert!(settings.compiler.unwrap().version.is_some());
  }

  #[test]
  fn serializes_with_lowercase_identifiers() {
    let settings = linux().with_compiler(Compiler::new(CompilerKind::Gcc));
    let json = serde_json::to_value(&settings).unwrap();
    assert_eq!(json["os"], "linux");
    assert_eq!(json["build_type"], "Release");
    assert_eq!(json["compiler"]["kind"], "gcc");
  }
}
