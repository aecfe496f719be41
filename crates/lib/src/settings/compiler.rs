//! Compiler identity, version and standard library selection.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Known toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CompilerKind {
  Gcc,
  Clang,
  AppleClang,
  Msvc,
}

impl CompilerKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Gcc => "gcc",
      Self::Clang => "clang",
      Self::AppleClang => "apple-clang",
      Self::Msvc => "msvc",
    }
  }
}

impl fmt::Display for CompilerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for CompilerKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "gcc" => Ok(Self::Gcc),
      "clang" => Ok(Self::Clang),
      "apple-clang" | "apple_clang" => Ok(Self::AppleClang),
      "msvc" | "visual studio" => Ok(Self::Msvc),
      other => Err(format!("unknown compiler '{}'", other)),
    }
  }
}

impl TryFrom<String> for CompilerKind {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<CompilerKind> for String {
  fn from(kind: CompilerKind) -> Self {
    kind.as_str().to_string()
  }
}

/// C++ standard library ABI selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Libcxx {
  /// Pre-C++11 `std::string`/`std::list` ABI of libstdc++.
  Libstdcxx,
  /// The dual ABI's C++11 flavour, default since gcc 5.1.
  Libstdcxx11,
  Libcxx,
}

impl Libcxx {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Libstdcxx => "libstdc++",
      Self::Libstdcxx11 => "libstdc++11",
      Self::Libcxx => "libc++",
    }
  }
}

impl fmt::Display for Libcxx {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Libcxx {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "libstdc++" => Ok(Self::Libstdcxx),
      "libstdc++11" => Ok(Self::Libstdcxx11),
      "libc++" => Ok(Self::Libcxx),
      other => Err(format!("unknown libcxx '{}'", other)),
    }
  }
}

impl TryFrom<String> for Libcxx {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Libcxx> for String {
  fn from(libcxx: Libcxx) -> Self {
    libcxx.as_str().to_string()
  }
}

/// A dotted numeric compiler version such as `5.1` or `11.4.0`.
///
/// Missing trailing components compare as zero, so `5.1 == 5.1.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompilerVersion {
  raw: String,
  parts: Vec<u32>,
}

impl CompilerVersion {
  pub fn from_parts(parts: &[u32]) -> Self {
    let raw = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
    Self {
      raw,
      parts: parts.to_vec(),
    }
  }

  pub fn parts(&self) -> &[u32] {
    &self.parts
  }

  fn significant(&self) -> &[u32] {
    let len = self.parts.iter().rposition(|p| *p != 0).map_or(0, |i| i + 1);
    &self.parts[..len]
  }
}

impl FromStr for CompilerVersion {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
      return Err("empty compiler version".to_string());
    }

    let parts = trimmed
      .split('.')
      .map(|part| {
        part
          .parse::<u32>()
          .map_err(|_| format!("invalid compiler version '{}'", trimmed))
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self {
      raw: trimmed.to_string(),
      parts,
    })
  }
}

impl TryFrom<String> for CompilerVersion {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<CompilerVersion> for String {
  fn from(version: CompilerVersion) -> Self {
    version.raw
  }
}

impl fmt::Display for CompilerVersion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.raw)
  }
}

impl Ord for CompilerVersion {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.parts.len().max(other.parts.len());
    for i in 0..len {
      let a = self.parts.get(i).copied().unwrap_or(0);
      let b = other.parts.get(i).copied().unwrap_or(0);
      match a.cmp(&b) {
        Ordering::Equal => continue,
        non_eq => return non_eq,
      }
    }
    Ordering::Equal
  }
}

impl PartialOrd for CompilerVersion {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for CompilerVersion {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for CompilerVersion {}

impl Hash for CompilerVersion {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.significant().hash(state);
  }
}

/// Compiler part of a platform descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Compiler {
  pub kind: CompilerKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<CompilerVersion>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub libcxx: Option<Libcxx>,
}

impl Compiler {
  pub fn new(kind: CompilerKind) -> Self {
    Self {
      kind,
      version: None,
      libcxx: None,
    }
  }

  pub fn with_version(mut self, version: CompilerVersion) -> Self {
    self.version = Some(version);
    self
  }
}

impl fmt::Display for Compiler {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.kind)?;
    if let Some(version) = &self.version {
      write!(f, " {}", version)?;
    }
    if let Some(libcxx) = &self.libcxx {
      write!(f, " ({})", libcxx)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(s: &str) -> CompilerVersion {
    s.parse().unwrap()
  }

  #[test]
  fn version_ordering() {
    assert!(v("5.1") >= v("5.1"));
    assert!(v("5.0") < v("5.1"));
    assert!(v("11") > v("5.1"));
    assert!(v("5.1.1") > v("5.1"));
    assert!(v("4.9.4") < v("5.1"));
  }

  #[test]
  fn trailing_zeros_are_insignificant() {
    assert_eq!(v("5.1"), v("5.1.0"));
    assert_eq!(v("9"), v("9.0.0"));
  }

  #[test]
  fn non_numeric_version_is_rejected() {
    assert!("abc".parse::<CompilerVersion>().is_err());
    assert!("5.x".parse::<CompilerVersion>().is_err());
    assert!("".parse::<CompilerVersion>().is_err());
  }

  #[test]
  fn from_parts_matches_parsed() {
    assert_eq!(CompilerVersion::from_parts(&[5, 1]), v("5.1"));
    assert_eq!(CompilerVersion::from_parts(&[5, 1]).to_string(), "5.1");
  }

  #[test]
  fn display_keeps_original_spelling() {
    assert_eq!(v("11.4.0").to_string(), "11.4.0");
  }

  #[test]
  fn compiler_display_includes_version_and_libcxx() {
    let mut compiler = Compiler::new(CompilerKind::Gcc).with_version(v("9"));
    compiler.libcxx = Some(Libcxx::Libstdcxx11);
    assert_eq!(compiler.to_string(), "gcc 9 (libstdc++11)");
  }
}
