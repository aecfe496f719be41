//! Key/value parameters handed to the build system's configure step.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single definition value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefinitionValue {
  Bool(bool),
  Int(i64),
  Str(String),
}

impl fmt::Display for DefinitionValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(true) => f.write_str("ON"),
      Self::Bool(false) => f.write_str("OFF"),
      Self::Int(i) => write!(f, "{}", i),
      Self::Str(s) => f.write_str(s),
    }
  }
}

impl From<bool> for DefinitionValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i64> for DefinitionValue {
  fn from(value: i64) -> Self {
    Self::Int(value)
  }
}

impl From<u32> for DefinitionValue {
  fn from(value: u32) -> Self {
    Self::Int(i64::from(value))
  }
}

impl From<&str> for DefinitionValue {
  fn from(value: &str) -> Self {
    Self::Str(value.to_string())
  }
}

impl From<String> for DefinitionValue {
  fn from(value: String) -> Self {
    Self::Str(value)
  }
}

/// Ordered so the rendered command line is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildDefinitions(BTreeMap<String, DefinitionValue>);

impl BuildDefinitions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<DefinitionValue>) {
    self.0.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&DefinitionValue> {
    self.0.get(key)
  }

  /// `true` only for a boolean definition that is set to true.
  pub fn flag(&self, key: &str) -> bool {
    matches!(self.0.get(key), Some(DefinitionValue::Bool(true)))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &DefinitionValue)> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// `-DKEY=VALUE` arguments.
  pub fn to_args(&self) -> Vec<String> {
    self.0.iter().map(|(k, v)| format!("-D{}={}", k, v)).collect()
  }
}

impl<K: Into<String>, V: Into<DefinitionValue>> FromIterator<(K, V)> for BuildDefinitions {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut defs = Self::new();
    for (k, v) in iter {
      defs.set(k, v);
    }
    defs
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn renders_sorted_cmake_arguments() {
    let defs: BuildDefinitions = [
      ("MIN_COVERAGE", DefinitionValue::from(50u32)),
      ("CODE_COVERAGE", DefinitionValue::from(true)),
      ("CMAKE_BUILD_TYPE", DefinitionValue::from("Debug")),
    ]
    .into_iter()
    .collect();

    assert_eq!(
      defs.to_args(),
      vec!["-DCMAKE_BUILD_TYPE=Debug", "-DCODE_COVERAGE=ON", "-DMIN_COVERAGE=50"]
    );
  }

  #[test]
  fn flag_requires_true_boolean() {
    let mut defs = BuildDefinitions::new();
    defs.set("A", true);
    defs.set("B", false);
    defs.set("C", "ON");
    assert!(defs.flag("A"));
    assert!(!defs.flag("B"));
    assert!(!defs.flag("C"));
    assert!(!defs.flag("D"));
  }

  #[test]
  fn false_renders_off() {
    assert_eq!(DefinitionValue::Bool(false).to_string(), "OFF");
  }
}
