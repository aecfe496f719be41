//! Predicates over a platform descriptor.
//!
//! Recipes express every platform-dependent policy (dependency rules, the
//! coverage switch, post-install hooks) as a `Condition` instead of inline
//! branching, so each policy can be evaluated and tested on its own.

use serde::{Deserialize, Serialize};

use super::Settings;
use super::build_type::BuildType;
use super::compiler::CompilerKind;
use crate::platform::arch::Arch;
use crate::platform::os::Os;

/// Matches a descriptor when every field that is set equals the descriptor's
/// value. An empty condition matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub os: Option<Os>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub arch: Option<Arch>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub build_type: Option<BuildType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub compiler: Option<CompilerKind>,
}

impl Condition {
  pub fn always() -> Self {
    Self::default()
  }

  pub fn os(mut self, os: Os) -> Self {
    self.os = Some(os);
    self
  }

  pub fn arch(mut self, arch: Arch) -> Self {
    self.arch = Some(arch);
    self
  }

  pub fn build_type(mut self, build_type: BuildType) -> Self {
    self.build_type = Some(build_type);
    self
  }

  pub fn compiler(mut self, compiler: CompilerKind) -> Self {
    self.compiler = Some(compiler);
    self
  }

  pub fn matches(&self, settings: &Settings) -> bool {
    self.os.is_none_or(|os| os == settings.os)
      && self.arch.is_none_or(|arch| arch == settings.arch)
      && self.build_type.is_none_or(|bt| bt == settings.build_type)
      && self.compiler.is_none_or(|kind| settings.compiler_kind() == Some(kind))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::settings::compiler::Compiler;

  fn settings(os: Os, build_type: BuildType, compiler: Option<CompilerKind>) -> Settings {
    let mut s = Settings::new(os, Arch::X86_64, build_type);
    s.compiler = compiler.map(Compiler::new);
    s
  }

  #[test]
  fn empty_condition_matches_everything() {
    let s = settings(Os::Windows, BuildType::Release, None);
    assert!(Condition::always().matches(&s));
  }

  #[test]
  fn all_fields_must_match() {
    let cond = Condition::always()
      .os(Os::Linux)
      .build_type(BuildType::Debug)
      .compiler(CompilerKind::Gcc);

    assert!(cond.matches(&settings(Os::Linux, BuildType::Debug, Some(CompilerKind::Gcc))));
    assert!(!cond.matches(&settings(Os::Linux, BuildType::Release, Some(CompilerKind::Gcc))));
    assert!(!cond.matches(&settings(Os::Windows, BuildType::Debug, Some(CompilerKind::Gcc))));
    assert!(!cond.matches(&settings(Os::Linux, BuildType::Debug, Some(CompilerKind::Clang))));
  }

  #[test]
  fn compiler_condition_fails_without_compiler() {
    let cond = Condition::always().compiler(CompilerKind::Gcc);
    assert!(!cond.matches(&settings(Os::Linux, BuildType::Debug, None)));
  }
}
