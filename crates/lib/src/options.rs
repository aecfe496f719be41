//! Toolchain setting adjustments applied before anything else runs.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::settings::{CompilerKind, CompilerVersion, Libcxx, Settings};

/// Pins the standard library ABI for a compiler from a given version on.
///
/// gcc 5.1 switched its default to the C++11 `std::string` ABI; binaries in
/// the same dependency graph must agree on it, so the selection is made
/// explicit instead of left to the compiler default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiPin {
  pub compiler: CompilerKind,
  pub min_version: CompilerVersion,
  pub libcxx: Libcxx,
}

impl AbiPin {
  pub fn new(compiler: CompilerKind, min_version: CompilerVersion, libcxx: Libcxx) -> Self {
    Self {
      compiler,
      min_version,
      libcxx,
    }
  }

  fn applies_to(&self, settings: &Settings) -> bool {
    settings.compiler.as_ref().is_some_and(|compiler| {
      compiler.kind == self.compiler && compiler.version.as_ref().is_some_and(|v| *v >= self.min_version)
    })
  }
}

/// Apply every matching pin to `settings` in place.
///
/// A descriptor without a compiler, or with a compiler that has no version,
/// is left untouched. Running it twice yields the same settings.
pub fn configure_options(settings: &mut Settings, pins: &[AbiPin]) {
  for pin in pins {
    if !pin.applies_to(settings) {
      continue;
    }
    if let Some(compiler) = settings.compiler.as_mut() {
      debug!(compiler = %compiler.kind, libcxx = %pin.libcxx, "pinning standard library");
      compiler.libcxx = Some(pin.libcxx);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::arch::Arch;
  use crate::platform::os::Os;
  use crate::settings::{BuildType, Compiler};

  fn gcc_pin() -> AbiPin {
    AbiPin::new(CompilerKind::Gcc, "5.1".parse().unwrap(), Libcxx::Libstdcxx11)
  }

  fn with_compiler(kind: CompilerKind, version: Option<&str>) -> Settings {
    let mut compiler = Compiler::new(kind);
    compiler.version = version.map(|v| v.parse().unwrap());
    Settings::new(Os::Linux, Arch::X86_64, BuildType::Release).with_compiler(compiler)
  }

  fn libcxx(settings: &Settings) -> Option<Libcxx> {
    settings.compiler.as_ref().and_then(|c| c.libcxx)
  }

  #[test]
  fn pins_gcc_at_threshold_and_above() {
    for version in ["5.1", "5.2", "9", "13.2.0"] {
      let mut settings = with_compiler(CompilerKind::Gcc, Some(version));
      configure_options(&mut settings, &[gcc_pin()]);
      assert_eq!(libcxx(&settings), Some(Libcxx::Libstdcxx11), "gcc {}", version);
    }
  }

  #[test]
  fn leaves_old_gcc_alone() {
    for version in ["4.8", "4.9.4", "5.0"] {
      let mut settings = with_compiler(CompilerKind::Gcc, Some(version));
      configure_options(&mut settings, &[gcc_pin()]);
      assert_eq!(libcxx(&settings), None, "gcc {}", version);
    }
  }

  #[test]
  fn leaves_other_compilers_alone() {
    let mut settings = with_compiler(CompilerKind::Clang, Some("15"));
    configure_options(&mut settings, &[gcc_pin()]);
    assert_eq!(libcxx(&settings), None);
  }

  #[test]
  fn missing_compiler_or_version_skips() {
    let mut settings = Settings::new(Os::Linux, Arch::X86_64, BuildType::Debug);
    configure_options(&mut settings, &[gcc_pin()]);
    assert!(settings.compiler.is_none());

    let mut settings = with_compiler(CompilerKind::Gcc, None);
    configure_options(&mut settings, &[gcc_pin()]);
    assert_eq!(libcxx(&settings), None);
  }

  #[test]
  fn overrides_explicit_libcxx() {
    let mut settings = with_compiler(CompilerKind::Gcc, Some("11"));
    if let Some(c) = settings.compiler.as_mut() {
      c.libcxx = Some(Libcxx::Libstdcxx);
    }
    configure_options(&mut settings, &[gcc_pin()]);
    assert_eq!(libcxx(&settings), Some(Libcxx::Libstdcxx11));
  }

  #[test]
  fn is_idempotent() {
    let mut once = with_compiler(CompilerKind::Gcc, Some("11"));
    configure_options(&mut once, &[gcc_pin()]);
    let mut twice = once.clone();
    configure_options(&mut twice, &[gcc_pin()]);
    assert_eq!(once, twice);
  }
}
