//! The recipe `forge` uses when no recipe file is given.

use super::{BuildPolicy, CoverageGate, Generator, Recipe, ScmSpec};
use crate::consts::SCM_AUTO;
use crate::options::AbiPin;
use crate::platform::os::Os;
use crate::requires::{Requirement, RequirementRule};
use crate::settings::{BuildType, CompilerKind, CompilerVersion, Condition, Libcxx};

impl Recipe {
  /// The encryption library: a CMake project exposing `DI1Core`, needing
  /// OpenSSL on Windows and gated on 50% coverage for gcc debug builds on
  /// Linux.
  pub fn encryption_lib() -> Self {
    let gcc_5_1 = CompilerVersion::from_parts(&[5, 1]);

    Self {
      license: "MIT".to_string(),
      description: "encryption library".to_string(),
      url: "https://github.com/JelleDhaene89/encryptionLib".to_string(),
      scm: Some(ScmSpec {
        kind: "git".to_string(),
        url: SCM_AUTO.to_string(),
        revision: SCM_AUTO.to_string(),
        subfolder: Some("hello".to_string()),
      }),
      exports_sources: vec!["*".to_string(), "!build/*".to_string(), "!ninja.zip".to_string()],
      build_policy: BuildPolicy::Missing,
      generators: vec![Generator::Cmake],
      parallel: false,
      abi_pins: vec![AbiPin::new(CompilerKind::Gcc, gcc_5_1, Libcxx::Libstdcxx11)],
      requires: vec![RequirementRule::new(
        Condition::always().os(Os::Windows),
        vec![Requirement::new("openssl", "3.2.0")],
      )],
      coverage: Some(CoverageGate {
        when: Condition::always()
          .os(Os::Linux)
          .build_type(BuildType::Debug)
          .compiler(CompilerKind::Gcc),
        min_coverage: 50,
        target: "coverage-check".to_string(),
      }),
      libs: vec!["DI1Core".to_string()],
      ..Self::new("encryption-lib", "1.0.0")
    }
  }
}
