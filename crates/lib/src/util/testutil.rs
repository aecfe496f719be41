//! Test doubles for forge-lib.
//!
//! [`RecordingBuildSystem`] stands in for CMake so pipeline tests never need
//! a real toolchain; the resolvers stand in for the dependency store.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::buildsys::{BuildDefinitions, BuildSystem, CommandError, CommandOutput, TestOutput};
use crate::requires::{DependencyResolver, Requirement, ResolveError, ResolvedDependency};

/// Records every call by name (`configure`, `build`, `test`, `install`,
/// `target:<name>`) and fails the one named by [`failing_on`].
///
/// A failing call is still recorded, and its output is `"<call> failed\n"`.
///
/// [`failing_on`]: RecordingBuildSystem::failing_on
#[derive(Debug)]
pub struct RecordingBuildSystem {
  build_dir: PathBuf,
  fail_on: Option<String>,
  pub calls: Vec<String>,
  pub configured_with: Option<BuildDefinitions>,
  pub test_output: Option<TestOutput>,
}

impl RecordingBuildSystem {
  pub fn new(build_dir: impl Into<PathBuf>) -> Self {
    Self {
      build_dir: build_dir.into(),
      fail_on: None,
      calls: Vec::new(),
      configured_with: None,
      test_output: None,
    }
  }

  pub fn failing_on(mut self, call: &str) -> Self {
    self.fail_on = Some(call.to_string());
    self
  }

  fn record(&mut self, call: String) -> Result<CommandOutput, CommandError> {
    let failed = self.fail_on.as_deref() == Some(call.as_str());
    self.calls.push(call.clone());
    if failed {
      return Err(CommandError::Failed {
        program: "fake".to_string(),
        args: vec![call.clone()],
        code: Some(1),
        output: CommandOutput {
          stdout: format!("{} failed\n", call),
          stderr: String::new(),
        },
      });
    }
    Ok(CommandOutput {
      stdout: format!("{} ok\n", call),
      stderr: String::new(),
    })
  }
}

impl BuildSystem for RecordingBuildSystem {
  fn name(&self) -> &str {
    "recording"
  }

  fn project_file(&self) -> &'static str {
    "CMakeLists.txt"
  }

  fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  async fn configure(
    &mut self,
    _source_root: &Path,
    definitions: &BuildDefinitions,
  ) -> Result<CommandOutput, CommandError> {
    self.configured_with = Some(definitions.clone());
    self.record("configure".to_string())
  }

  async fn build(&mut self) -> Result<CommandOutput, CommandError> {
    self.record("build".to_string())
  }

  async fn test(&mut self, output: TestOutput) -> Result<CommandOutput, CommandError> {
    self.test_output = Some(output);
    self.record("test".to_string())
  }

  async fn install(&mut self) -> Result<CommandOutput, CommandError> {
    self.record("install".to_string())
  }

  async fn build_target(&mut self, target: &str) -> Result<CommandOutput, CommandError> {
    self.record(format!("target:{}", target))
  }
}

/// Resolves every requirement to `/deps/<name>/<version>` and remembers what
/// was asked for.
#[derive(Debug, Default)]
pub struct FixedResolver {
  requested: RefCell<Vec<Requirement>>,
}

impl FixedResolver {
  pub fn requested(&self) -> Vec<Requirement> {
    self.requested.borrow().clone()
  }
}

impl DependencyResolver for FixedResolver {
  fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError> {
    self.requested.borrow_mut().push(requirement.clone());
    Ok(ResolvedDependency {
      requirement: requirement.clone(),
      root: PathBuf::from("/deps").join(&requirement.name).join(&requirement.version),
    })
  }
}

/// Never finds anything.
#[derive(Debug, Default)]
pub struct FailingResolver;

impl DependencyResolver for FailingResolver {
  fn resolve(&self, requirement: &Requirement) -> Result<ResolvedDependency, ResolveError> {
    Err(ResolveError::NotFound {
      requirement: requirement.clone(),
      searched: PathBuf::from("/nowhere"),
    })
  }
}

/// Create a minimal CMake project in `dir`.
pub fn write_project(dir: &Path) {
  std::fs::create_dir_all(dir.join("src")).unwrap();
  std::fs::write(
    dir.join("CMakeLists.txt"),
    "cmake_minimum_required(VERSION 3.15)\nproject(hello CXX)\n",
  )
  .unwrap();
  std::fs::write(dir.join("src").join("lib.cpp"), "int answer() { return 42; }\n").unwrap();
}

/// Write fake `cmake` and `ctest` scripts into `dir`.
///
/// Both append their arguments to `dir/calls.log`. `cmake --install` also
/// drops a `lib/libDI1Core.a` marker under the prefix recorded at configure
/// time, so callers can check that install ran.
#[cfg(unix)]
pub fn fake_cmake_tools(dir: &Path) -> (PathBuf, PathBuf) {
  use std::os::unix::fs::PermissionsExt;

  std::fs::create_dir_all(dir).unwrap();
  let log = dir.join("calls.log");
  let cmake = dir.join("cmake");
  let ctest = dir.join("ctest");

  let cmake_script = format!(
    r#"#!/bin/sh
echo "cmake $*" >> '{log}'
case "$1" in
  -S)
    for arg in "$@"; do
      case "$arg" in
        -DCMAKE_INSTALL_PREFIX=*) echo "${{arg#-DCMAKE_INSTALL_PREFIX=}}" > "$4/prefix.txt" ;;
      esac
    done
    ;;
  --install)
    prefix=$(cat "$2/prefix.txt")
    mkdir -p "$prefix/lib"
    touch "$prefix/lib/libDI1Core.a"
    ;;
esac
exit 0
"#,
    log = log.display()
  );
  let ctest_script = format!("#!/bin/sh\necho \"ctest $*\" >> '{}'\necho '100% tests passed'\n", log.display());

  for (path, script) in [(&cmake, cmake_script), (&ctest, ctest_script)] {
    std::fs::write(path, script).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
  }

  (cmake, ctest)
}
