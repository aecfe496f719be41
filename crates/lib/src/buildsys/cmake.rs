//! CMake driver.
//!
//! Command lines:
//! - configure: `cmake -S <src> -B <build> -D...`
//! - build: `cmake --build <build> --config <type> [--parallel 1]`
//! - test: `ctest --output-on-failure -C <type>` (run inside the build dir)
//! - install: `cmake --install <build> --config <type>`
//! - extra target: `cmake --build <build> --config <type> --target <name> [--parallel 1]`

use std::path::{Path, PathBuf};

use tracing::debug;

use super::exec::{CommandError, CommandOutput, run_command};
use super::{BuildDefinitions, BuildSystem, TestOutput};
use crate::settings::BuildType;

/// Runs the `cmake` and `ctest` executables.
#[derive(Debug, Clone)]
pub struct CMake {
  cmake: PathBuf,
  ctest: PathBuf,
  build_dir: PathBuf,
  build_type: BuildType,
  parallel: bool,
}

impl CMake {
  /// Serial build in `build_dir`. `FORGE_CMAKE`/`FORGE_CTEST` override the
  /// executables looked up on `PATH`.
  pub fn new(build_dir: impl Into<PathBuf>, build_type: BuildType) -> Self {
    let cmake = std::env::var("FORGE_CMAKE").unwrap_or_else(|_| "cmake".to_string());
    let ctest = std::env::var("FORGE_CTEST").unwrap_or_else(|_| "ctest".to_string());
    Self {
      cmake: PathBuf::from(cmake),
      ctest: PathBuf::from(ctest),
      build_dir: build_dir.into(),
      build_type,
      parallel: false,
    }
  }

  pub fn with_programs(mut self, cmake: impl Into<PathBuf>, ctest: impl Into<PathBuf>) -> Self {
    self.cmake = cmake.into();
    self.ctest = ctest.into();
    self
  }

  /// Let the native tool pick its own job count.
  pub fn parallel(mut self, parallel: bool) -> Self {
    self.parallel = parallel;
    self
  }

  fn build_dir_arg(&self) -> String {
    self.build_dir.display().to_string()
  }

  fn configure_args(&self, source_root: &Path, definitions: &BuildDefinitions) -> Vec<String> {
    let mut args = vec![
      "-S".to_string(),
      source_root.display().to_string(),
      "-B".to_string(),
      self.build_dir_arg(),
    ];
    args.extend(definitions.to_args());
    args
  }

  fn build_args(&self, target: Option<&str>) -> Vec<String> {
    let mut args = vec![
      "--build".to_string(),
      self.build_dir_arg(),
      "--config".to_string(),
      self.build_type.to_string(),
    ];
    if let Some(target) = target {
      args.push("--target".to_string());
      args.push(target.to_string());
    }
    if !self.parallel {
      args.push("--parallel".to_string());
      args.push("1".to_string());
    }
    args
  }

  fn test_args(&self, output: TestOutput) -> Vec<String> {
    let verbosity = match output {
      TestOutput::OnFailure => "--output-on-failure",
      TestOutput::Verbose => "--verbose",
    };
    vec![verbosity.to_string(), "-C".to_string(), self.build_type.to_string()]
  }

  fn install_args(&self) -> Vec<String> {
    vec![
      "--install".to_string(),
      self.build_dir_arg(),
      "--config".to_string(),
      self.build_type.to_string(),
    ]
  }

  /// Environment for build invocations; pins the native tool to one job.
  fn build_env(&self) -> Vec<(&'static str, &'static str)> {
    if self.parallel {
      Vec::new()
    } else {
      vec![("CMAKE_BUILD_PARALLEL_LEVEL", "1")]
    }
  }
}

impl BuildSystem for CMake {
  fn name(&self) -> &str {
    "cmake"
  }

  fn project_file(&self) -> &'static str {
    "CMakeLists.txt"
  }

  fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  async fn configure(
    &mut self,
    source_root: &Path,
    definitions: &BuildDefinitions,
  ) -> Result<CommandOutput, CommandError> {
    tokio::fs::create_dir_all(&self.build_dir).await?;
    let args = self.configure_args(source_root, definitions);
    debug!(definitions = definitions.len(), "configuring");
    run_command(&self.cmake, &args, &self.build_dir, &[]).await
  }

  async fn build(&mut self) -> Result<CommandOutput, CommandError> {
    let args = self.build_args(None);
    run_command(&self.cmake, &args, &self.build_dir, &self.build_env()).await
  }

  async fn test(&mut self, output: TestOutput) -> Result<CommandOutput, CommandError> {
    let args = self.test_args(output);
    run_command(&self.ctest, &args, &self.build_dir, &[]).await
  }

  async fn install(&mut self) -> Result<CommandOutput, CommandError> {
    let args = self.install_args();
    run_command(&self.cmake, &args, &self.build_dir, &[]).await
  }

  async fn build_target(&mut self, target: &str) -> Result<CommandOutput, CommandError> {
    let args = self.build_args(Some(target));
    run_command(&self.cmake, &args, &self.build_dir, &self.build_env()).await
  }
}
