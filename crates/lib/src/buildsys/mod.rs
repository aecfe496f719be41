//! Interface to the underlying build system.
//!
//! The pipeline only talks to a [`BuildSystem`]; [`CMake`] drives the real
//! `cmake`/`ctest` binaries and tests substitute a recording fake.

pub mod cmake;
pub mod definitions;
pub mod exec;

use std::path::Path;

pub use cmake::CMake;
pub use definitions::{BuildDefinitions, DefinitionValue};
pub use exec::{CommandError, CommandOutput, run_command};

/// How much the test runner should print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestOutput {
  /// Print the output of failing tests only.
  #[default]
  OnFailure,
  /// Print the output of every test.
  Verbose,
}

/// Configure/build/test/install plus arbitrary extra targets.
#[allow(async_fn_in_trait)]
pub trait BuildSystem {
  /// Human readable tool name for logs.
  fn name(&self) -> &str;

  /// File that marks a directory as a project of this build system.
  fn project_file(&self) -> &'static str;

  /// Directory the build happens in.
  fn build_dir(&self) -> &Path;

  async fn configure(
    &mut self,
    source_root: &Path,
    definitions: &BuildDefinitions,
  ) -> Result<CommandOutput, CommandError>;

  async fn build(&mut self) -> Result<CommandOutput, CommandError>;

  async fn test(&mut self, output: TestOutput) -> Result<CommandOutput, CommandError>;

  async fn install(&mut self) -> Result<CommandOutput, CommandError>;

  async fn build_target(&mut self, target: &str) -> Result<CommandOutput, CommandError>;
}
