//! Child process execution.
//!
//! Every tool invocation goes through [`run_command`], which captures stdout
//! and stderr so a failing step can report the tool's own diagnostics
//! verbatim.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured output of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}

impl CommandOutput {
  pub fn is_empty(&self) -> bool {
    self.stdout.is_empty() && self.stderr.is_empty()
  }
}

impl fmt::Display for CommandOutput {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.stdout)?;
    if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
      f.write_str("\n")?;
    }
    f.write_str(&self.stderr)
  }
}

/// Errors from running a build tool.
#[derive(Debug, Error)]
pub enum CommandError {
  /// The program could not be started at all.
  #[error("failed to run {program}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The program ran and exited unsuccessfully.
  #[error("{program} failed with {}", exit_description(.code))]
  Failed {
    program: String,
    args: Vec<String>,
    code: Option<i32>,
    output: CommandOutput,
  },

  /// I/O error while preparing the invocation.
  #[error("i/o error while preparing the command")]
  Io(#[from] std::io::Error),
}

fn exit_description(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "no exit code (terminated by a signal)".to_string(),
  }
}

impl CommandError {
  /// The tool's own output, if it got far enough to produce any.
  pub fn output(&self) -> Option<&CommandOutput> {
    match self {
      Self::Failed { output, .. } => Some(output),
      _ => None,
    }
  }
}

/// Run `program` with `args` in `cwd`, inheriting the environment plus `env`.
pub async fn run_command(
  program: &Path,
  args: &[String],
  cwd: &Path,
  env: &[(&str, &str)],
) -> Result<CommandOutput, CommandError> {
  let program_name = program.display().to_string();
  info!(program = %program_name, args = ?args, "running");

  let mut command = Command::new(program);
  command.args(args).current_dir(cwd);
  for (key, value) in env {
    command.env(key, value);
  }

  debug!(working_dir = ?cwd, "spawning process");

  let output = command.output().await.map_err(|source| CommandError::Spawn {
    program: program_name.clone(),
    source,
  })?;

  let captured = CommandOutput {
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
  };

  if !captured.stdout.is_empty() {
    debug!(stdout = %captured.stdout, "command stdout");
  }
  if !captured.stderr.is_empty() {
    debug!(stderr = %captured.stderr, "command stderr");
  }

  if !output.status.success() {
    return Err(CommandError::Failed {
      program: program_name,
      args: args.to_vec(),
      code: output.status.code(),
      output: captured,
    });
  }

  Ok(captured)
}
