//! Implementation of the `forge create` command.
//!
//! Exports the sources into the store, then either reuses an existing binary
//! or runs the full pipeline. On a failed step the tool's own output is
//! printed unchanged before the error.

use std::path::Path;

use anyhow::{Context, Result};
use forge_lib::create::{CreateError, CreateOptions, CreateOutcome, CreateStatus, create_package};
use forge_lib::recipe::BuildPolicy;
use tracing::debug;

use super::{load_recipe_or_builtin, settings_from_args};
use crate::output::{OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success};

pub fn cmd_create(
  source: &Path,
  recipe: Option<&Path>,
  overrides: &[String],
  build: Option<BuildPolicy>,
  output: OutputFormat,
) -> Result<()> {
  let recipe = load_recipe_or_builtin(recipe)?;
  let settings = settings_from_args(overrides)?;
  let source = dunce::canonicalize(source).with_context(|| format!("Source directory not found: {}", source.display()))?;
  debug!(source = %source.display(), recipe = %recipe.reference(), "create");

  let options = CreateOptions::new(&source).with_policy(build);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let outcome = match rt.block_on(create_package(&recipe, &settings, &options)) {
    Ok(outcome) => outcome,
    Err(CreateError::Build(err)) => {
      let diagnostics = err.diagnostics().map(|o| o.to_string()).unwrap_or_default();
      if !diagnostics.is_empty() {
        eprint!("{}", diagnostics);
        if !diagnostics.ends_with('\n') {
          eprintln!();
        }
      }
      print_error(&format!("{} failed at step '{}'", recipe.reference(), err.step()));
      return Err(err.into());
    }
    Err(e) => return Err(e).context("Create failed"),
  };

  if output.is_json() {
    return print_json(&outcome);
  }
  print_outcome(&outcome);
  Ok(())
}

fn print_outcome(outcome: &CreateOutcome) {
  let reference = format!("{}/{}", outcome.manifest.name, outcome.manifest.version);
  match &outcome.status {
    CreateStatus::Cached => {
      print_info(&format!("{} already built, nothing to do", reference));
    }
    CreateStatus::Built { report } => {
      print_success(&format!("Built {} in {}", reference, format_duration(report.total_elapsed())));
      for record in &report.stages {
        print_stat(&record.stage.to_string(), &format_duration(record.elapsed));
      }
      if !report.hooks_run.is_empty() {
        print_stat("Hooks", &report.hooks_run.join(", "));
      }
    }
  }
  print_stat("Package id", &outcome.package_id.to_string());
  print_stat("Settings", &outcome.manifest.settings.to_string());
  print_stat("Folder", &outcome.package_dir.display().to_string());
  if let Some(revision) = outcome.manifest.scm.as_ref().and_then(|s| s.revision.as_deref()) {
    print_stat("Revision", revision);
  }
}
