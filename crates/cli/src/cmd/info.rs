//! `forge info`: what a recipe would build for a set of settings.

use std::path::Path;

use anyhow::Result;
use forge_lib::buildsys::BuildDefinitions;
use forge_lib::options::configure_options;
use forge_lib::recipe::{PackageInfo, Recipe};
use forge_lib::requires::{Requirement, active_requirements};
use forge_lib::settings::Settings;
use serde::Serialize;

use super::{load_recipe_or_builtin, settings_from_args};
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

#[derive(Serialize)]
struct InfoReport<'a> {
  name: &'a str,
  version: &'a str,
  license: &'a str,
  description: &'a str,
  url: &'a str,
  settings: &'a Settings,
  requires: Vec<Requirement>,
  coverage: bool,
  definitions: &'a BuildDefinitions,
  package_info: PackageInfo,
}

pub fn cmd_info(recipe: Option<&Path>, overrides: &[String], output: OutputFormat) -> Result<()> {
  let recipe = load_recipe_or_builtin(recipe)?;
  let mut settings = settings_from_args(overrides)?;
  configure_options(&mut settings, &recipe.abi_pins);

  let report = InfoReport {
    name: &recipe.name,
    version: &recipe.version,
    license: &recipe.license,
    description: &recipe.description,
    url: &recipe.url,
    settings: &settings,
    requires: active_requirements(&settings, &recipe.requires),
    coverage: recipe.coverage_enabled(&settings),
    definitions: &recipe.definitions,
    package_info: recipe.package_info(),
  };

  if output.is_json() {
    return print_json(&report);
  }

  print_text(&recipe, &report);
  Ok(())
}

fn print_text(recipe: &Recipe, report: &InfoReport<'_>) {
  print_success(&recipe.reference());
  if !report.description.is_empty() {
    print_stat("Description", report.description);
  }
  if !report.license.is_empty() {
    print_stat("License", report.license);
  }
  if !report.url.is_empty() {
    print_stat("URL", report.url);
  }
  print_stat("Settings", &report.settings.to_string());

  let requires = if report.requires.is_empty() {
    "none".to_string()
  } else {
    report
      .requires
      .iter()
      .map(|r| r.to_string())
      .collect::<Vec<_>>()
      .join(", ")
  };
  print_stat("Requires", &requires);
  print_stat("Libs", &report.package_info.libs.join(", "));

  if let Some(gate) = &recipe.coverage {
    if report.coverage {
      print_info(&format!(
        "Coverage gate active: '{}' must reach {}%",
        gate.target, gate.min_coverage
      ));
    } else {
      print_info("Coverage gate inactive for these settings");
    }
  }
}
