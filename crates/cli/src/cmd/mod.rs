mod create;
mod detect;
mod info;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use forge_lib::recipe::{Recipe, load_recipe};
use forge_lib::settings::Settings;

pub use create::cmd_create;
pub use detect::cmd_detect;
pub use info::cmd_info;

/// The recipe at `path`, or the built-in one.
fn load_recipe_or_builtin(path: Option<&Path>) -> Result<Recipe> {
  match path {
    // mlua errors are not Send + Sync, so they can't be wrapped by anyhow directly
    Some(path) => load_recipe(path)
      .map_err(|e| anyhow!("{}", e))
      .with_context(|| format!("Failed to load recipe: {}", path.display())),
    None => Ok(Recipe::encryption_lib()),
  }
}

/// Host settings with `key=value` overrides applied.
fn settings_from_args(overrides: &[String]) -> Result<Settings> {
  let mut settings = Settings::detect().context("Failed to detect host settings")?;
  settings
    .apply_overrides(overrides)
    .context("Invalid setting")?;
  Ok(settings)
}
