use anyhow::Result;
use forge_lib::settings::Settings;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_detect(output: OutputFormat) -> Result<()> {
  let settings = Settings::detect()?;

  if output.is_json() {
    return print_json(&settings);
  }

  print_success(&format!("Detected {}", settings.platform()));
  print_stat("os", settings.os.as_str());
  print_stat("arch", settings.arch.as_str());
  print_stat("build_type", settings.build_type.as_str());
  Ok(())
}
