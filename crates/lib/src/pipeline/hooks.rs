//! Post-install hooks.
//!
//! Hooks run after install, in registration order. Each carries its own
//! gate; a disabled hook is skipped without invoking the build system.

use serde::Serialize;

use super::types::BuildError;
use crate::buildsys::{BuildDefinitions, CommandError};
use crate::recipe::{CoverageGate, Recipe};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum HookKind {
  /// Runs the coverage check target; failure means coverage is too low.
  CoverageGate { min_coverage: u32 },
  /// Any other recipe-declared target.
  Target,
}

/// A build target to run once the package is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostInstallHook {
  pub name: String,
  pub target: String,
  pub kind: HookKind,
  pub enabled: bool,
}

impl PostInstallHook {
  pub(crate) fn failure(&self, source: CommandError) -> BuildError {
    match self.kind {
      HookKind::CoverageGate { min_coverage } => BuildError::CoverageGate {
        target: self.target.clone(),
        min_coverage,
        source,
      },
      HookKind::Target => BuildError::Hook {
        name: self.name.clone(),
        source,
      },
    }
  }
}

/// The hook list for one run.
///
/// The coverage gate comes first and follows the coverage flag already
/// present in `definitions`, so the hook and the instrumentation can never
/// disagree. Recipe hooks follow in declaration order.
pub fn post_install_hooks(recipe: &Recipe, settings: &Settings, definitions: &BuildDefinitions) -> Vec<PostInstallHook> {
  let mut hooks = Vec::with_capacity(recipe.hooks.len() + 1);

  if let Some(gate) = &recipe.coverage {
    hooks.push(PostInstallHook {
      name: gate.target.clone(),
      target: gate.target.clone(),
      kind: HookKind::CoverageGate {
        min_coverage: gate.min_coverage,
      },
      enabled: definitions.flag(CoverageGate::FLAG),
    });
  }

  hooks.extend(recipe.hooks.iter().map(|hook| PostInstallHook {
    name: hook.name.clone(),
    target: hook.target.clone(),
    kind: HookKind::Target,
    enabled: hook.when.matches(settings),
  }));

  hooks
}
