//! End-to-end use of the public API: load the shipped Lua recipe, pick
//! settings, resolve against an on-disk store and drive a build system.

use std::path::{Path, PathBuf};

use forge_lib::buildsys::{BuildDefinitions, BuildSystem, CommandError, CommandOutput, TestOutput};
use forge_lib::options::configure_options;
use forge_lib::pipeline::{BuildContext, BuildError, Stage, Step, run_build};
use forge_lib::recipe::{Recipe, load_recipe};
use forge_lib::requires::StoreResolver;
use forge_lib::settings::{Libcxx, Settings};
use tempfile::TempDir;

fn recipe_path() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR")).join("../../recipes/encryption-lib.lua")
}

/// Build system that only logs what it was asked to do.
#[derive(Default)]
struct Log {
  build_dir: PathBuf,
  calls: Vec<String>,
  fail_target: Option<String>,
}

impl BuildSystem for Log {
  fn name(&self) -> &str {
    "log"
  }

  fn project_file(&self) -> &'static str {
    "CMakeLists.txt"
  }

  fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  async fn configure(&mut self, _: &Path, definitions: &BuildDefinitions) -> Result<CommandOutput, CommandError> {
    self.calls.push(format!("configure {}", definitions.to_args().join(" ")));
    Ok(CommandOutput::default())
  }

  async fn build(&mut self) -> Result<CommandOutput, CommandError> {
    self.calls.push("build".to_string());
    Ok(CommandOutput::default())
  }

  async fn test(&mut self, _: TestOutput) -> Result<CommandOutput, CommandError> {
    self.calls.push("test".to_string());
    Ok(CommandOutput::default())
  }

  async fn install(&mut self) -> Result<CommandOutput, CommandError> {
    self.calls.push("install".to_string());
    Ok(CommandOutput::default())
  }

  async fn build_target(&mut self, target: &str) -> Result<CommandOutput, CommandError> {
    self.calls.push(format!("target {}", target));
    if self.fail_target.as_deref() == Some(target) {
      return Err(CommandError::Failed {
        program: "cmake".to_string(),
        args: vec!["--target".to_string(), target.to_string()],
        code: Some(1),
        output: CommandOutput {
          stdout: String::new(),
          stderr: "coverage 12% is below 50%\n".to_string(),
        },
      });
    }
    Ok(CommandOutput::default())
  }
}

fn settings(pairs: &[&str]) -> Settings {
  let mut settings = Settings::detect().unwrap();
  settings.apply_overrides(pairs).unwrap();
  settings
}

struct Workspace {
  temp: TempDir,
}

impl Workspace {
  fn new() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("src/CMakeLists.txt"), "project(hello)\n").unwrap();
    std::fs::create_dir_all(temp.path().join("deps")).unwrap();
    Self { temp }
  }

  fn path(&self, rel: &str) -> PathBuf {
    self.temp.path().join(rel)
  }

  fn build_system(&self) -> Log {
    Log {
      build_dir: self.path("build"),
      ..Log::default()
    }
  }
}

#[test]
fn shipped_recipe_matches_builtin() {
  let loaded = load_recipe(&recipe_path()).unwrap();
  assert_eq!(loaded, Recipe::encryption_lib());
}

#[tokio::test]
async fn gcc_debug_on_linux_builds_with_coverage() {
  let ws = Workspace::new();
  let recipe = load_recipe(&recipe_path()).unwrap();
  let mut settings = settings(&["os=linux", "build_type=debug", "compiler=gcc", "compiler.version=12.2"]);
  configure_options(&mut settings, &recipe.abi_pins);
  assert_eq!(settings.compiler.as_ref().unwrap().libcxx, Some(Libcxx::Libstdcxx11));

  let src = ws.path("src");
  let prefix = ws.path("package");
  let ctx = BuildContext {
    recipe: &recipe,
    settings: &settings,
    source_root: &src,
    install_prefix: &prefix,
  };
  let mut build = ws.build_system();

  let report = run_build(&ctx, &StoreResolver::new(ws.path("deps")), &mut build)
    .await
    .unwrap();

  assert!(build.calls[0].contains("-DCODE_COVERAGE=ON"));
  assert!(build.calls[0].contains("-DMIN_COVERAGE=50"));
  assert_eq!(build.calls[1..], ["build", "test", "install", "target coverage-check"]);
  assert_eq!(report.final_stage(), Some(&Stage::Done));
}

#[tokio::test]
async fn windows_build_finds_openssl_in_store() {
  let ws = Workspace::new();
  std::fs::create_dir_all(ws.path("deps/openssl/3.2.0/include")).unwrap();
  let recipe = Recipe::encryption_lib();
  let settings = settings(&["os=windows", "compiler=msvc", "compiler.version=193"]);

  let src = ws.path("src");
  let prefix = ws.path("package");
  let ctx = BuildContext {
    recipe: &recipe,
    settings: &settings,
    source_root: &src,
    install_prefix: &prefix,
  };
  let mut build = ws.build_system();

  let report = run_build(&ctx, &StoreResolver::new(ws.path("deps")), &mut build)
    .await
    .unwrap();

  assert_eq!(report.dependencies.len(), 1);
  assert!(build.calls[0].contains("-DOPENSSL_ROOT="));
  assert!(build.calls[0].contains("-DCODE_COVERAGE=OFF"));
  assert!(!build.calls.iter().any(|c| c.starts_with("target")));
}

#[tokio::test]
async fn coverage_shortfall_keeps_tool_output() {
  let ws = Workspace::new();
  let recipe = Recipe::encryption_lib();
  let settings = settings(&["os=linux", "build_type=debug", "compiler=gcc", "compiler.version=9"]);

  let src = ws.path("src");
  let prefix = ws.path("package");
  let ctx = BuildContext {
    recipe: &recipe,
    settings: &settings,
    source_root: &src,
    install_prefix: &prefix,
  };
  let mut build = Log {
    fail_target: Some("coverage-check".to_string()),
    ..ws.build_system()
  };

  let err = run_build(&ctx, &StoreResolver::new(ws.path("deps")), &mut build)
    .await
    .unwrap_err();

  assert!(matches!(err, BuildError::CoverageGate { .. }));
  assert_eq!(err.step(), Step::PostInstall("coverage-check".to_string()));
  assert_eq!(err.diagnostics().unwrap().stderr, "coverage 12% is below 50%\n");
}
