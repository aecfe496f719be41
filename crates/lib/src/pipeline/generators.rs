//! Files written into the build folder before configure.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::CMAKE_BUILDINFO_FILE;
use crate::requires::ResolvedDependency;
use crate::settings::{Libcxx, Settings};

/// `openssl` -> `OPENSSL_ROOT`, `zlib-ng` -> `ZLIB_NG_ROOT`.
pub fn root_variable(package: &str) -> String {
  let mut name: String = package
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
    .collect();
  name.push_str("_ROOT");
  name
}

/// CMake wants forward slashes even on Windows.
pub(crate) fn cmake_path(path: &Path) -> String {
  path.display().to_string().replace('\\', "/")
}

fn render_cmake_buildinfo(settings: &Settings, dependencies: &[ResolvedDependency]) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "# Generated by forge before every configure.");
  let _ = writeln!(out, "set(FORGE_OS \"{}\")", settings.os);
  let _ = writeln!(out, "set(FORGE_ARCH \"{}\")", settings.arch);
  let _ = writeln!(out, "set(FORGE_BUILD_TYPE \"{}\")", settings.build_type);

  if let Some(compiler) = &settings.compiler {
    let _ = writeln!(out, "set(FORGE_COMPILER \"{}\")", compiler.kind);
    if let Some(version) = &compiler.version {
      let _ = writeln!(out, "set(FORGE_COMPILER_VERSION \"{}\")", version);
    }
    if let Some(libcxx) = compiler.libcxx {
      let _ = writeln!(out, "set(FORGE_LIBCXX \"{}\")", libcxx);
      match libcxx {
        Libcxx::Libstdcxx11 => {
          let _ = writeln!(out, "add_compile_definitions(_GLIBCXX_USE_CXX11_ABI=1)");
        }
        Libcxx::Libstdcxx => {
          let _ = writeln!(out, "add_compile_definitions(_GLIBCXX_USE_CXX11_ABI=0)");
        }
        Libcxx::Libcxx => {}
      }
    }
  }

  let names: Vec<_> = dependencies.iter().map(|d| d.requirement.name.as_str()).collect();
  let _ = writeln!(out, "set(FORGE_DEPENDENCIES \"{}\")", names.join(";"));
  for dependency in dependencies {
    let root = cmake_path(&dependency.root);
    let _ = writeln!(
      out,
      "set(FORGE_{} \"{}\")",
      root_variable(&dependency.requirement.name),
      root
    );
    let _ = writeln!(out, "list(APPEND CMAKE_PREFIX_PATH \"{}\")", root);
  }

  out
}

/// Write `forgebuildinfo.cmake` into `build_dir` and return its path.
pub async fn write_cmake_buildinfo(
  build_dir: &Path,
  settings: &Settings,
  dependencies: &[ResolvedDependency],
) -> io::Result<PathBuf> {
  tokio::fs::create_dir_all(build_dir).await?;
  let path = build_dir.join(CMAKE_BUILDINFO_FILE);
  tokio::fs::write(&path, render_cmake_buildinfo(settings, dependencies)).await?;
  debug!(path = %path.display(), "wrote cmake build info");
  Ok(path)
}
