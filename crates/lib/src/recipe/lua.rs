//! Loading recipes from Lua.
//!
//! A recipe file is a Lua chunk returning a table:
//!
//! ```lua
//! return {
//!   name = "encryption-lib",
//!   version = "1.0.0",
//!   requires = {
//!     { when = { os = "windows" }, packages = { "openssl/3.2.0" } },
//!   },
//!   coverage = {
//!     when = { os = "linux", build_type = "debug", compiler = "gcc" },
//!     min = 50,
//!     target = "coverage-check",
//!   },
//!   libs = { "DI1Core" },
//! }
//! ```
//!
//! Only `name` and `version` are required.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use mlua::prelude::*;
use thiserror::Error;
use tracing::debug;

use super::{CoverageGate, Generator, HookDef, Recipe, ScmSpec};
use crate::buildsys::{BuildDefinitions, DefinitionValue};
use crate::consts::SCM_AUTO;
use crate::options::AbiPin;
use crate::requires::{Requirement, RequirementRule};
use crate::settings::Condition;

/// Errors that can occur while loading a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("cannot read recipe '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  #[error("recipe must return a table")]
  NotATable,

  #[error("recipe field '{0}' is required")]
  Missing(String),

  #[error("recipe field '{field}': {message}")]
  Invalid { field: String, message: String },
}

impl RecipeError {
  fn invalid(field: &str, message: impl Display) -> Self {
    Self::Invalid {
      field: field.to_string(),
      message: message.to_string(),
    }
  }
}

type Result<T> = std::result::Result<T, RecipeError>;

/// Read and evaluate a recipe file.
pub fn load_recipe(path: &Path) -> Result<Recipe> {
  let source = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  debug!(path = %path.display(), "evaluating recipe");
  parse_recipe(&source, &format!("@{}", path.display()))
}

/// Evaluate recipe source. `chunk_name` shows up in Lua error messages.
pub fn parse_recipe(source: &str, chunk_name: &str) -> Result<Recipe> {
  let lua = Lua::new();
  let value = lua.load(source).set_name(chunk_name).eval::<LuaValue>()?;

  let LuaValue::Table(table) = value else {
    return Err(RecipeError::NotATable);
  };

  recipe_from_table(&table)
}

fn recipe_from_table(table: &LuaTable) -> Result<Recipe> {
  let name = required_string(table, "name", "name")?;
  let version = required_string(table, "version", "version")?;
  let mut recipe = Recipe::new(name, version);

  if let Some(license) = opt_string(table, "license", "license")? {
    recipe.license = license;
  }
  if let Some(description) = opt_string(table, "description", "description")? {
    recipe.description = description;
  }
  if let Some(url) = opt_string(table, "url", "url")? {
    recipe.url = url;
  }
  if let Some(scm) = opt_table(table, "scm", "scm")? {
    recipe.scm = Some(scm_from_table(&scm)?);
  }
  if let Some(patterns) = opt_string_list(table, "exports_sources", "exports_sources")? {
    recipe.exports_sources = patterns;
  }
  if let Some(policy) = opt_string(table, "build_policy", "build_policy")? {
    recipe.build_policy = parse_value("build_policy", &policy)?;
  }
  if let Some(generators) = opt_string_list(table, "generators", "generators")? {
    recipe.generators = generators
      .iter()
      .map(|g| parse_value::<Generator>("generators", g))
      .collect::<Result<_>>()?;
  }
  if let Some(parallel) = table
    .get::<Option<bool>>("parallel")
    .map_err(|e| RecipeError::invalid("parallel", e))?
  {
    recipe.parallel = parallel;
  }
  recipe.abi_pins = table_list(table, "abi_pins", "abi_pins", abi_pin_from_table)?;
  recipe.requires = table_list(table, "requires", "requires", rule_from_table)?;
  if let Some(defs) = opt_table(table, "definitions", "definitions")? {
    recipe.definitions = definitions_from_table(&defs)?;
  }
  if let Some(coverage) = opt_table(table, "coverage", "coverage")? {
    recipe.coverage = Some(coverage_from_table(&coverage)?);
  }
  recipe.hooks = table_list(table, "hooks", "hooks", hook_from_table)?;
  if let Some(libs) = opt_string_list(table, "libs", "libs")? {
    recipe.libs = libs;
  }

  Ok(recipe)
}

fn scm_from_table(table: &LuaTable) -> Result<ScmSpec> {
  let kind = opt_string(table, "type", "scm.type")?.unwrap_or_else(|| "git".to_string());
  if kind != "git" {
    return Err(RecipeError::invalid("scm.type", format!("unsupported scm '{}'", kind)));
  }
  Ok(ScmSpec {
    kind,
    url: opt_string(table, "url", "scm.url")?.unwrap_or_else(|| SCM_AUTO.to_string()),
    revision: opt_string(table, "revision", "scm.revision")?.unwrap_or_else(|| SCM_AUTO.to_string()),
    subfolder: opt_string(table, "subfolder", "scm.subfolder")?,
  })
}

fn abi_pin_from_table(table: &LuaTable, field: &str) -> Result<AbiPin> {
  let compiler = required_string(table, "compiler", &format!("{}.compiler", field))?;
  let min_version = required_string(table, "min_version", &format!("{}.min_version", field))?;
  let libcxx = required_string(table, "libcxx", &format!("{}.libcxx", field))?;
  Ok(AbiPin::new(
    parse_value(&format!("{}.compiler", field), &compiler)?,
    parse_value(&format!("{}.min_version", field), &min_version)?,
    parse_value(&format!("{}.libcxx", field), &libcxx)?,
  ))
}

fn rule_from_table(table: &LuaTable, field: &str) -> Result<RequirementRule> {
  let when = condition_from(table, field)?;
  let packages_field = format!("{}.packages", field);
  let packages = opt_string_list(table, "packages", &packages_field)?.ok_or(RecipeError::Missing(packages_field.clone()))?;
  let requires = packages
    .iter()
    .map(|p| p.parse::<Requirement>().map_err(|e| RecipeError::invalid(&packages_field, e)))
    .collect::<Result<_>>()?;
  Ok(RequirementRule::new(when, requires))
}

fn coverage_from_table(table: &LuaTable) -> Result<CoverageGate> {
  let min_coverage = table
    .get::<Option<u32>>("min")
    .map_err(|e| RecipeError::invalid("coverage.min", e))?
    .ok_or_else(|| RecipeError::Missing("coverage.min".to_string()))?;
  if min_coverage > 100 {
    return Err(RecipeError::invalid("coverage.min", "must be a percentage between 0 and 100"));
  }
  Ok(CoverageGate {
    when: condition_from(table, "coverage")?,
    min_coverage,
    target: opt_string(table, "target", "coverage.target")?.unwrap_or_else(|| "coverage-check".to_string()),
  })
}

fn hook_from_table(table: &LuaTable, field: &str) -> Result<HookDef> {
  Ok(HookDef {
    name: required_string(table, "name", &format!("{}.name", field))?,
    when: condition_from(table, field)?,
    target: required_string(table, "target", &format!("{}.target", field))?,
  })
}

/// Reads the optional `when` sub-table of `table`.
fn condition_from(table: &LuaTable, field: &str) -> Result<Condition> {
  let when_field = format!("{}.when", field);
  let Some(when) = opt_table(table, "when", &when_field)? else {
    return Ok(Condition::always());
  };

  let mut condition = Condition::always();
  if let Some(os) = opt_string(&when, "os", &format!("{}.os", when_field))? {
    condition.os = Some(parse_value(&format!("{}.os", when_field), &os)?);
  }
  if let Some(arch) = opt_string(&when, "arch", &format!("{}.arch", when_field))? {
    condition.arch = Some(parse_value(&format!("{}.arch", when_field), &arch)?);
  }
  if let Some(build_type) = opt_string(&when, "build_type", &format!("{}.build_type", when_field))? {
    condition.build_type = Some(parse_value(&format!("{}.build_type", when_field), &build_type)?);
  }
  if let Some(compiler) = opt_string(&when, "compiler", &format!("{}.compiler", when_field))? {
    condition.compiler = Some(parse_value(&format!("{}.compiler", when_field), &compiler)?);
  }
  Ok(condition)
}

fn definitions_from_table(table: &LuaTable) -> Result<BuildDefinitions> {
  let mut defs = BuildDefinitions::new();
  for pair in table.pairs::<String, LuaValue>() {
    let (key, value) = pair.map_err(|e| RecipeError::invalid("definitions", e))?;
    let field = format!("definitions.{}", key);
    let value = match value {
      LuaValue::Boolean(b) => DefinitionValue::Bool(b),
      LuaValue::Integer(i) => DefinitionValue::Int(i),
      LuaValue::Number(n) if n.fract() == 0.0 => DefinitionValue::Int(n as i64),
      LuaValue::Number(n) => DefinitionValue::Str(n.to_string()),
      LuaValue::String(s) => DefinitionValue::Str(s.to_str().map_err(|e| RecipeError::invalid(&field, e))?.to_string()),
      other => {
        return Err(RecipeError::invalid(
          &field,
          format!("expected boolean, number or string, got {}", other.type_name()),
        ));
      }
    };
    defs.set(key, value);
  }
  Ok(defs)
}

fn parse_value<T>(field: &str, value: &str) -> Result<T>
where
  T: FromStr,
  T::Err: Display,
{
  value.parse::<T>().map_err(|e| RecipeError::invalid(field, e))
}

fn required_string(table: &LuaTable, key: &str, field: &str) -> Result<String> {
  opt_string(table, key, field)?.ok_or_else(|| RecipeError::Missing(field.to_string()))
}

fn opt_string(table: &LuaTable, key: &str, field: &str) -> Result<Option<String>> {
  match table.get::<LuaValue>(key).map_err(|e| RecipeError::invalid(field, e))? {
    LuaValue::Nil => Ok(None),
    LuaValue::String(s) => Ok(Some(s.to_str().map_err(|e| RecipeError::invalid(field, e))?.to_string())),
    other => Err(RecipeError::invalid(
      field,
      format!("expected string, got {}", other.type_name()),
    )),
  }
}

fn opt_table(table: &LuaTable, key: &str, field: &str) -> Result<Option<LuaTable>> {
  match table.get::<LuaValue>(key).map_err(|e| RecipeError::invalid(field, e))? {
    LuaValue::Nil => Ok(None),
    LuaValue::Table(t) => Ok(Some(t)),
    other => Err(RecipeError::invalid(
      field,
      format!("expected table, got {}", other.type_name()),
    )),
  }
}

fn opt_string_list(table: &LuaTable, key: &str, field: &str) -> Result<Option<Vec<String>>> {
  let Some(list) = opt_table(table, key, field)? else {
    return Ok(None);
  };
  let mut items = Vec::new();
  for (i, value) in list.sequence_values::<LuaValue>().enumerate() {
    let item_field = format!("{}[{}]", field, i + 1);
    match value.map_err(|e| RecipeError::invalid(&item_field, e))? {
      LuaValue::String(s) => items.push(s.to_str().map_err(|e| RecipeError::invalid(&item_field, e))?.to_string()),
      other => {
        return Err(RecipeError::invalid(
          &item_field,
          format!("expected string, got {}", other.type_name()),
        ));
      }
    }
  }
  Ok(Some(items))
}

/// Parses every entry of a list of tables with `parse`.
fn table_list<T>(
  table: &LuaTable,
  key: &str,
  field: &str,
  parse: impl Fn(&LuaTable, &str) -> Result<T>,
) -> Result<Vec<T>> {
  let Some(list) = opt_table(table, key, field)? else {
    return Ok(Vec::new());
  };
  let mut items = Vec::new();
  for (i, value) in list.sequence_values::<LuaValue>().enumerate() {
    let item_field = format!("{}[{}]", field, i + 1);
    match value.map_err(|e| RecipeError::invalid(&item_field, e))? {
      LuaValue::Table(entry) => items.push(parse(&entry, &item_field)?),
      other => {
        return Err(RecipeError::invalid(
          &item_field,
          format!("expected table, got {}", other.type_name()),
        ));
      }
    }
  }
  Ok(items)
}
