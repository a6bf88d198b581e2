//! Container configuration: YAML files plus environment overrides.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DEFAULT_CONFIG_BASE_NAME: &str = "nine";
const DEFAULT_CONFIG_EXTENSION: &str = "yaml";

pub const ENV_USE_EXCEPTIONS: &str = "NINE_USE_EXCEPTIONS";
pub const ENV_SERVICES_SHARED: &str = "NINE_SERVICES_SHARED";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
  /// Fail with `AbstractNotFound` instead of returning `None` on a miss.
  #[serde(default)]
  pub use_exceptions: bool,
  #[serde(default = "default_group")]
  pub default_group: String,
  /// Whether `put_service` registers shared services.
  #[serde(default = "default_services_shared")]
  pub services_shared: bool,
  /// Class names usable in `[class, alias]` registrations.
  #[serde(default)]
  pub classes: Vec<String>,
  #[serde(default)]
  pub settings: BTreeMap<String, JsonValue>,
}

fn default_group() -> String {
  crate::multi::DEFAULT_GROUP.to_string()
}

fn default_services_shared() -> bool {
  true
}

impl Default for ContainerConfig {
  fn default() -> Self {
    Self {
      use_exceptions: false,
      default_group: default_group(),
      services_shared: default_services_shared(),
      classes: Vec::new(),
      settings: BTreeMap::new(),
    }
  }
}

impl ContainerConfig {
  pub fn from_yaml_str(yaml: &str) -> Result<Self> {
    serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  pub fn from_file(path: &Path) -> Result<Self> {
    debug!(path = %path.display(), "loading container configuration");
    let reader = BufReader::new(File::open(path)?);
    serde_yaml::from_reader(reader).map_err(|e| Error::ConfigParse(e.to_string()))
  }

  /// Applies overrides read through `lookup` (an environment in tests,
  /// `std::env::var` otherwise).
  pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(enable) = bool_override(&lookup, ENV_USE_EXCEPTIONS) {
      self.use_exceptions = enable;
    }
    if let Some(shared) = bool_override(&lookup, ENV_SERVICES_SHARED) {
      self.services_shared = shared;
    }
  }

  pub fn apply_env_overrides(&mut self) {
    self.apply_overrides_from(|key| env::var(key).ok());
  }
}

fn bool_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
  let raw = lookup(key)?;
  match translate_env_value(&raw) {
    EnvValue::Bool(value) => Some(value),
    EnvValue::Null | EnvValue::Empty => None,
    EnvValue::Text(text) => {
      warn!(key, value = %text, "ignoring non-boolean override");
      None
    }
  }
}

/// An environment value after translation of the special literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
  Bool(bool),
  Empty,
  Null,
  Text(String),
}

/// Translates `true`, `false`, `empty` and `null` (optionally in
/// parentheses, any case) after stripping bounding double quotes.
pub fn translate_env_value(raw: &str) -> EnvValue {
  let value = strip_bounding_quotes(raw);
  match value.to_ascii_lowercase().as_str() {
    "true" | "(true)" => EnvValue::Bool(true),
    "false" | "(false)" => EnvValue::Bool(false),
    "empty" | "(empty)" => EnvValue::Empty,
    "null" | "(null)" => EnvValue::Null,
    _ => EnvValue::Text(value.to_owned()),
  }
}

fn strip_bounding_quotes(value: &str) -> &str {
  if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
    &value[1..value.len() - 1]
  } else {
    value
  }
}

/// Finds the configuration file in the working directory.
pub fn find_config_file(environment_suffix: Option<&str>) -> Result<PathBuf> {
  find_config_file_in(Path::new("."), environment_suffix)
}

/// Searches `dir` for `nine.<env>.yaml`, then `nine.yaml`.
///
/// The environment comes from `environment_suffix`, `NINE_ENV` or `APP_ENV`.
pub fn find_config_file_in(dir: &Path, environment_suffix: Option<&str>) -> Result<PathBuf> {
  let base_name = DEFAULT_CONFIG_BASE_NAME;
  let extension = DEFAULT_CONFIG_EXTENSION;

  let env_from_var = environment_suffix
    .map(|s| s.to_string())
    .or_else(|| env::var("NINE_ENV").ok())
    .or_else(|| env::var("APP_ENV").ok());

  let mut files_to_check: Vec<String> = Vec::new();
  if let Some(env_str) = &env_from_var {
    if !env_str.is_empty() {
      files_to_check.push(format!("{}.{}.{}", base_name, env_str.to_lowercase(), extension));
    }
  }
  files_to_check.push(format!("{}.{}", base_name, extension));

  for file_name in &files_to_check {
    let path = dir.join(file_name);
    if path.is_file() {
      return Ok(path);
    }
  }

  Err(Error::ConfigNotFound(format!(
    "Searched for: {:?} in {:?}. Provide a config file or check NINE_ENV/APP_ENV.",
    files_to_check, dir
  )))
}
