//! An immutable settings object built from configuration.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Frozen key-value settings.
///
/// Keys may be dotted paths (`"app.name"`) into nested objects. Once built,
/// a `Settings` value cannot be written to: [`set`](Self::set) always fails
/// with `Error::ImmutableViolation`. Use [`with`](Self::with) to derive a
/// modified copy instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
  values: BTreeMap<String, JsonValue>,
}

impl Settings {
  pub fn new(values: impl IntoIterator<Item = (String, JsonValue)>) -> Self {
    Self {
      values: values.into_iter().collect(),
    }
  }

  /// Looks up `key`, first as a top-level key, then as a dotted path.
  pub fn get(&self, key: &str) -> Option<&JsonValue> {
    if let Some(value) = self.values.get(key) {
      return Some(value);
    }
    let mut segments = key.split('.');
    let mut current = self.values.get(segments.next()?)?;
    for segment in segments {
      current = match current {
        JsonValue::Object(map) => map.get(segment)?,
        JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
        _ => return None,
      };
    }
    Some(current)
  }

  /// Deserializes the value at `key` into `T`.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
    self
      .get(key)
      .map(|value| {
        serde_json::from_value(value.clone())
          .map_err(|e| Error::ConfigParse(format!("setting '{}': {}", key, e)))
      })
      .transpose()
  }

  pub fn has(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// Top-level keys, sorted.
  pub fn keys(&self) -> Vec<&str> {
    self.values.keys().map(String::as_str).collect()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Always fails: settings are frozen once built.
  pub fn set(&self, key: &str, _value: JsonValue) -> Result<()> {
    Err(Error::ImmutableViolation(format!(
      "Setting '{}' is not allowed in an immutable settings object.",
      key
    )))
  }

  /// A copy of these settings with `key` replaced.
  pub fn with(&self, key: impl Into<String>, value: JsonValue) -> Self {
    let mut values = self.values.clone();
    values.insert(key.into(), value);
    Self { values }
  }
}
