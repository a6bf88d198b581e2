use thiserror::Error;

/// The main error type for the `nine_ioc` library.
#[derive(Debug, Error)]
pub enum Error {
  #[error("add(['{class}', '{alias}'],...) makes no sense. `{alias}` must refer to an existing class.")]
  InvalidBinding { class: String, alias: String },

  #[error("Abstract {0} not found in any container.")]
  AbstractNotFound(String),

  #[error("Cannot continue due to a container instantiation conflict: {0}")]
  ContainerConflict(String),

  #[error("Immutable violation: {0}")]
  ImmutableViolation(String),

  #[error("Circular dependency detected while resolving: {0}")]
  CircularDependency(String),

  #[error("Abstract '{abstract_name}' holds a {found}, not a {expected}")]
  TypeMismatch {
    abstract_name: String,
    expected: &'static str,
    found: &'static str,
  },

  #[error("Factory for '{abstract_name}' failed: {message}")]
  Factory { abstract_name: String, message: String },

  #[error("Configuration file not found: {0}")]
  ConfigNotFound(String),

  #[error("Failed to read configuration file: {0}")]
  ConfigRead(#[from] std::io::Error),

  #[error("Failed to parse configuration: {0}")]
  ConfigParse(String),
}

impl Error {
  /// Wraps an arbitrary failure raised inside a factory.
  pub fn factory(abstract_name: impl Into<String>, message: impl ToString) -> Self {
    Error::Factory {
      abstract_name: abstract_name.into(),
      message: message.to_string(),
    }
  }
}

/// A specialized `Result` type for `nine_ioc` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
