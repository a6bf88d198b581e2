//! The build context handed to factories, and the contextual binding builder.

use crate::container::Container;
use crate::core::{Concrete, Value};
use crate::error::{Error, Result};
use crate::registry::Registry;
use std::any::Any;
use std::sync::Arc;

/// Context passed to a factory while it builds a concrete.
///
/// Lookups made through the context see the contextual bindings registered for
/// the concrete being built before they fall back to the registry's defaults.
///
/// ```
/// use nine_ioc::{Concrete, Container};
///
/// struct Database { url: String }
/// struct Users { db: std::sync::Arc<Database> }
///
/// let container = Container::new();
/// container.add("db", Concrete::instance(Database { url: "sqlite::memory:".into() })).unwrap();
/// container.add("users", Concrete::build(|ctx| Ok(Users { db: ctx.make("db")? }))).unwrap();
///
/// let users = container.make::<Users>("users").unwrap();
/// assert_eq!(users.db.url, "sqlite::memory:");
/// ```
pub struct Context<'a> {
  registry: &'a dyn Registry,
  container: Option<&'a Container>,
  concrete: &'a str,
}

impl<'a> Context<'a> {
  pub(crate) fn new(
    registry: &'a dyn Registry,
    container: Option<&'a Container>,
    concrete: &'a str,
  ) -> Self {
    Self {
      registry,
      container,
      concrete,
    }
  }

  /// The abstract currently being built.
  pub fn concrete(&self) -> &str {
    self.concrete
  }

  /// The registry the factory was registered on.
  pub fn registry(&self) -> &dyn Registry {
    self.registry
  }

  pub fn has(&self, abstract_name: &str) -> bool {
    let contextual = self
      .container
      .map_or(false, |c| c.has_contextual(self.concrete, abstract_name));
    contextual || self.registry.has(abstract_name)
  }

  pub fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    if let Some(container) = self.container {
      if let Some(value) = container.contextual_value(self.concrete, abstract_name)? {
        return Ok(Some(value));
      }
    }
    self.registry.get(abstract_name)
  }

  pub fn get_as<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Option<Arc<T>>> {
    self
      .get(abstract_name)?
      .map(|value| value.downcast_for::<T>(abstract_name))
      .transpose()
  }

  /// Resolves a required dependency, failing if it is missing.
  pub fn make<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Arc<T>> {
    self
      .get_as::<T>(abstract_name)?
      .ok_or_else(|| Error::AbstractNotFound(abstract_name.to_owned()))
  }
}

/// The implementation side of a contextual binding.
#[derive(Clone, Debug)]
pub(crate) enum Given {
  Concrete(Concrete),
  Abstract(String),
}

/// First step of `when(concrete).needs(abstract).give(implementation)`.
///
/// `give` only exists on the value returned by [`needs`](Self::needs), so a
/// binding without a target abstract cannot be expressed.
#[must_use = "a contextual binding is only recorded once `give` is called"]
pub struct ContextualBindingBuilder<'a> {
  container: &'a Container,
  concrete: String,
}

impl<'a> ContextualBindingBuilder<'a> {
  pub(crate) fn new(container: &'a Container, concrete: String) -> Self {
    Self {
      container,
      concrete,
    }
  }

  /// Define the abstract target that depends on the context.
  pub fn needs(self, abstract_name: impl Into<String>) -> ContextualNeeds<'a> {
    ContextualNeeds {
      container: self.container,
      concrete: self.concrete,
      needs: abstract_name.into(),
    }
  }
}

#[must_use = "a contextual binding is only recorded once `give` is called"]
pub struct ContextualNeeds<'a> {
  container: &'a Container,
  concrete: String,
  needs: String,
}

impl ContextualNeeds<'_> {
  /// Define the implementation for the contextual binding.
  pub fn give(self, implementation: Concrete) {
    self
      .container
      .add_contextual_binding(&self.concrete, &self.needs, Given::Concrete(implementation));
  }

  /// Satisfy the need with whatever another abstract resolves to.
  pub fn give_abstract(self, other: impl Into<String>) {
    self
      .container
      .add_contextual_binding(&self.concrete, &self.needs, Given::Abstract(other.into()));
  }
}
