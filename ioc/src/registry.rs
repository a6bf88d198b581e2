//! The narrow interface every member container exposes to the multiplexer.

use crate::core::{Abstract, Concrete, Value};
use crate::error::Result;

/// A container the [`MultiContainer`](crate::MultiContainer) can search.
///
/// Dependency containers and service locators both implement this trait;
/// the multiplexer only ever talks to its members through it.
pub trait Registry: Send + Sync {
  /// Reports whether `abstract_name` can be resolved here.
  fn has(&self, abstract_name: &str) -> bool;

  /// Resolves `abstract_name`.
  ///
  /// A miss is `Ok(None)` unless the registry is configured to raise, in which
  /// case it is `Err(Error::AbstractNotFound)`.
  fn get(&self, abstract_name: &str) -> Result<Option<Value>>;

  /// Registers `concrete` under `abstract_name`.
  fn add(&self, abstract_name: Abstract, concrete: Concrete, shared: bool) -> Result<()>;

  /// Drops every memoized instance. Registrations survive.
  fn forget_instances(&self);
}
