//! A key-value service locator with shared and factory services.

use crate::context::Context;
use crate::core::{erase, next_registry_id, Abstract, Binding, Concrete, Value};
use crate::error::{Error, Result};
use crate::registry::Registry;
use dashmap::{DashMap, DashSet};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, trace};

/// A service locator.
///
/// Services are plain values, shared services (the factory runs once and the
/// result is kept) or factories (a new value on every lookup). A shared
/// service becomes *frozen* the first time it is resolved; after that it can
/// no longer be redefined or extended until it is removed.
///
/// Factories receive a [`Context`] over the locator, so one service can be
/// built from others.
pub struct ServiceLocator {
  id: usize,
  services: DashMap<String, Binding>,
  frozen: DashSet<String>,
}

impl Default for ServiceLocator {
  fn default() -> Self {
    Self {
      id: next_registry_id(),
      services: DashMap::new(),
      frozen: DashSet::new(),
    }
  }
}

impl ServiceLocator {
  pub fn new() -> Self {
    Self::default()
  }

  fn ensure_unfrozen(&self, key: &str) -> Result<()> {
    if self.frozen.contains(key) {
      return Err(Error::ImmutableViolation(format!(
        "Cannot override frozen service \"{}\".",
        key
      )));
    }
    Ok(())
  }

  fn define(&self, key: &str, service: Binding) -> Result<()> {
    self.ensure_unfrozen(key)?;
    debug!(key, shared = service.is_shared(), "service defined");
    self.services.insert(key.to_owned(), service);
    Ok(())
  }

  /// Define a value or a shared service.
  pub fn set(&self, key: &str, concrete: Concrete) -> Result<()> {
    self.define(key, Binding::new(concrete, true))
  }

  /// Define a service that is built anew on every lookup.
  pub fn factory(&self, key: &str, concrete: Concrete) -> Result<()> {
    self.define(key, Binding::new(concrete, false))
  }

  /// Wrap an existing service definition.
  ///
  /// `extender` receives the value the previous definition produces. The
  /// wrapped service keeps the previous one's sharing; a plain value becomes
  /// a shared service.
  pub fn extend(
    &self,
    key: &str,
    extender: impl Fn(Value, &Context<'_>) -> Result<Value> + Send + Sync + 'static,
  ) -> Result<()> {
    let previous = self
      .services
      .get(key)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::AbstractNotFound(key.to_owned()))?;
    self.ensure_unfrozen(key)?;

    let shared = previous.is_shared();
    // The wrapper memoizes; an inner cell would outlive `forget_instances`.
    let previous = previous.unmemoized();
    let locator_id = self.id;
    // Each layer gets its own guard key so stacked extensions are not a cycle.
    let inner_key = format!("{}#{}", key, next_registry_id());
    let wrapped = erase(move |ctx| {
      let value = previous.resolve(locator_id, &inner_key, ctx)?;
      extender(value, ctx)
    });
    debug!(key, "service extended");
    self
      .services
      .insert(key.to_owned(), Binding::new(Concrete::Factory(wrapped), shared));
    Ok(())
  }

  /// Remove a service, unfreezing its key.
  pub fn remove(&self, key: &str) -> bool {
    self.frozen.remove(key);
    self.services.remove(key).is_some()
  }

  pub fn has(&self, key: &str) -> bool {
    self.services.contains_key(key)
  }

  pub fn is_frozen(&self, key: &str) -> bool {
    self.frozen.contains(key)
  }

  pub fn keys(&self) -> Vec<String> {
    let mut keys: Vec<String> = self.services.iter().map(|entry| entry.key().clone()).collect();
    keys.sort();
    keys
  }

  pub fn get(&self, key: &str) -> Result<Option<Value>> {
    let service = match self.services.get(key) {
      Some(entry) => entry.value().clone(),
      None => {
        trace!(key, "service not defined");
        return Ok(None);
      }
    };

    let ctx = Context::new(self, None, key);
    let value = service.resolve(self.id, key, &ctx)?;
    if matches!(service, Binding::Factory { shared: Some(_), .. }) {
      self.frozen.insert(key.to_owned());
    }
    Ok(Some(value))
  }

  pub fn get_as<T: ?Sized + Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
    self
      .get(key)?
      .map(|value| value.downcast_for::<T>(key))
      .transpose()
  }

  /// Drops memoized services and unfreezes every key.
  pub fn forget_instances(&self) {
    let renewed: Vec<(String, Binding)> = self
      .services
      .iter()
      .filter_map(|entry| entry.value().forgotten().map(|fresh| (entry.key().clone(), fresh)))
      .collect();
    for (key, fresh) in renewed {
      self.services.insert(key, fresh);
    }
    self.frozen.clear();
  }
}

impl Registry for ServiceLocator {
  fn has(&self, abstract_name: &str) -> bool {
    ServiceLocator::has(self, abstract_name)
  }

  fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    ServiceLocator::get(self, abstract_name)
  }

  /// Keys are flat here: an `[class, alias]` abstract defines the service
  /// under both names, sharing one instance.
  fn add(&self, abstract_name: Abstract, concrete: Concrete, shared: bool) -> Result<()> {
    let service = Binding::new(concrete, shared);
    if let Some(alias) = abstract_name.alias() {
      self.ensure_unfrozen(abstract_name.name())?;
      self.define(alias, service.clone())?;
    }
    self.define(abstract_name.name(), service)
  }

  fn forget_instances(&self) {
    ServiceLocator::forget_instances(self)
  }
}
