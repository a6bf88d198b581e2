//! The binding registry: the `Container` struct and its associated methods.

use crate::context::{Context, ContextualBindingBuilder, Given};
use crate::core::{next_registry_id, Abstract, Binding, Concrete, ResolutionGuard, Value};
use crate::error::{Error, Result};
use crate::registry::Registry;
use dashmap::{DashMap, DashSet};
use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// The binding registry.
///
/// Holds `abstract -> binding` mappings, aliases, contextual bindings and the
/// catalog of loadable class names used to validate `[class, alias]`
/// registrations. It is thread-safe and registrations may happen at any
/// point in the application's lifecycle.
pub struct Container {
  id: usize,
  bindings: DashMap<String, Binding>,
  aliases: DashMap<String, String>,
  contextual: DashMap<(String, String), Given>,
  classes: DashSet<String>,
  raise_on_miss: AtomicBool,
}

impl Default for Container {
  fn default() -> Self {
    Self {
      id: next_registry_id(),
      bindings: DashMap::new(),
      aliases: DashMap::new(),
      contextual: DashMap::new(),
      classes: DashSet::new(),
      raise_on_miss: AtomicBool::new(false),
    }
  }
}

impl Container {
  /// Creates a new, empty `Container`.
  pub fn new() -> Self {
    Self::default()
  }

  // --- PRIVATE HELPERS ---

  fn register(&self, abstract_name: Abstract, concrete: Concrete, shared: bool) -> Result<()> {
    if let Abstract::Aliased { class, alias } = &abstract_name {
      if !self.class_exists(class) {
        return Err(Error::InvalidBinding {
          class: class.clone(),
          alias: alias.clone(),
        });
      }
    }

    let name = abstract_name.name().to_owned();
    // A direct registration takes the name back from any alias using it.
    self.aliases.remove(&name);

    debug!(
      abstract_name = %abstract_name,
      factory = concrete.is_factory(),
      shared,
      "binding registered"
    );
    self.bindings.insert(name.clone(), Binding::new(concrete, shared));

    if let Some(alias) = abstract_name.alias() {
      self.aliases.insert(alias.to_owned(), name);
    }
    Ok(())
  }

  /// Follows the alias chain to the name a binding is stored under.
  pub(crate) fn canonical(&self, abstract_name: &str) -> String {
    let mut name = abstract_name.to_owned();
    // Bounded so an alias cycle cannot spin forever.
    for _ in 0..=self.aliases.len() {
      match self.aliases.get(&name) {
        Some(target) => name = target.value().clone(),
        None => break,
      }
    }
    name
  }

  fn binding(&self, canonical: &str) -> Option<Binding> {
    // Cloned out so no shard lock is held while a factory runs.
    self.bindings.get(canonical).map(|entry| entry.value().clone())
  }

  fn miss(&self, abstract_name: &str) -> Result<Option<Value>> {
    trace!(abstract_name, "abstract not bound");
    if self.raises_on_miss() {
      return Err(Error::AbstractNotFound(abstract_name.to_owned()));
    }
    Ok(None)
  }

  // --- PUBLIC API ---

  // --- Configuration ---

  /// Switch between returning `None` and failing with
  /// `Error::AbstractNotFound` when an abstract is not bound.
  pub fn use_exceptions(&self, enable: bool) {
    self.raise_on_miss.store(enable, Ordering::Relaxed);
  }

  pub fn raises_on_miss(&self) -> bool {
    self.raise_on_miss.load(Ordering::Relaxed)
  }

  // --- Class Catalog ---

  /// Declares `class` as a loadable type usable in `[class, alias]` pairs.
  pub fn declare_class(&self, class: impl Into<String>) {
    self.classes.insert(class.into());
  }

  /// Declares the Rust type `T` as loadable; returns the name it is known by.
  pub fn declare<T: ?Sized + Any>(&self) -> &'static str {
    let name = type_name::<T>();
    self.classes.insert(name.to_owned());
    name
  }

  pub fn class_exists(&self, class: &str) -> bool {
    self.classes.contains(class)
  }

  // --- Registration ---

  /// Add an abstract. Instances are recorded as-is, factories as
  /// non-shared bindings.
  pub fn add(&self, abstract_name: impl Into<Abstract>, concrete: Concrete) -> Result<()> {
    self.register(abstract_name.into(), concrete, false)
  }

  pub fn bind(
    &self,
    abstract_name: impl Into<Abstract>,
    concrete: Concrete,
    shared: bool,
  ) -> Result<()> {
    self.register(abstract_name.into(), concrete, shared)
  }

  /// Bind a factory that runs at most once.
  pub fn singleton(&self, abstract_name: impl Into<Abstract>, concrete: Concrete) -> Result<()> {
    self.register(abstract_name.into(), concrete, true)
  }

  /// Register under the Rust type `T`'s name, aliased as `alias`.
  ///
  /// The class always exists here, so this never fails validation.
  pub fn add_typed<T: ?Sized + Any>(&self, alias: &str, concrete: Concrete, shared: bool) -> Result<()> {
    let class = self.declare::<T>();
    self.register(Abstract::aliased(class, alias), concrete, shared)
  }

  /// Makes `alias` resolve to whatever `abstract_name` resolves to.
  pub fn alias(&self, abstract_name: &str, alias: &str) {
    debug!(abstract_name, alias, "alias registered");
    self.aliases.insert(alias.to_owned(), abstract_name.to_owned());
  }

  /// Removes a binding and any aliases pointing at it.
  pub fn forget(&self, abstract_name: &str) -> bool {
    let canonical = self.canonical(abstract_name);
    self.aliases.retain(|_, target| *target != canonical);
    self.bindings.remove(&canonical).is_some()
  }

  /// Drops pre-built instances and memoized shared instances.
  pub fn forget_instances(&self) {
    let mut dropped = Vec::new();
    let mut renewed = Vec::new();
    for entry in self.bindings.iter() {
      match entry.value().forgotten() {
        Some(fresh) => renewed.push((entry.key().clone(), fresh)),
        None => dropped.push(entry.key().clone()),
      }
    }
    for name in dropped {
      self.bindings.remove(&name);
    }
    for (name, fresh) in renewed {
      self.bindings.insert(name, fresh);
    }
    debug!("container instances forgotten");
  }

  /// Drops everything: bindings, aliases, contextual bindings.
  ///
  /// The class catalog is kept; it describes types, not registrations.
  pub fn flush(&self) {
    debug!(bindings = self.bindings.len(), "container flushed");
    self.bindings.clear();
    self.aliases.clear();
    self.contextual.clear();
  }

  // --- Contextual Bindings ---

  /// Start a contextual binding for the factory building `concrete`.
  pub fn when(&self, concrete: &str) -> ContextualBindingBuilder<'_> {
    ContextualBindingBuilder::new(self, self.canonical(concrete))
  }

  pub(crate) fn add_contextual_binding(&self, concrete: &str, needs: &str, given: Given) {
    let needs = self.canonical(needs);
    debug!(concrete, needs = %needs, "contextual binding registered");
    self
      .contextual
      .insert((concrete.to_owned(), needs), given);
  }

  pub(crate) fn has_contextual(&self, concrete: &str, needs: &str) -> bool {
    self
      .contextual
      .contains_key(&(concrete.to_owned(), self.canonical(needs)))
  }

  /// Resolves the override `concrete` declared for `needs`, if any.
  pub(crate) fn contextual_value(&self, concrete: &str, needs: &str) -> Result<Option<Value>> {
    let needs = self.canonical(needs);
    let given = match self.contextual.get(&(concrete.to_owned(), needs.clone())) {
      Some(entry) => entry.value().clone(),
      None => return Ok(None),
    };
    trace!(concrete, needs = %needs, "using contextual binding");

    match given {
      Given::Concrete(Concrete::Instance(value)) => Ok(Some(value)),
      Given::Concrete(Concrete::Factory(factory)) => {
        let _guard = ResolutionGuard::new(self.id, &format!("{} <- {}", needs, concrete))?;
        let ctx = Context::new(self, Some(self), &needs);
        factory(&ctx).map(Some)
      }
      Given::Abstract(other) => self
        .get(&other)?
        .map(Some)
        .ok_or(Error::AbstractNotFound(other)),
    }
  }

  // --- Inspection ---

  /// Report whether an abstract (or an alias of one) is bound.
  pub fn has(&self, abstract_name: &str) -> bool {
    self.bindings.contains_key(&self.canonical(abstract_name))
  }

  pub fn is_alias(&self, name: &str) -> bool {
    self.aliases.contains_key(name)
  }

  pub fn is_shared(&self, abstract_name: &str) -> bool {
    self
      .binding(&self.canonical(abstract_name))
      .map_or(false, |binding| binding.is_shared())
  }

  pub fn aliases(&self) -> HashMap<String, String> {
    self
      .aliases
      .iter()
      .map(|entry| (entry.key().clone(), entry.value().clone()))
      .collect()
  }

  /// Names of the bindings that currently hold a built instance.
  pub fn instances(&self) -> Vec<String> {
    let mut names: Vec<String> = self
      .bindings
      .iter()
      .filter(|entry| entry.value().is_instantiated())
      .map(|entry| entry.key().clone())
      .collect();
    names.sort();
    names
  }

  pub fn abstracts(&self) -> Vec<String> {
    let mut names: Vec<String> = self.bindings.iter().map(|entry| entry.key().clone()).collect();
    names.sort();
    names
  }

  // --- Resolution ---

  /// Retrieve a concrete from the container.
  pub fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    let canonical = self.canonical(abstract_name);
    let binding = match self.binding(&canonical) {
      Some(binding) => binding,
      None => return self.miss(abstract_name),
    };

    trace!(abstract_name, canonical = %canonical, "resolving binding");
    let ctx = Context::new(self, Some(self), &canonical);
    binding.resolve(self.id, &canonical, &ctx).map(Some)
  }

  pub fn get_as<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Option<Arc<T>>> {
    self
      .get(abstract_name)?
      .map(|value| value.downcast_for::<T>(abstract_name))
      .transpose()
  }

  /// Resolve a required abstract; a miss always fails.
  pub fn make<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Arc<T>> {
    self
      .get_as::<T>(abstract_name)?
      .ok_or_else(|| Error::AbstractNotFound(abstract_name.to_owned()))
  }
}

impl Registry for Container {
  fn has(&self, abstract_name: &str) -> bool {
    Container::has(self, abstract_name)
  }

  fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    Container::get(self, abstract_name)
  }

  fn add(&self, abstract_name: Abstract, concrete: Concrete, shared: bool) -> Result<()> {
    self.register(abstract_name, concrete, shared)
  }

  fn forget_instances(&self) {
    Container::forget_instances(self)
  }
}
