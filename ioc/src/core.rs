//! Core data structures shared by every registry in the crate.

use crate::context::Context;
use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

thread_local! {
  // Registry entries currently being built on this thread, keyed by registry id.
  static RESOLVING_STACK: RefCell<HashSet<(usize, String)>> = RefCell::new(HashSet::new());
}

static NEXT_REGISTRY_ID: AtomicUsize = AtomicUsize::new(1);

pub(crate) fn next_registry_id() -> usize {
  NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)
}

/// An RAII guard to detect circular dependencies.
///
/// Creating the guard records `(registry, abstract)` in a thread-local set and
/// fails if the pair is already there. Dropping it removes the pair again.
pub(crate) struct ResolutionGuard {
  key: (usize, String),
}

impl ResolutionGuard {
  pub(crate) fn new(registry: usize, abstract_name: &str) -> Result<Self> {
    let key = (registry, abstract_name.to_owned());
    let inserted = RESOLVING_STACK.with(|stack| stack.borrow_mut().insert(key.clone()));
    if !inserted {
      return Err(Error::CircularDependency(abstract_name.to_owned()));
    }
    Ok(Self { key })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      stack.borrow_mut().remove(&self.key);
    });
  }
}

/// A type-erased, cheaply clonable handle to a resolved concrete.
///
/// The handle stores an `Arc<T>` internally, so it can carry trait objects
/// (`Arc<dyn Trait>`) as well as sized values. Clones of the same handle
/// downcast to pointer-equal `Arc`s.
#[derive(Clone)]
pub struct Value {
  inner: Arc<dyn Any + Send + Sync>,
  type_name: &'static str,
}

impl Value {
  pub fn new<T: Any + Send + Sync>(value: T) -> Self {
    Self::from_arc(Arc::new(value))
  }

  /// Wraps an existing `Arc`, keeping its identity.
  pub fn from_arc<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Self {
      inner: Arc::new(value),
      type_name: type_name::<T>(),
    }
  }

  /// Returns the stored `Arc<T>` if the value was created with type `T`.
  pub fn downcast<T: ?Sized + Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.downcast_ref::<Arc<T>>().cloned()
  }

  pub fn is<T: ?Sized + Any + Send + Sync>(&self) -> bool {
    self.inner.is::<Arc<T>>()
  }

  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  /// True when both handles point at the same instance.
  pub fn ptr_eq(&self, other: &Value) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }

  pub(crate) fn downcast_for<T: ?Sized + Any + Send + Sync>(
    &self,
    abstract_name: &str,
  ) -> Result<Arc<T>> {
    self.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
      abstract_name: abstract_name.to_owned(),
      expected: type_name::<T>(),
      found: self.type_name,
    })
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Value({})", self.type_name)
  }
}

/// The name a concrete is registered under.
///
/// `Aliased` is the `[class, alias]` form: the binding is stored under `class`,
/// which must be a loadable type, and `alias` is made to point at it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Abstract {
  Name(String),
  Aliased { class: String, alias: String },
}

impl Abstract {
  pub fn aliased(class: impl Into<String>, alias: impl Into<String>) -> Self {
    Abstract::Aliased {
      class: class.into(),
      alias: alias.into(),
    }
  }

  /// The canonical name the binding is stored under.
  pub fn name(&self) -> &str {
    match self {
      Abstract::Name(name) => name,
      Abstract::Aliased { class, .. } => class,
    }
  }

  pub fn alias(&self) -> Option<&str> {
    match self {
      Abstract::Name(_) => None,
      Abstract::Aliased { alias, .. } => Some(alias),
    }
  }
}

impl From<&str> for Abstract {
  fn from(name: &str) -> Self {
    Abstract::Name(name.to_owned())
  }
}

impl From<String> for Abstract {
  fn from(name: String) -> Self {
    Abstract::Name(name)
  }
}

impl From<&String> for Abstract {
  fn from(name: &String) -> Self {
    Abstract::Name(name.clone())
  }
}

impl From<[&str; 1]> for Abstract {
  fn from([name]: [&str; 1]) -> Self {
    Abstract::Name(name.to_owned())
  }
}

impl From<[&str; 2]> for Abstract {
  fn from([class, alias]: [&str; 2]) -> Self {
    Abstract::aliased(class, alias)
  }
}

impl From<(&str, &str)> for Abstract {
  fn from((class, alias): (&str, &str)) -> Self {
    Abstract::aliased(class, alias)
  }
}

impl fmt::Display for Abstract {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Abstract::Name(name) => f.write_str(name),
      Abstract::Aliased { class, alias } => write!(f, "[{}, {}]", class, alias),
    }
  }
}

/// The erased factory signature every registry stores.
pub type FactoryFn = dyn Fn(&Context<'_>) -> Result<Value> + Send + Sync;

pub(crate) fn erase<F>(factory: F) -> Arc<FactoryFn>
where
  F: Fn(&Context<'_>) -> Result<Value> + Send + Sync + 'static,
{
  Arc::new(factory)
}

/// What an abstract is bound to: a pre-built instance or a factory.
#[derive(Clone)]
pub enum Concrete {
  Instance(Value),
  Factory(Arc<FactoryFn>),
}

impl Concrete {
  pub fn instance<T: Any + Send + Sync>(value: T) -> Self {
    Concrete::Instance(Value::new(value))
  }

  /// An instance given as an `Arc`, e.g. `Arc<dyn Trait>`.
  pub fn shared<T: ?Sized + Any + Send + Sync>(value: Arc<T>) -> Self {
    Concrete::Instance(Value::from_arc(value))
  }

  /// A factory that needs nothing from the container.
  pub fn factory<T: Any + Send + Sync>(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
    Concrete::Factory(erase(move |_| Ok(Value::new(factory()))))
  }

  /// A factory producing a trait object.
  pub fn factory_trait<I: ?Sized + Any + Send + Sync>(
    factory: impl Fn() -> Arc<I> + Send + Sync + 'static,
  ) -> Self {
    Concrete::Factory(erase(move |_| Ok(Value::from_arc(factory()))))
  }

  /// A factory that resolves its own dependencies through the build context.
  pub fn build<T: Any + Send + Sync>(
    factory: impl Fn(&Context<'_>) -> Result<T> + Send + Sync + 'static,
  ) -> Self {
    Concrete::Factory(erase(move |ctx| factory(ctx).map(Value::new)))
  }

  pub fn build_trait<I: ?Sized + Any + Send + Sync>(
    factory: impl Fn(&Context<'_>) -> Result<Arc<I>> + Send + Sync + 'static,
  ) -> Self {
    Concrete::Factory(erase(move |ctx| factory(ctx).map(Value::from_arc)))
  }

  /// A factory working directly on type-erased values.
  pub fn raw(factory: impl Fn(&Context<'_>) -> Result<Value> + Send + Sync + 'static) -> Self {
    Concrete::Factory(erase(factory))
  }

  pub fn is_factory(&self) -> bool {
    matches!(self, Concrete::Factory(_))
  }
}

impl From<Value> for Concrete {
  fn from(value: Value) -> Self {
    Concrete::Instance(value)
  }
}

impl fmt::Debug for Concrete {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Concrete::Instance(value) => f.debug_tuple("Instance").field(value).finish(),
      Concrete::Factory(_) => f.write_str("Factory(..)"),
    }
  }
}

/// A stored binding. Shared factories memoize into their cell.
#[derive(Clone)]
pub(crate) enum Binding {
  Instance(Value),
  Factory {
    factory: Arc<FactoryFn>,
    shared: Option<Arc<OnceCell<Value>>>,
  },
}

impl Binding {
  pub(crate) fn new(concrete: Concrete, shared: bool) -> Self {
    match concrete {
      Concrete::Instance(value) => Binding::Instance(value),
      Concrete::Factory(factory) => Binding::Factory {
        factory,
        shared: shared.then(|| Arc::new(OnceCell::new())),
      },
    }
  }

  /// Produces the bound value, running the factory under a cycle guard.
  ///
  /// The guard is taken before entering a shared cell: re-entering a
  /// `OnceCell` that is still initializing would deadlock.
  pub(crate) fn resolve(
    &self,
    registry: usize,
    abstract_name: &str,
    ctx: &Context<'_>,
  ) -> Result<Value> {
    match self {
      Binding::Instance(value) => Ok(value.clone()),
      Binding::Factory {
        factory,
        shared: None,
      } => {
        let _guard = ResolutionGuard::new(registry, abstract_name)?;
        factory(ctx)
      }
      Binding::Factory {
        factory,
        shared: Some(cell),
      } => {
        if let Some(value) = cell.get() {
          return Ok(value.clone());
        }
        let _guard = ResolutionGuard::new(registry, abstract_name)?;
        cell.get_or_try_init(|| factory(ctx)).cloned()
      }
    }
  }

  /// True when a resolution would return an already existing instance.
  pub(crate) fn is_instantiated(&self) -> bool {
    match self {
      Binding::Instance(_) => true,
      Binding::Factory { shared, .. } => shared.as_ref().map_or(false, |cell| cell.get().is_some()),
    }
  }

  pub(crate) fn is_shared(&self) -> bool {
    !matches!(self, Binding::Factory { shared: None, .. })
  }

  /// The same binding without memoization; instances are kept as they are.
  pub(crate) fn unmemoized(&self) -> Self {
    match self {
      Binding::Instance(value) => Binding::Instance(value.clone()),
      Binding::Factory { factory, .. } => Binding::Factory {
        factory: factory.clone(),
        shared: None,
      },
    }
  }

  /// A copy of this binding with any memoized instance dropped.
  pub(crate) fn forgotten(&self) -> Option<Self> {
    match self {
      Binding::Instance(_) => None,
      Binding::Factory { factory, shared } => Some(Binding::Factory {
        factory: factory.clone(),
        shared: shared.as_ref().map(|_| Arc::new(OnceCell::new())),
      }),
    }
  }
}
