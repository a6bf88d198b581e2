//! The multiplexing container: a local binding registry plus named groups of
//! dependency containers and service locators, searched in a fixed order.

use crate::config::ContainerConfig;
use crate::container::Container;
use crate::context::ContextualBindingBuilder;
use crate::core::{Abstract, Concrete, Value};
use crate::error::{Error, Result};
use crate::locator::ServiceLocator;
use crate::registry::Registry;
use crate::settings::Settings;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The group name the local container and the default service locator are
/// registered under.
pub const DEFAULT_GROUP: &str = "nine";

/// The pseudo-name that selects every member of both groups.
pub const ALL_GROUPS: &str = "*";

/// A named member of one of the two container groups.
pub type Member = (String, Arc<dyn Registry>);

/// The members matching a `container_group` query.
#[derive(Clone, Default)]
pub struct ContainerGroup {
  pub dependency: Vec<Member>,
  pub service: Vec<Member>,
}

impl ContainerGroup {
  pub fn is_empty(&self) -> bool {
    self.dependency.is_empty() && self.service.is_empty()
  }

  pub fn dependency_names(&self) -> Vec<&str> {
    self.dependency.iter().map(|(name, _)| name.as_str()).collect()
  }

  pub fn service_names(&self) -> Vec<&str> {
    self.service.iter().map(|(name, _)| name.as_str()).collect()
  }
}

impl fmt::Debug for ContainerGroup {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ContainerGroup")
      .field("dependency", &self.dependency_names())
      .field("service", &self.service_names())
      .finish()
  }
}

#[derive(Default)]
struct Groups {
  dependency: Vec<Member>,
  service: Vec<Member>,
}

/// Re-registering a name drops the old entry; the new one goes to the back.
fn replace_member(members: &mut Vec<Member>, name: &str, container: Arc<dyn Registry>) {
  members.retain(|(existing, _)| existing != name);
  members.push((name.to_owned(), container));
}

fn find_member(members: &[Member], name: &str) -> Option<Arc<dyn Registry>> {
  members
    .iter()
    .find(|(existing, _)| existing == name)
    .map(|(_, container)| container.clone())
}

/// First member (in registration order) that has `abstract_name`.
fn search(members: &[Member], group: &str, abstract_name: &str) -> Result<Option<Value>> {
  for (name, container) in members {
    if !container.has(abstract_name) {
      continue;
    }
    trace!(abstract_name, group, container = %name, "abstract found");
    if let Some(value) = container.get(abstract_name)? {
      return Ok(Some(value));
    }
  }
  Ok(None)
}

/// A multiplexing dependency-injection and service-location container.
///
/// Lookups search, in order:
///
/// 1. the local [`Container`];
/// 2. each dependency container, in registration order;
/// 3. each service locator, in registration order.
///
/// The first container that reports the abstract wins. A miss is `Ok(None)`
/// unless [`use_exceptions`](Self::use_exceptions) is on.
///
/// ```
/// use nine_ioc::{Concrete, MultiContainer, ServiceLocator};
/// use std::sync::Arc;
///
/// let nine = MultiContainer::new();
/// let services = Arc::new(ServiceLocator::new());
/// services.set("greeting", Concrete::instance("hello")).unwrap();
/// nine.add_service_container("app", services);
///
/// let greeting = nine.get_as::<&str>("greeting").unwrap().unwrap();
/// assert_eq!(*greeting, "hello");
/// ```
pub struct MultiContainer {
  local: Arc<Container>,
  groups: RwLock<Groups>,
  raise_on_miss: AtomicBool,
  default_group: String,
  services_shared: bool,
}

impl fmt::Debug for MultiContainer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let groups = self.groups.read();
    let names = |members: &[Member]| -> Vec<String> {
      members.iter().map(|(name, _)| name.clone()).collect()
    };
    f.debug_struct("MultiContainer")
      .field("default_group", &self.default_group)
      .field("local", &self.local.abstracts())
      .field("dependency", &names(&groups.dependency))
      .field("service", &names(&groups.service))
      .field("raise_on_miss", &self.raises_on_miss())
      .finish()
  }
}

impl Default for MultiContainer {
  fn default() -> Self {
    Self::with_group(DEFAULT_GROUP, true)
  }
}

impl MultiContainer {
  /// Creates a fresh container with the default group seeded.
  pub fn new() -> Self {
    Self::default()
  }

  fn with_group(default_group: &str, services_shared: bool) -> Self {
    let local = Arc::new(Container::new());
    let groups = Groups {
      dependency: vec![(default_group.to_owned(), local.clone() as Arc<dyn Registry>)],
      service: vec![(
        default_group.to_owned(),
        Arc::new(ServiceLocator::new()) as Arc<dyn Registry>,
      )],
    };
    Self {
      local,
      groups: RwLock::new(groups),
      raise_on_miss: AtomicBool::new(false),
      default_group: default_group.to_owned(),
      services_shared,
    }
  }

  /// Builds a container from configuration.
  ///
  /// Declared classes are added to the local class catalog and the settings
  /// are published as the shared service `"settings"`.
  pub fn with_config(config: &ContainerConfig) -> Result<Self> {
    let container = Self::with_group(&config.default_group, config.services_shared);
    container.use_exceptions(config.use_exceptions);
    for class in &config.classes {
      container.local.declare_class(class.clone());
    }
    let settings = Settings::new(config.settings.clone());
    container.add_service("settings", Concrete::instance(settings), true)?;
    debug!(
      group = %config.default_group,
      classes = config.classes.len(),
      use_exceptions = config.use_exceptions,
      "container configured"
    );
    Ok(container)
  }

  // --- PRIVATE HELPERS ---

  fn snapshot(&self) -> (Vec<Member>, Vec<Member>) {
    let groups = self.groups.read();
    (groups.dependency.clone(), groups.service.clone())
  }

  fn miss(&self, abstract_name: &str) -> Result<Option<Value>> {
    trace!(abstract_name, "abstract not found in any container");
    if self.raises_on_miss() {
      return Err(Error::AbstractNotFound(abstract_name.to_owned()));
    }
    Ok(None)
  }

  /// The default-group service locator, recreated if a reset removed it.
  fn default_services(&self) -> Arc<dyn Registry> {
    if let Some(existing) = find_member(&self.groups.read().service, &self.default_group) {
      return existing;
    }
    let mut groups = self.groups.write();
    // Another thread may have recreated it between the two locks.
    if let Some(existing) = find_member(&groups.service, &self.default_group) {
      return existing;
    }
    let created: Arc<dyn Registry> = Arc::new(ServiceLocator::new());
    groups.service.push((self.default_group.clone(), created.clone()));
    created
  }

  // --- PUBLIC API ---

  /// The local binding registry.
  pub fn local(&self) -> &Arc<Container> {
    &self.local
  }

  pub fn default_group(&self) -> &str {
    &self.default_group
  }

  /// Enable failing with `Error::AbstractNotFound` on a miss.
  pub fn use_exceptions(&self, enable: bool) {
    debug!(enable, "miss policy changed");
    self.raise_on_miss.store(enable, Ordering::Relaxed);
  }

  pub fn raises_on_miss(&self) -> bool {
    self.raise_on_miss.load(Ordering::Relaxed)
  }

  // --- Registration ---

  /// Add (bind) an abstract on the local container.
  ///
  /// Instances are recorded as-is, factories as non-shared bindings. A
  /// `[class, alias]` abstract requires `class` to be declared.
  pub fn add(&self, abstract_name: impl Into<Abstract>, concrete: Concrete) -> Result<()> {
    self.local.add(abstract_name, concrete)
  }

  pub fn bind(
    &self,
    abstract_name: impl Into<Abstract>,
    concrete: Concrete,
    shared: bool,
  ) -> Result<()> {
    self.local.bind(abstract_name, concrete, shared)
  }

  pub fn singleton(&self, abstract_name: impl Into<Abstract>, concrete: Concrete) -> Result<()> {
    self.local.singleton(abstract_name, concrete)
  }

  /// Pseudonym for [`bind`](Self::bind).
  pub fn set(&self, abstract_name: impl Into<Abstract>, concrete: Concrete, shared: bool) -> Result<()> {
    self.bind(abstract_name, concrete, shared)
  }

  /// Declare a loadable class on the local container.
  pub fn declare_class(&self, class: impl Into<String>) {
    self.local.declare_class(class);
  }

  /// Register on the default-group dependency container.
  pub fn add_dependency(
    &self,
    abstract_name: impl Into<Abstract>,
    concrete: Concrete,
    shared: bool,
  ) -> Result<()> {
    let target = find_member(&self.groups.read().dependency, &self.default_group);
    match target {
      Some(container) => container.add(abstract_name.into(), concrete, shared),
      None => self.local.bind(abstract_name, concrete, shared),
    }
  }

  /// Register on the default-group service locator.
  ///
  /// A `[class, alias]` key requires `class` to be declared on the local
  /// container.
  pub fn add_service(&self, key: impl Into<Abstract>, concrete: Concrete, shared: bool) -> Result<()> {
    let key = key.into();
    if let Abstract::Aliased { class, alias } = &key {
      if !self.local.class_exists(class) {
        return Err(Error::InvalidBinding {
          class: class.clone(),
          alias: alias.clone(),
        });
      }
    }
    self.default_services().add(key, concrete, shared)
  }

  /// Register on the default-group service locator with the configured
  /// default sharing.
  pub fn put_service(&self, key: impl Into<Abstract>, concrete: Concrete) -> Result<()> {
    self.add_service(key, concrete, self.services_shared)
  }

  pub fn add_dependency_container<R: Registry + 'static>(&self, name: &str, container: Arc<R>) {
    debug!(name, "dependency container registered");
    replace_member(&mut self.groups.write().dependency, name, container);
  }

  pub fn add_service_container<R: Registry + 'static>(&self, name: &str, container: Arc<R>) {
    debug!(name, "service container registered");
    replace_member(&mut self.groups.write().service, name, container);
  }

  // --- Container Groups ---

  pub fn dependency_container(&self, name: &str) -> Option<Arc<dyn Registry>> {
    find_member(&self.groups.read().dependency, name)
  }

  pub fn service_container(&self, name: &str) -> Option<Arc<dyn Registry>> {
    find_member(&self.groups.read().service, name)
  }

  /// The dependency and service containers registered under `name`.
  ///
  /// `"*"` returns every member of both groups, in registration order.
  pub fn container_group(&self, name: &str) -> ContainerGroup {
    let (dependency, service) = self.snapshot();
    if name == ALL_GROUPS {
      return ContainerGroup { dependency, service };
    }
    let only = |members: Vec<Member>| -> Vec<Member> {
      members.into_iter().filter(|(existing, _)| existing == name).collect()
    };
    ContainerGroup {
      dependency: only(dependency),
      service: only(service),
    }
  }

  // --- Lookup ---

  /// Report whether any container has the abstract.
  pub fn has(&self, abstract_name: &str) -> bool {
    if self.local.has(abstract_name) {
      return true;
    }
    let (dependency, service) = self.snapshot();
    dependency
      .iter()
      .chain(service.iter())
      .any(|(_, container)| container.has(abstract_name))
  }

  /// Report whether the local container has the abstract.
  pub fn exists(&self, abstract_name: &str) -> bool {
    self.local.has(abstract_name)
  }

  /// Retrieve a concrete, searching every container.
  pub fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    if self.local.has(abstract_name) {
      trace!(abstract_name, "abstract found locally");
      if let Some(value) = self.local.get(abstract_name)? {
        return Ok(Some(value));
      }
    }

    let (dependency, service) = self.snapshot();
    if let Some(value) = search(&dependency, "dependency", abstract_name)? {
      return Ok(Some(value));
    }
    if let Some(value) = search(&service, "service", abstract_name)? {
      return Ok(Some(value));
    }
    self.miss(abstract_name)
  }

  pub fn get_as<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Option<Arc<T>>> {
    self
      .get(abstract_name)?
      .map(|value| value.downcast_for::<T>(abstract_name))
      .transpose()
  }

  /// Like [`get`](Self::get), but a miss always fails.
  pub fn find(&self, abstract_name: &str) -> Result<Value> {
    self
      .get(abstract_name)?
      .ok_or_else(|| Error::AbstractNotFound(abstract_name.to_owned()))
  }

  /// Typed [`find`](Self::find).
  pub fn make<T: ?Sized + Any + Send + Sync>(&self, abstract_name: &str) -> Result<Arc<T>> {
    self.find(abstract_name)?.downcast_for::<T>(abstract_name)
  }

  pub fn has_dependency(&self, abstract_name: &str) -> bool {
    let (dependency, _) = self.snapshot();
    dependency.iter().any(|(_, container)| container.has(abstract_name))
  }

  /// Search the dependency containers only.
  pub fn get_dependency(&self, abstract_name: &str) -> Result<Option<Value>> {
    let (dependency, _) = self.snapshot();
    match search(&dependency, "dependency", abstract_name)? {
      Some(value) => Ok(Some(value)),
      None => self.miss(abstract_name),
    }
  }

  pub fn has_service(&self, abstract_name: &str) -> bool {
    let (_, service) = self.snapshot();
    service.iter().any(|(_, container)| container.has(abstract_name))
  }

  /// Search the service locators only.
  pub fn get_service(&self, abstract_name: &str) -> Result<Option<Value>> {
    let (_, service) = self.snapshot();
    match search(&service, "service", abstract_name)? {
      Some(value) => Ok(Some(value)),
      None => self.miss(abstract_name),
    }
  }

  // --- Contextual Bindings ---

  /// Start a contextual binding on the local container.
  pub fn when(&self, concrete: &str) -> ContextualBindingBuilder<'_> {
    self.local.when(concrete)
  }

  // --- Lifecycle ---

  /// Forget every cached instance and empty both container groups.
  ///
  /// Meant for test teardown: shared instances other code still holds are
  /// no longer the ones the container hands out.
  pub fn reset(&self) {
    let mut groups = self.groups.write();
    // The seeded default-group members alone do not make it populated.
    let added = groups
      .dependency
      .iter()
      .chain(groups.service.iter())
      .filter(|(name, _)| *name != self.default_group)
      .count();
    let bindings = self.local.abstracts().len();
    if added > 0 || bindings > 0 {
      warn!(members = added, bindings, "resetting a populated container");
    } else {
      debug!("resetting container");
    }
    for (_, container) in groups.dependency.iter().chain(groups.service.iter()) {
      container.forget_instances();
    }
    groups.dependency.clear();
    groups.service.clear();
    self.local.flush();
  }
}

impl Registry for MultiContainer {
  fn has(&self, abstract_name: &str) -> bool {
    MultiContainer::has(self, abstract_name)
  }

  fn get(&self, abstract_name: &str) -> Result<Option<Value>> {
    MultiContainer::get(self, abstract_name)
  }

  fn add(&self, abstract_name: Abstract, concrete: Concrete, shared: bool) -> Result<()> {
    self.local.bind(abstract_name, concrete, shared)
  }

  fn forget_instances(&self) {
    let (dependency, service) = self.snapshot();
    for (_, container) in dependency.iter().chain(service.iter()) {
      container.forget_instances();
    }
    self.local.forget_instances();
  }
}
