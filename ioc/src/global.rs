//! The process-wide container instance and access functions.
//!
//! Prefer constructing a [`MultiContainer`] at startup and passing it to the
//! code that needs it. The global instance exists for code that cannot be
//! handed a container, and for the [`resolve!`](crate::resolve) macro.

use crate::error::{Error, Result};
use crate::multi::MultiContainer;
use once_cell::sync::OnceCell;
use tracing::debug;

// The one and only global container instance.
static GLOBAL_CONTAINER: OnceCell<MultiContainer> = OnceCell::new();

/// Provides a reference to the global container instance.
///
/// The first call constructs a default container unless one was installed
/// with [`install`]; every later call returns that same instance.
///
/// # Examples
///
/// ```
/// use nine_ioc::{global, Concrete};
///
/// fn register_services() {
///   global().add("greeting", Concrete::instance(String::from("Hello from global!"))).unwrap();
/// }
/// # register_services();
/// ```
pub fn global() -> &'static MultiContainer {
  GLOBAL_CONTAINER.get_or_init(|| {
    debug!("constructing the global container");
    MultiContainer::new()
  })
}

/// Installs `container` as the global instance.
///
/// Fails with `Error::ContainerConflict` once a global container exists,
/// whether it was installed or constructed by [`global`].
pub fn install(container: MultiContainer) -> Result<&'static MultiContainer> {
  GLOBAL_CONTAINER
    .set(container)
    .map_err(|_| Error::ContainerConflict("a global container already exists".to_string()))?;
  debug!("global container installed");
  Ok(global())
}

pub fn is_initialized() -> bool {
  GLOBAL_CONTAINER.get().is_some()
}
