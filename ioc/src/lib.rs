//! # Nine IoC
//!
//! A multiplexing dependency-injection and service-location container.
//!
//! A [`MultiContainer`] aggregates a local binding registry with named groups
//! of *dependency containers* and *service locators*, and resolves abstract
//! names against them in a fixed priority order: local bindings first, then
//! dependency containers, then service locators, each group in registration
//! order.
//!
//! ## Core Concepts
//!
//! - **Abstract**: the name a dependency is registered and looked up under.
//!   `[class, alias]` pairs register under `class` and make `alias` point at it.
//! - **Concrete**: a pre-built instance or a factory. Factories are
//!   non-shared (a new instance per lookup) or shared (built once).
//! - **Registry**: the interface every member container implements.
//! - **Contextual binding**: `when(consumer).needs(abstract).give(..)`
//!   overrides what a factory sees while it builds `consumer`.
//!
//! ## Quick Start
//!
//! ```
//! use nine_ioc::{Concrete, Container, MultiContainer};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn name(&self) -> &str;
//! }
//!
//! struct FileLogger;
//! impl Logger for FileLogger {
//!     fn name(&self) -> &str { "file" }
//! }
//!
//! let nine = MultiContainer::new();
//!
//! // A dependency container registered after the built-in "nine" group.
//! let app = Arc::new(Container::new());
//! app.singleton("logger", Concrete::factory_trait::<dyn Logger>(|| Arc::new(FileLogger))).unwrap();
//! nine.add_dependency_container("app", app);
//!
//! let logger = nine.make::<dyn Logger>("logger").unwrap();
//! assert_eq!(logger.name(), "file");
//! assert!(Arc::ptr_eq(&logger, &nine.make::<dyn Logger>("logger").unwrap()));
//! ```

pub mod config;
mod container;
mod context;
mod core;
mod error;
mod global;
mod locator;
mod macros;
mod multi;
mod registry;
mod settings;

pub use crate::core::{Abstract, Concrete, FactoryFn, Value};
pub use config::ContainerConfig;
pub use container::Container;
pub use context::{Context, ContextualBindingBuilder, ContextualNeeds};
pub use error::{Error, Result};
pub use global::{global, install, is_initialized};
pub use locator::ServiceLocator;
pub use multi::{ContainerGroup, Member, MultiContainer, ALL_GROUPS, DEFAULT_GROUP};
pub use registry::Registry;
pub use settings::Settings;
