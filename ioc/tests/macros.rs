//! Tests for the global container and the `resolve!` macro.
//!
//! Every test in this file shares one process-wide container, so they run
//! serially and use distinct abstract names.

use nine_ioc::{global, install, is_initialized, resolve, Concrete, Error, MultiContainer};
use serial_test::serial;
use std::sync::Arc;

// --- Test Fixtures ---

struct HealthCheck {
  value: i32,
}
trait Probe: Send + Sync {
  fn value(&self) -> i32;
}
impl Probe for HealthCheck {
  fn value(&self) -> i32 {
    self.value
  }
}

// --- Global Container ---

#[test]
#[serial]
fn test_global_is_a_single_instance() {
  let first = global();
  let second = global();
  assert!(std::ptr::eq(first, second));
  assert!(is_initialized());
}

#[test]
#[serial]
fn test_install_after_initialization_conflicts() {
  global();
  let err = install(MultiContainer::new()).unwrap_err();
  assert!(matches!(err, Error::ContainerConflict(_)));
}

#[test]
#[serial]
fn test_global_registrations_are_visible_everywhere() {
  global()
    .add("macro_greeting", Concrete::instance(String::from("hi")))
    .unwrap();

  let seen = std::thread::spawn(|| global().has("macro_greeting"))
    .join()
    .unwrap();
  assert!(seen);
}

// --- resolve! ---

#[test]
#[serial]
fn test_resolve_concrete_type() {
  global()
    .singleton("macro_service", Concrete::factory(|| HealthCheck { value: 42 }))
    .unwrap();

  let first = resolve!(HealthCheck, "macro_service");
  let second = resolve!(HealthCheck, "macro_service");
  assert_eq!(first.value, 42);
  assert!(Arc::ptr_eq(&first, &second));
}

#[test]
#[serial]
fn test_resolve_trait_object() {
  global()
    .singleton(
      "macro_trait",
      Concrete::factory_trait::<dyn Probe>(|| Arc::new(HealthCheck { value: 44 })),
    )
    .unwrap();

  let service = resolve!(trait Probe, "macro_trait");
  assert_eq!(service.value(), 44);
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required service 'macro_unregistered'")]
fn test_resolve_panics_when_missing() {
  let _ = resolve!(HealthCheck, "macro_unregistered");
}

#[test]
#[serial]
#[should_panic(expected = "Failed to resolve required trait service 'macro_wrong_type'")]
fn test_resolve_trait_panics_on_type_mismatch() {
  global()
    .add("macro_wrong_type", Concrete::instance(7_u8))
    .unwrap();
  let _ = resolve!(trait Probe, "macro_wrong_type");
}
