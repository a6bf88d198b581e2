use nine_ioc::{global, resolve, Error};
use std::panic;

struct UnregisteredService;

fn main() {
  // --- Using the panicking `resolve!` macro ---
  println!("Attempting to resolve an abstract that was never registered...");

  let result = panic::catch_unwind(|| {
    let _service = resolve!(UnregisteredService, "unregistered");
  });

  assert!(result.is_err(), "resolve! should have panicked.");
  println!("Caught the expected panic from resolve!.");

  // --- The silent miss policy ---
  let service = global().get_as::<UnregisteredService>("unregistered").unwrap();
  assert!(service.is_none());
  println!("\nget_as returned None for the missing abstract.");

  // --- The raising miss policy ---
  global().use_exceptions(true);
  match global().get("unregistered") {
    Err(Error::AbstractNotFound(name)) => println!("Raised: abstract {} not found.", name),
    other => panic!("expected AbstractNotFound, got {:?}", other),
  }
}
