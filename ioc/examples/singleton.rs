use nine_ioc::{Concrete, MultiContainer};
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// A simple service that gets a unique ID upon creation.
struct RequestTracker {
  id: usize,
}

// A global, thread-safe counter to generate unique IDs.
static ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn main() {
  let nine = MultiContainer::new();

  // This factory will only be called ONCE.
  nine
    .singleton(
      "singleton_tracker",
      Concrete::factory(|| {
        println!("Creating shared RequestTracker...");
        RequestTracker {
          id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
        }
      }),
    )
    .unwrap();

  // This factory will be called EVERY time the abstract is resolved.
  nine
    .add(
      "transient_tracker",
      Concrete::factory(|| {
        println!("Creating fresh RequestTracker...");
        RequestTracker {
          id: ID_COUNTER.fetch_add(1, Ordering::SeqCst),
        }
      }),
    )
    .unwrap();

  println!("--- Resolving shared bindings ---");
  let s1 = nine.make::<RequestTracker>("singleton_tracker").unwrap();
  let s2 = nine.make::<RequestTracker>("singleton_tracker").unwrap();
  println!("Shared 1 ID: {}, Shared 2 ID: {}", s1.id, s2.id);
  assert!(Arc::ptr_eq(&s1, &s2), "Shared instances should be identical");

  println!("\n--- Resolving factory bindings ---");
  let t1 = nine.make::<RequestTracker>("transient_tracker").unwrap();
  let t2 = nine.make::<RequestTracker>("transient_tracker").unwrap();
  println!("Factory 1 ID: {}, Factory 2 ID: {}", t1.id, t2.id);
  assert!(!Arc::ptr_eq(&t1, &t2), "Factory instances should be different");

  println!("\nBuilt instances: {:?}", nine.local().instances());
}
