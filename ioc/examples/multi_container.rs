use nine_ioc::{Concrete, Container, MultiContainer, ServiceLocator, ALL_GROUPS};
use std::sync::Arc;

fn main() {
  let nine = MultiContainer::new();

  // A dependency container for the application layer.
  let app = Arc::new(Container::new());
  app.add("mailer", Concrete::instance("smtp://app")).unwrap();
  nine.add_dependency_container("app", app);

  // A service locator for infrastructure services.
  let infra = Arc::new(ServiceLocator::new());
  infra.set("mailer", Concrete::instance("smtp://infra")).unwrap();
  infra.set("queue", Concrete::instance("amqp://infra")).unwrap();
  nine.add_service_container("infra", infra);

  // Dependency containers are searched before service locators.
  let mailer = nine.make::<&str>("mailer").unwrap();
  println!("mailer -> {}", mailer);
  assert_eq!(*mailer, "smtp://app");

  let queue = nine.make::<&str>("queue").unwrap();
  println!("queue  -> {}", queue);

  // Local bindings win over every group.
  nine.add("mailer", Concrete::instance("smtp://local")).unwrap();
  assert_eq!(*nine.make::<&str>("mailer").unwrap(), "smtp://local");

  let all = nine.container_group(ALL_GROUPS);
  println!("dependency containers: {:?}", all.dependency_names());
  println!("service containers:    {:?}", all.service_names());

  nine.reset();
  assert!(!nine.has("mailer"));
  println!("\nAfter reset nothing is bound.");
}
