use nine_ioc::{Concrete, Container, Error, MultiContainer};
use std::sync::Arc;

struct Report {
  logger: Arc<String>,
}

fn container_with_reports() -> Container {
  let container = Container::new();
  container
    .add("logger", Concrete::instance(String::from("default")))
    .unwrap();
  container
    .add(
      "reports",
      Concrete::build(|ctx| Ok(Report { logger: ctx.make("logger")? })),
    )
    .unwrap();
  container
    .add(
      "audit",
      Concrete::build(|ctx| Ok(Report { logger: ctx.make("logger")? })),
    )
    .unwrap();
  container
}

#[test]
fn test_contextual_binding_applies_only_to_its_concrete() {
  let container = container_with_reports();
  container
    .when("reports")
    .needs("logger")
    .give(Concrete::instance(String::from("file")));

  assert_eq!(*container.make::<Report>("reports").unwrap().logger, "file");
  assert_eq!(*container.make::<Report>("audit").unwrap().logger, "default");
  assert_eq!(*container.make::<String>("logger").unwrap(), "default");
}

#[test]
fn test_contextual_factory_runs_per_build() {
  let container = container_with_reports();
  container
    .when("reports")
    .needs("logger")
    .give(Concrete::factory(|| String::from("fresh")));

  let first = container.make::<Report>("reports").unwrap();
  let second = container.make::<Report>("reports").unwrap();
  assert_eq!(*first.logger, "fresh");
  assert!(!Arc::ptr_eq(&first.logger, &second.logger));
}

#[test]
fn test_give_abstract_resolves_another_binding() {
  let container = container_with_reports();
  container
    .add("syslog", Concrete::instance(String::from("syslog")))
    .unwrap();
  container.when("reports").needs("logger").give_abstract("syslog");

  assert_eq!(*container.make::<Report>("reports").unwrap().logger, "syslog");
}

#[test]
fn test_give_abstract_with_missing_target_fails() {
  let container = container_with_reports();
  container.when("reports").needs("logger").give_abstract("nowhere");

  match container.make::<Report>("reports") {
    Err(Error::AbstractNotFound(name)) => assert_eq!(name, "nowhere"),
    other => panic!("expected a missing abstract, got {:?}", other.map(|_| ())),
  }
}

#[test]
fn test_contextual_factory_can_decorate_the_default() {
  let container = container_with_reports();
  container.when("reports").needs("logger").give(Concrete::build(|ctx| {
    let inner = ctx.make::<String>("logger")?;
    Ok(format!("[reports] {}", inner))
  }));

  assert_eq!(
    *container.make::<Report>("reports").unwrap().logger,
    "[reports] default"
  );
}

#[test]
fn test_contextual_binding_follows_aliases() {
  let container = container_with_reports();
  container.alias("reports", "reporter");
  container.alias("logger", "log");
  container
    .when("reporter")
    .needs("log")
    .give(Concrete::instance(String::from("aliased")));

  assert_eq!(*container.make::<Report>("reporter").unwrap().logger, "aliased");
}

#[test]
fn test_shared_consumer_keeps_its_contextual_dependency() {
  let container = container_with_reports();
  container
    .singleton(
      "reports",
      Concrete::build(|ctx| Ok(Report { logger: ctx.make("logger")? })),
    )
    .unwrap();
  container
    .when("reports")
    .needs("logger")
    .give(Concrete::factory(|| String::from("once")));

  let first = container.make::<Report>("reports").unwrap();
  let second = container.make::<Report>("reports").unwrap();
  assert!(Arc::ptr_eq(&first.logger, &second.logger));
}

#[test]
fn test_context_reports_contextual_needs() {
  let container = Container::new();
  container
    .add(
      "probe",
      Concrete::build(|ctx| Ok((ctx.concrete().to_owned(), ctx.has("cache")))),
    )
    .unwrap();
  container
    .when("probe")
    .needs("cache")
    .give(Concrete::instance(0_u8));

  let probe = container.make::<(String, bool)>("probe").unwrap();
  assert_eq!(probe.0, "probe");
  assert!(probe.1);
  assert!(!container.has("cache"));
}

#[test]
fn test_multi_container_delegates_contextual_bindings_locally() {
  let nine = MultiContainer::new();
  nine
    .add("logger", Concrete::instance(String::from("default")))
    .unwrap();
  nine
    .add(
      "reports",
      Concrete::build(|ctx| Ok(Report { logger: ctx.make("logger")? })),
    )
    .unwrap();
  nine
    .when("reports")
    .needs("logger")
    .give(Concrete::instance(String::from("contextual")));

  assert_eq!(*nine.make::<Report>("reports").unwrap().logger, "contextual");
}
