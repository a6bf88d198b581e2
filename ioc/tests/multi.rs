use nine_ioc::{
  Concrete, Container, Error, MultiContainer, ServiceLocator, ALL_GROUPS, DEFAULT_GROUP,
};
use pretty_assertions::assert_eq;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

// --- Helpers ---

fn dependency_with(key: &str, value: &'static str) -> Arc<Container> {
  let container = Arc::new(Container::new());
  container.add(key, Concrete::instance(value)).unwrap();
  container
}

fn service_with(key: &str, value: &'static str) -> Arc<ServiceLocator> {
  let locator = Arc::new(ServiceLocator::new());
  locator.set(key, Concrete::instance(value)).unwrap();
  locator
}

fn resolve_str(nine: &MultiContainer, key: &str) -> &'static str {
  *nine.make::<&'static str>(key).unwrap()
}

// --- Default Group ---

#[test]
fn test_new_container_seeds_the_default_group() {
  let nine = MultiContainer::new();
  let group = nine.container_group(DEFAULT_GROUP);

  assert_eq!(nine.default_group(), "nine");
  assert_eq!(group.dependency_names(), vec!["nine"]);
  assert_eq!(group.service_names(), vec!["nine"]);
}

#[test]
fn test_logger_and_mailer_scenario() {
  let nine = MultiContainer::new();
  nine.add_dependency_container("nine", Arc::new(Container::new()));

  let logger1 = Arc::new(String::from("logger1"));
  nine
    .bind("Logger", Concrete::shared(logger1.clone()), true)
    .unwrap();

  let first = nine.make::<String>("Logger").unwrap();
  let second = nine.make::<String>("Logger").unwrap();
  assert_eq!(*first, "logger1");
  assert!(Arc::ptr_eq(&first, &logger1));
  assert!(Arc::ptr_eq(&first, &second));

  let err = nine
    .add(["Mailer", "mailer"], Concrete::instance("smtp"))
    .unwrap_err();
  assert!(matches!(err, Error::InvalidBinding { .. }));
  assert!(!nine.has("mailer"));
  assert!(!nine.local().is_alias("mailer"));
}

// --- Resolution Order ---

#[test]
fn test_local_binding_wins_over_dependency_containers() {
  let nine = MultiContainer::new();
  nine.add_dependency_container("app", dependency_with("db", "dependency"));
  nine.add("db", Concrete::instance("local")).unwrap();

  assert_eq!(resolve_str(&nine, "db"), "local");
  assert!(nine.exists("db"));
}

#[test]
fn test_dependency_container_wins_over_service_container() {
  let nine = MultiContainer::new();
  nine.add_service_container("s1", service_with("mailer", "service"));
  nine.add_dependency_container("d1", dependency_with("mailer", "dependency"));

  assert_eq!(resolve_str(&nine, "mailer"), "dependency");
  assert!(!nine.exists("mailer"));
}

#[test]
fn test_members_are_searched_in_registration_order() {
  let nine = MultiContainer::new();
  nine.add_dependency_container("first", dependency_with("cache", "first"));
  nine.add_dependency_container("second", dependency_with("cache", "second"));

  assert_eq!(resolve_str(&nine, "cache"), "first");

  // Re-registering a name moves it to the back of its group.
  nine.add_dependency_container("first", dependency_with("cache", "first again"));
  assert_eq!(resolve_str(&nine, "cache"), "second");
  assert_eq!(
    nine.container_group(ALL_GROUPS).dependency_names(),
    vec!["nine", "second", "first"]
  );
}

#[test]
fn test_service_containers_are_searched_in_registration_order() {
  let nine = MultiContainer::new();
  nine.add_service_container("s1", service_with("queue", "s1"));
  nine.add_service_container("s2", service_with("queue", "s2"));

  assert_eq!(resolve_str(&nine, "queue"), "s1");
}

// --- Groups ---

#[test]
fn test_container_group_by_name_and_wildcard() {
  let nine = MultiContainer::new();
  nine.add_dependency_container("app", Arc::new(Container::new()));
  nine.add_service_container("app", Arc::new(ServiceLocator::new()));
  nine.add_service_container("mail", Arc::new(ServiceLocator::new()));

  let app = nine.container_group("app");
  assert_eq!(app.dependency_names(), vec!["app"]);
  assert_eq!(app.service_names(), vec!["app"]);

  let mail = nine.container_group("mail");
  assert!(mail.dependency.is_empty());
  assert_eq!(mail.service_names(), vec!["mail"]);

  let all = nine.container_group(ALL_GROUPS);
  assert_eq!(all.dependency_names(), vec!["nine", "app"]);
  assert_eq!(all.service_names(), vec!["nine", "app", "mail"]);

  assert!(nine.container_group("unknown").is_empty());
}

#[test]
fn test_named_member_lookup() {
  let nine = MultiContainer::new();
  nine.add_dependency_container("app", dependency_with("key", "value"));

  let app = nine.dependency_container("app").unwrap();
  assert!(app.has("key"));
  assert!(nine.service_container("app").is_none());
}

// --- Registration Helpers ---

#[test]
fn test_add_dependency_targets_the_default_group() {
  let nine = MultiContainer::new();
  nine
    .add_dependency("repo", Concrete::instance("users"), false)
    .unwrap();

  assert!(nine.exists("repo"));
  assert!(nine.has_dependency("repo"));
  assert!(!nine.has_service("repo"));
}

#[test]
fn test_add_service_targets_the_default_locator() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  let nine = MultiContainer::new();
  nine
    .put_service(
      "mailer",
      Concrete::factory(|| {
        BUILT.fetch_add(1, Ordering::SeqCst);
        "smtp"
      }),
    )
    .unwrap();

  assert!(!nine.exists("mailer"));
  assert!(nine.has_service("mailer"));
  assert!(nine.has("mailer"));

  let first = nine.get_service("mailer").unwrap().unwrap();
  let second = nine.get("mailer").unwrap().unwrap();
  assert!(first.ptr_eq(&second));
  assert_eq!(BUILT.load(Ordering::SeqCst), 1);
}

#[test]
fn test_non_shared_service() {
  let nine = MultiContainer::new();
  nine
    .add_service("ticket", Concrete::factory(|| String::from("t")), false)
    .unwrap();

  let first = nine.make::<String>("ticket").unwrap();
  let second = nine.make::<String>("ticket").unwrap();
  assert!(!Arc::ptr_eq(&first, &second));
}

// --- Miss Policy ---

#[test]
fn test_miss_is_silent_by_default() {
  let nine = MultiContainer::new();

  assert!(!nine.has("missing"));
  assert!(nine.get("missing").unwrap().is_none());
  assert!(nine.get_dependency("missing").unwrap().is_none());
  assert!(nine.get_service("missing").unwrap().is_none());
}

#[test]
fn test_miss_raises_with_exceptions_enabled() {
  let nine = MultiContainer::new();
  nine.use_exceptions(true);
  assert!(nine.raises_on_miss());

  let err = nine.get("missing").unwrap_err();
  assert_eq!(err.to_string(), "Abstract missing not found in any container.");
  assert!(matches!(
    nine.get_service("missing"),
    Err(Error::AbstractNotFound(_))
  ));
}

#[test]
fn test_find_always_fails_on_miss() {
  let nine = MultiContainer::new();
  assert!(matches!(nine.find("missing"), Err(Error::AbstractNotFound(_))));
}

#[test]
fn test_member_errors_propagate() {
  let nine = MultiContainer::new();
  let strict = Arc::new(Container::new());
  strict
    .add(
      "broken",
      Concrete::build::<u8>(|_| Err(Error::factory("broken", "unavailable"))),
    )
    .unwrap();
  nine.add_dependency_container("strict", strict);

  assert!(matches!(nine.get("broken"), Err(Error::Factory { .. })));
}

// --- Reset ---

#[test]
fn test_reset_forgets_everything() {
  let nine = MultiContainer::new();
  nine.add("local", Concrete::instance(1_i32)).unwrap();
  nine.add_dependency_container("app", dependency_with("dep", "value"));
  nine.add_service("svc", Concrete::instance(2_i32), true).unwrap();

  nine.reset();

  assert!(!nine.has("local"));
  assert!(!nine.has("dep"));
  assert!(!nine.has("svc"));
  assert!(nine.container_group(ALL_GROUPS).is_empty());
}

#[test]
fn test_registration_works_after_reset() {
  let nine = MultiContainer::new();
  nine.reset();

  nine.add("again", Concrete::instance(3_i32)).unwrap();
  nine
    .add_service("service_again", Concrete::instance(4_i32), true)
    .unwrap();

  assert_eq!(*nine.make::<i32>("again").unwrap(), 3);
  assert_eq!(*nine.make::<i32>("service_again").unwrap(), 4);
  assert_eq!(
    nine.container_group(ALL_GROUPS).service_names(),
    vec!["nine"]
  );
}

#[test]
fn test_reset_drops_memoized_instances_in_members() {
  let locator = Arc::new(ServiceLocator::new());
  locator
    .set("conn", Concrete::factory(|| String::from("connection")))
    .unwrap();

  let nine = MultiContainer::new();
  nine.add_service_container("db", locator.clone());
  let before = nine.make::<String>("conn").unwrap();
  assert!(locator.is_frozen("conn"));

  nine.reset();

  // The locator itself survives outside the container, unfrozen and empty of
  // cached instances.
  assert!(!locator.is_frozen("conn"));
  let after = locator.get_as::<String>("conn").unwrap().unwrap();
  assert!(!Arc::ptr_eq(&before, &after));
}

#[test]
fn test_add_service_requires_declared_class() {
  let nine = MultiContainer::new();

  let err = nine
    .add_service(["Mailer", "mailer"], Concrete::instance("smtp"), true)
    .unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidBinding { ref class, ref alias } if class == "Mailer" && alias == "mailer"
  ));
  assert!(!nine.has("Mailer"));
  assert!(!nine.has("mailer"));

  nine.declare_class("Mailer");
  nine
    .put_service(["Mailer", "mailer"], Concrete::instance("smtp"))
    .unwrap();
  assert_eq!(resolve_str(&nine, "mailer"), "smtp");
  assert!(nine.has_service("Mailer"));
}

#[test]
fn test_reset_rebuilds_extended_services() {
  static BUILT: AtomicUsize = AtomicUsize::new(0);

  let locator = Arc::new(ServiceLocator::new());
  locator
    .set(
      "conn",
      Concrete::factory(|| BUILT.fetch_add(1, Ordering::SeqCst)),
    )
    .unwrap();
  locator.extend("conn", |value, _| Ok(value)).unwrap();

  let nine = MultiContainer::new();
  nine.add_service_container("db", locator.clone());
  assert_eq!(*nine.make::<usize>("conn").unwrap(), 0);

  nine.reset();

  assert_eq!(*locator.get_as::<usize>("conn").unwrap().unwrap(), 1);
  assert_eq!(BUILT.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reset_of_a_fresh_container() {
  let nine = MultiContainer::new();
  nine.reset();

  assert!(nine.container_group(ALL_GROUPS).is_empty());
  nine.add("after", Concrete::instance(1_u8)).unwrap();
  assert!(nine.has("after"));
}

#[test]
fn test_debug_lists_groups() {
  let nine = MultiContainer::new();
  nine.add_service_container("mail", Arc::new(ServiceLocator::new()));
  nine.add("db", Concrete::instance(1_u8)).unwrap();

  let rendered = format!("{:?}", nine);
  assert!(rendered.starts_with("MultiContainer"));
  assert!(rendered.contains(r#"service: ["nine", "mail"]"#));
  assert!(rendered.contains(r#"local: ["db"]"#));
}
