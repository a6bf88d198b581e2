//! The `resolve!` accessor for the global container.

/// Resolves a service from the global container.
///
/// It panics if the requested abstract is not bound anywhere or holds a value
/// of another type. For a non-panicking version use `global().make(...)` or
/// `global().get_as(...)` directly.
///
/// # Panics
///
/// This macro will panic if the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use nine_ioc::{global, resolve, Concrete};
///
/// global().add("message", Concrete::instance(String::from("hello"))).unwrap();
///
/// let message = resolve!(String, "message");
/// assert_eq!(*message, "hello");
/// ```
///
/// ```
/// use nine_ioc::{global, resolve, Concrete};
/// use std::sync::Arc;
///
/// trait Notifier: Send + Sync { fn notify(&self) -> String; }
/// struct MailNotifier;
/// impl Notifier for MailNotifier { fn notify(&self) -> String { "mail sent".to_string() } }
///
/// global()
///   .singleton("notifier", Concrete::factory_trait::<dyn Notifier>(|| Arc::new(MailNotifier)))
///   .unwrap();
///
/// let notifier = resolve!(trait Notifier, "notifier");
/// assert_eq!(notifier.notify(), "mail sent");
/// ```
#[macro_export]
macro_rules! resolve {
    // Arm for resolving a concrete type: resolve!(MyService, "abstract")
    ($type:ty, $name:expr) => {
        $crate::global()
            .make::<$type>($name)
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required service '{}' as {}: {}",
                    $name,
                    std::any::type_name::<$type>(),
                    e
                )
            })
    };

    // Arm for resolving a trait object: resolve!(trait MyTrait, "abstract")
    (trait $trait_ident:ident, $name:expr) => {
        $crate::global()
            .make::<dyn $trait_ident>($name)
            .unwrap_or_else(|e| {
                panic!(
                    "Failed to resolve required trait service '{}' as {}: {}",
                    $name,
                    std::any::type_name::<dyn $trait_ident>(),
                    e
                )
            })
    };
}
