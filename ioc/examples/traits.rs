use nine_ioc::{global, resolve, Concrete};
use std::sync::Arc;

// 1. Define the abstraction (the trait)
trait Logger: Send + Sync {
  fn log(&self, message: &str);
}

// 2. Define concrete implementations
struct ConsoleLogger;
impl Logger for ConsoleLogger {
  fn log(&self, message: &str) {
    println!("[CONSOLE LOG]: {}", message);
  }
}

struct AuditLogger;
impl Logger for AuditLogger {
  fn log(&self, message: &str) {
    println!("[AUDIT LOG]: {}", message);
  }
}

// 3. Define a service that depends on the abstraction
struct ReportService {
  logger: Arc<dyn Logger>,
}

impl ReportService {
  fn generate_report(&self) {
    self.logger.log("Starting report generation.");
    self.logger.log("Finished report generation.");
  }
}

fn main() {
  global()
    .singleton("logger", Concrete::factory_trait::<dyn Logger>(|| Arc::new(ConsoleLogger)))
    .unwrap();

  // The factory resolves its own dependency through the build context.
  global()
    .singleton(
      "reports",
      Concrete::build(|ctx| Ok(ReportService { logger: ctx.make("logger")? })),
    )
    .unwrap();
  global()
    .add(
      "audit_reports",
      Concrete::build(|ctx| Ok(ReportService { logger: ctx.make("logger")? })),
    )
    .unwrap();

  // Only the audit reports get the audit logger.
  global()
    .when("audit_reports")
    .needs("logger")
    .give(Concrete::factory_trait::<dyn Logger>(|| Arc::new(AuditLogger)));

  println!("Resolving the high-level services...");
  resolve!(ReportService, "reports").generate_report();
  resolve!(ReportService, "audit_reports").generate_report();

  let logger = resolve!(trait Logger, "logger");
  logger.log("Resolved directly.");
}
