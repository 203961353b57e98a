//! Ordered shutdown example for singleton-lifecycle.
//!
//! Demonstrates:
//! - Registering disposables for managed objects
//! - Dependencies and containment deciding the teardown order
//! - A failing disposable that does not stop the shutdown
//!
//! Run with: `cargo run --example ordered_shutdown`

use singleton_lifecycle::{BoxError, Disposable, SingletonRegistry, SingletonRegistryApi};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

struct Closer(&'static str);

impl Disposable for Closer {
    fn destroy(&self) -> Result<(), BoxError> {
        println!("   closing {}", self.0);
        Ok(())
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== singleton-lifecycle: Ordered Shutdown ===\n");

    let registry = SingletonRegistry::new();

    for name in ["dataSource", "repository", "httpServer", "requestHandler", "metrics"] {
        let _: Arc<String> = registry
            .get_or_create_with(name, || Ok(format!("{name} instance")))
            .unwrap();
        registry.register_disposable(name, Closer(name));
    }
    registry.register_disposable("auditLog", || -> Result<(), BoxError> {
        Err("audit sink unreachable".into())
    });

    registry.register_dependency("repository", "dataSource");
    registry.register_dependency("httpServer", "repository");
    registry.register_containment("httpServer", "requestHandler");

    println!("dependents of dataSource: {:?}", registry.dependents_of("dataSource"));
    println!("httpServer depends on dataSource: {}", registry.is_dependent("dataSource", "httpServer"));
    println!("httpServer contains: {:?}", registry.contained_in("httpServer"));

    println!("\nShutting down...");
    registry.set_trace_callback(|event| println!("   [event] {event}"));
    registry.destroy_singletons();

    println!("\nSingletons left: {}", registry.singleton_count());
    println!("\n=== Example Complete ===");
}
