//! Basic usage example for singleton-lifecycle.
//!
//! Demonstrates:
//! - Registering named values and retrieving them as `Arc<T>`
//! - Building a singleton on first use with `get_or_create`
//! - Looking objects up through alias chains
//! - Handling missing names and type mismatches
//!
//! Run with: `cargo run --example basic_usage`

use singleton_lifecycle::define_registry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// Create an isolated registry for this example
define_registry!(app);

#[derive(Debug, Clone, PartialEq)]
struct AppConfig {
    name: String,
    version: u32,
    debug_mode: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== singleton-lifecycle: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Register values under names
    // -------------------------------------------------------------------------
    println!("1. Registering values...");

    app::register("maxConnections", 16u32).unwrap();
    app::register(
        "appConfig",
        AppConfig {
            name: "MyApp".to_string(),
            version: 1,
            debug_mode: true,
        },
    )
    .unwrap();

    println!("   Registered: maxConnections, appConfig");

    // -------------------------------------------------------------------------
    // 2. Build on first use
    // -------------------------------------------------------------------------
    println!("\n2. Building a singleton on first use...");

    let url: Arc<String> = app::get_or_create("dataSource", || {
        println!("   (factory runs)");
        Ok("postgres://localhost/app".to_string())
    })
    .unwrap();
    let again: Arc<String> = app::get_or_create("dataSource", || {
        println!("   (never printed)");
        Ok(String::new())
    })
    .unwrap();

    println!("   dataSource = {url}, same instance: {}", Arc::ptr_eq(&url, &again));

    // -------------------------------------------------------------------------
    // 3. Aliases
    // -------------------------------------------------------------------------
    println!("\n3. Resolving aliases...");

    app::register_alias("dataSource", "ds").unwrap();
    app::register_alias("ds", "db").unwrap();

    let through_alias: Arc<String> = app::get("db").unwrap();
    println!("   db -> {}", app::registry().canonical_name("db"));
    println!("   aliases of dataSource: {:?}", app::registry().aliases().get_aliases("dataSource"));
    println!("   same instance: {}", Arc::ptr_eq(&url, &through_alias));

    // -------------------------------------------------------------------------
    // 4. Owned copies
    // -------------------------------------------------------------------------
    println!("\n4. Retrieving cloned values with get_cloned() -> T...");

    let cfg: AppConfig = app::get_cloned("appConfig").unwrap();
    println!("   appConfig (owned): {:?}", cfg);

    // -------------------------------------------------------------------------
    // 5. Errors
    // -------------------------------------------------------------------------
    println!("\n5. Handling errors...");

    match app::get::<Vec<u8>>("missing") {
        Ok(value) => println!("   Found: {:?}", value),
        Err(e) => println!("   Error (expected): {}", e),
    }
    match app::get::<u64>("maxConnections") {
        Ok(value) => println!("   Found: {}", value),
        Err(e) => println!("   Error (expected): {}", e),
    }
    match app::register("maxConnections", 32u32) {
        Ok(outcome) => println!("   Registered: {:?}", outcome),
        Err(e) => println!("   Error (expected): {}", e),
    }

    println!("\n=== Example Complete ===");
    println!("Registered singletons: {:?}", app::registry().singleton_names());
}
