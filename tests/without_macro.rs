//! Integration tests demonstrating how to use a process-wide registry WITHOUT the macro.
//!
//! This shows the manual implementation approach: a `LazyLock` static plus a
//! `SingletonRegistryApi` impl, which is what `define_registry!` expands to.
//!
//! NOTE: All tests use #[serial] because they share the same static registry (MY_REGISTRY).
//! Each test starts by destroying whatever the previous one left behind.

use serial_test::serial;
use singleton_lifecycle::{BoxError, RegistryConfig, RegistryError, SingletonRegistry, SingletonRegistryApi};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

// ============================================================================
// Manual Registry Implementation (Without Macro)
// ============================================================================

static MY_SINGLETONS: LazyLock<SingletonRegistry> = LazyLock::new(|| {
    SingletonRegistry::with_config(RegistryConfig::default().with_alias_overriding(false))
});

/// Our custom registry API implementation
struct MyRegistry;

impl SingletonRegistryApi for MyRegistry {
    fn registry(&self) -> &SingletonRegistry {
        &MY_SINGLETONS
    }
}

const MY_REGISTRY: MyRegistry = MyRegistry;

fn fresh() {
    MY_REGISTRY.registry().clear_trace_callback();
    MY_REGISTRY.registry().destroy_singletons();
}

// ============================================================================
// Tests Using Manual Implementation
// ============================================================================

#[test]
#[serial]
fn test_basic_register_and_get() {
    fresh();
    MY_REGISTRY.register("answer", 42i32).unwrap();

    let value: Arc<i32> = MY_REGISTRY.get("answer").unwrap();
    assert_eq!(*value, 42);
}

#[test]
#[serial]
fn test_register_multiple_types() {
    fresh();
    MY_REGISTRY.register("count", 100u32).unwrap();
    MY_REGISTRY.register("greeting", "Hello".to_string()).unwrap();
    MY_REGISTRY.register("ratio", 0.5f64).unwrap();

    let num: Arc<u32> = MY_REGISTRY.get("count").unwrap();
    let text: Arc<String> = MY_REGISTRY.get("greeting").unwrap();
    let ratio: Arc<f64> = MY_REGISTRY.get("ratio").unwrap();

    assert_eq!(*num, 100);
    assert_eq!(&**text, "Hello");
    assert_eq!(*ratio, 0.5);
}

#[test]
#[serial]
fn test_second_registration_is_rejected() {
    fresh();
    MY_REGISTRY.register("port", 10u16).unwrap();

    let err = MY_REGISTRY.register("port", 20u16).unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyRegistered { ref name } if name == "port"));

    let value: Arc<u16> = MY_REGISTRY.get("port").unwrap();
    assert_eq!(*value, 10);
}

#[test]
#[serial]
fn test_alias_overriding_disabled() {
    fresh();
    let aliases = MY_REGISTRY.registry().aliases();
    assert!(!aliases.allows_overriding());

    aliases.register_alias("primary", "manual-db").unwrap();
    assert!(matches!(
        aliases.register_alias("replica", "manual-db"),
        Err(RegistryError::AliasConflict { .. })
    ));
}

#[test]
#[serial]
fn test_get_or_create_with_teardown() {
    fresh();
    let closed = Arc::new(AtomicUsize::new(0));
    let closed_clone = closed.clone();

    let pool: Arc<Vec<u8>> = MY_REGISTRY
        .get_or_create_with("pool", || Ok(vec![1, 2, 3]))
        .unwrap();
    MY_REGISTRY
        .registry()
        .register_disposable("pool", move || -> Result<(), BoxError> {
            closed_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    assert_eq!(pool.len(), 3);

    MY_REGISTRY.registry().destroy_singletons();
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(!MY_REGISTRY.contains("pool"));
}

#[test]
#[serial]
fn test_with_tracing() {
    fresh();
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);

    MY_REGISTRY.registry().set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.to_string());
    });

    MY_REGISTRY.register("traced", 777i32).unwrap();
    let _: Arc<i32> = MY_REGISTRY.get("traced").unwrap();
    let _: Arc<u8> = MY_REGISTRY.get_or_create_with("built", || Ok(1u8)).unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec!["register { name: traced }", "created { name: built }"]
    );

    MY_REGISTRY.registry().clear_trace_callback();
}
