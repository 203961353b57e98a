//! Circular wiring example for singleton-lifecycle.
//!
//! Two services need each other. `OrderService` installs an early reference to
//! itself before building `PaymentService`, which picks that reference up instead
//! of recursing back into creation.
//!
//! Run with: `cargo run --example circular_wiring`

use singleton_lifecycle::{RegistryError, SharedObject, SingletonRegistry};
use std::sync::{Arc, OnceLock};
use tracing_subscriber::EnvFilter;

struct OrderService {
    payments: OnceLock<Arc<PaymentService>>,
}

struct PaymentService {
    orders: Arc<OrderService>,
}

fn order_service(registry: &SingletonRegistry) -> Result<Arc<OrderService>, RegistryError> {
    let object = registry.get_or_create("orderService", || {
        let orders = Arc::new(OrderService {
            payments: OnceLock::new(),
        });
        let early = orders.clone();
        registry.register_factory("orderService", move || Ok(early.clone() as SharedObject));

        let payments = payment_service(registry)?;
        let _ = orders.payments.set(payments);
        Ok(orders as SharedObject)
    })?;

    downcast(object, "orderService")
}

fn payment_service(registry: &SingletonRegistry) -> Result<Arc<PaymentService>, RegistryError> {
    let object = registry.get_or_create("paymentService", || {
        let orders = match registry.get_if_present("orderService", true)? {
            Some(early) => downcast::<OrderService>(early, "orderService")?,
            None => order_service(registry)?,
        };
        Ok(Arc::new(PaymentService { orders }) as SharedObject)
    })?;

    downcast(object, "paymentService")
}

fn downcast<T: Send + Sync + 'static>(object: SharedObject, name: &str) -> Result<Arc<T>, RegistryError> {
    object.downcast::<T>().map_err(|_| RegistryError::TypeMismatch {
        name: name.to_owned(),
        expected: std::any::type_name::<T>(),
    })
}

fn main() -> Result<(), RegistryError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace")))
        .init();

    println!("=== singleton-lifecycle: Circular Wiring ===\n");

    let registry = SingletonRegistry::new();
    registry.set_trace_callback(|event| println!("   [event] {event}"));

    let orders = order_service(&registry)?;
    let payments = orders.payments.get().cloned().ok_or_else(|| {
        RegistryError::IllegalState("order service was not wired".to_owned())
    })?;

    println!(
        "\nPaymentService points back at the cached OrderService: {}",
        Arc::ptr_eq(&payments.orders, &orders)
    );

    // Asking for the payment service first takes the other path through the cycle.
    let fresh = SingletonRegistry::new();
    match payment_service(&fresh) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("\nWithout an early reference the cycle fails:\n   {e}\n   root cause: {}", e.root_cause()),
    }
    fresh.remove_singleton("paymentService");
    fresh.remove_singleton("orderService");

    println!("\n=== Example Complete ===");
    Ok(())
}
