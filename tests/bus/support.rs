//! Shared fixtures for bus tests.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use streamhub::{BusConfig, Hub, InMemoryBus, StreamMessage, StreamMetadata};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness; `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, StreamMessage)]
#[stream(key = "payments.PaymentCaptured")]
pub struct PaymentCaptured {
    #[stream(subject)]
    pub payment_id: String,
    pub amount: u64,
}

pub fn payment(n: u64) -> PaymentCaptured {
    PaymentCaptured {
        payment_id: format!("p-{n}"),
        amount: n * 100,
    }
}

/// A hub wired to `bus` for both directions, with the payments stream set.
pub fn hub_on(bus: &InMemoryBus) -> Hub {
    let mut hub = Hub::builder()
        .instance_name("com.payments")
        .writer(Arc::new(bus.clone()))
        .reader(Arc::new(bus.clone()))
        .build();
    hub.set_stream::<PaymentCaptured>(StreamMetadata::new("payments").with_stream_version(1));
    hub
}

pub fn small_bus(max_in_flight: u32) -> InMemoryBus {
    init_tracing();
    InMemoryBus::new(BusConfig {
        queue_capacity: 16,
        max_in_flight,
    })
}
