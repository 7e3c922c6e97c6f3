//! Start and shutdown behavior.

use std::time::Duration;

use streamhub::{Context, Error, Message, ReaderOptions, Result};

use crate::support::{hub_on, payment, small_bus, PaymentCaptured};

async fn ack(_ctx: Context, _msg: Message) -> Result<()> {
    Ok(())
}

// ============================================================================
// Test 1: Writes before start are rejected
// ============================================================================

#[tokio::test]
async fn write_before_start() {
    let bus = small_bus(4);
    let hub = hub_on(&bus);

    let err = hub.write(&Context::new(), &payment(1)).await.unwrap_err();
    assert!(matches!(err, Error::BusNotStarted));
}

// ============================================================================
// Test 2: Writes after shutdown are rejected; start is idempotent
// ============================================================================

#[tokio::test]
async fn write_after_shutdown() {
    let bus = small_bus(4);
    let mut hub = hub_on(&bus);
    hub.read::<PaymentCaptured, _>(ack, ReaderOptions::new()).unwrap();

    let ctx = Context::new();
    bus.start(&ctx).unwrap();
    bus.start(&ctx).unwrap();
    assert!(bus.is_started());
    hub.start(&ctx).await.unwrap();
    hub.write(&ctx, &payment(1)).await.unwrap();

    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(2), bus.wait_stopped())
        .await
        .expect("bus did not stop");

    let err = hub.write(&Context::new(), &payment(2)).await.unwrap_err();
    assert!(matches!(err, Error::BusClosed));
}

// ============================================================================
// Test 3: A context deadline also shuts the bus down
// ============================================================================

#[tokio::test]
async fn deadline_stops_bus() {
    let bus = small_bus(4);
    bus.start(&Context::new().with_timeout(Duration::from_millis(20)))
        .unwrap();

    tokio::time::timeout(Duration::from_secs(2), bus.wait_stopped())
        .await
        .expect("bus did not stop");
    assert!(bus.is_stopped());
}
