//! Message delivery through the bus.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use streamhub::{BatchItem, Context, Error, Message, MessageHandler, ReaderOptions, Result};

use crate::support::{eventually, hub_on, payment, small_bus, PaymentCaptured};

/// Records decoded payloads and the group each delivery ran under.
#[derive(Clone, Default)]
struct Collector {
    seen: Arc<Mutex<Vec<(String, PaymentCaptured)>>>,
}

#[async_trait]
impl MessageHandler for Collector {
    async fn handle(&self, _ctx: Context, message: Message) -> Result<()> {
        let payment = message
            .decoded::<PaymentCaptured>()
            .cloned()
            .ok_or_else(|| Error::handler("payload not decoded"))?;
        let group = message.group_name.clone().unwrap_or_default();
        self.seen.lock().unwrap().push((group, payment));
        Ok(())
    }
}

/// Sleeps while tracking how many invocations overlap.
#[derive(Clone, Default)]
struct Slow {
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    done: Arc<AtomicUsize>,
}

#[async_trait]
impl MessageHandler for Slow {
    async fn handle(&self, _ctx: Context, _message: Message) -> Result<()> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.done.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn stop(ctx: &Context, bus: &streamhub::InMemoryBus) {
    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(5), bus.wait_stopped())
        .await
        .expect("bus did not stop");
}

// ============================================================================
// Test 1: Every group receives decoded payloads; concurrency fans out
// ============================================================================

#[tokio::test]
async fn groups_receive_decoded_payloads() {
    let bus = small_bus(8);
    let mut hub = hub_on(&bus);
    let billing = Collector::default();
    let audit = Collector::default();

    hub.read::<PaymentCaptured, _>(billing.clone(), ReaderOptions::new().group("billing"))
        .unwrap();
    hub.read::<PaymentCaptured, _>(
        audit.clone(),
        ReaderOptions::new().group("audit").concurrency_level(2),
    )
    .unwrap();
    assert_eq!(bus.listener_count("payments"), 0);

    let ctx = Context::new();
    bus.start(&ctx).unwrap();
    hub.start(&ctx).await.unwrap();
    assert_eq!(bus.listener_count("payments"), 3);

    hub.write(&ctx, &payment(1)).await.unwrap();
    hub.write_batch(
        &ctx,
        vec![
            BatchItem::new(&payment(2)).unwrap(),
            BatchItem::new(&payment(3)).unwrap(),
        ],
    )
    .await
    .unwrap();
    eventually(|| billing.seen.lock().unwrap().len() == 3 && audit.seen.lock().unwrap().len() == 6).await;
    stop(&ctx, &bus).await;

    let billing = billing.seen.lock().unwrap();
    assert_eq!(billing.len(), 3);
    assert!(billing.iter().all(|(group, _)| group == "billing"));
    let mut amounts: Vec<_> = billing.iter().map(|(_, p)| p.amount).collect();
    amounts.sort_unstable();
    assert_eq!(amounts, vec![100, 200, 300]);

    let audit = audit.seen.lock().unwrap();
    assert_eq!(audit.len(), 6);
    assert!(audit.iter().all(|(group, _)| group == "audit"));
}

// ============================================================================
// Test 2: In-flight handlers never exceed max_in_flight
// ============================================================================

#[tokio::test]
async fn parallelism_is_bounded() {
    let bus = small_bus(2);
    let mut hub = hub_on(&bus);
    let slow = Slow::default();
    hub.read::<PaymentCaptured, _>(slow.clone(), ReaderOptions::new())
        .unwrap();

    let ctx = Context::new();
    bus.start(&ctx).unwrap();
    hub.start(&ctx).await.unwrap();
    for n in 0..8 {
        hub.write(&ctx, &payment(n)).await.unwrap();
    }
    eventually(|| slow.done.load(Ordering::SeqCst) == 8).await;
    stop(&ctx, &bus).await;

    assert!(slow.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(slow.running.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Test 3: Shutdown cancels in-flight handlers instead of waiting them out
// ============================================================================

/// Captures its context, then blocks far longer than any test runs.
#[derive(Clone, Default)]
struct Stuck {
    contexts: Arc<Mutex<Vec<Context>>>,
}

#[async_trait]
impl MessageHandler for Stuck {
    async fn handle(&self, ctx: Context, _message: Message) -> Result<()> {
        self.contexts.lock().unwrap().push(ctx.clone());
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn shutdown_cancels_in_flight_handlers() {
    let bus = small_bus(1);
    let mut hub = hub_on(&bus);
    let stuck = Stuck::default();
    hub.read::<PaymentCaptured, _>(
        stuck.clone(),
        ReaderOptions::new().retry_timeout(Duration::from_secs(60)),
    )
    .unwrap();

    let ctx = Context::new();
    bus.start(&ctx).unwrap();
    hub.start(&ctx).await.unwrap();
    for n in 0..3 {
        hub.write(&ctx, &payment(n)).await.unwrap();
    }
    eventually(|| stuck.contexts.lock().unwrap().len() == 1).await;

    let started = std::time::Instant::now();
    ctx.cancel();
    tokio::time::timeout(Duration::from_secs(1), bus.wait_stopped())
        .await
        .expect("bus waited on a cancelled handler");
    assert!(started.elapsed() < Duration::from_secs(1));

    // queued messages were never handed to the handler
    let contexts = stuck.contexts.lock().unwrap();
    assert_eq!(contexts.len(), 1);
    assert!(contexts[0].is_cancelled());
}

// ============================================================================
// Test 4: Failing handlers are logged, not fatal to the bus
// ============================================================================

#[tokio::test]
async fn failing_handler_does_not_stop_delivery() {
    let bus = small_bus(4);
    let mut hub = hub_on(&bus);
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = delivered.clone();

    hub.read::<PaymentCaptured, _>(
        move |_ctx: Context, msg: Message| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                match msg.decoded::<PaymentCaptured>() {
                    Some(p) if p.amount == 100 => Err(Error::handler("declined")),
                    _ => Ok(()),
                }
            }
        },
        ReaderOptions::new()
            .retry_initial_interval(Duration::from_millis(1))
            .retry_max_interval(Duration::from_millis(1))
            .retry_timeout(Duration::from_millis(50)),
    )
    .unwrap();

    let ctx = Context::new();
    bus.start(&ctx).unwrap();
    hub.start(&ctx).await.unwrap();
    hub.write(&ctx, &payment(1)).await.unwrap();
    hub.write(&ctx, &payment(2)).await.unwrap();
    eventually(|| delivered.load(Ordering::SeqCst) >= 3).await;
    stop(&ctx, &bus).await;

    // payment 1 is retried at least once, payment 2 succeeds first time
    assert!(delivered.load(Ordering::SeqCst) >= 3);
}
