//! Retry through the default behavior chain.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use streamhub::{
    Context, Error, Hub, Message, MessageHandler, NewMessageArgs, ReaderOptions, Result,
};

use crate::support::{init_tracing, orders_stream, CapturingReader, OrderPlaced};

struct Flaky {
    attempts: Arc<AtomicU32>,
    fail_first: u32,
}

#[async_trait::async_trait]
impl MessageHandler for Flaky {
    async fn handle(&self, _ctx: Context, _message: Message) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_first {
            Err(Error::handler(format!("attempt {attempt} failed")))
        } else {
            Ok(())
        }
    }
}

fn order_message() -> Message {
    Message::new(NewMessageArgs {
        id: "m-1".into(),
        stream: "orders".into(),
        data: br#"{"order_id":"o-1","total":3}"#.to_vec(),
        ..Default::default()
    })
}

async fn hub_with(handler: Flaky, options: ReaderOptions) -> CapturingReader {
    let reader = CapturingReader::default();
    let mut hub = Hub::builder()
        .reader(Arc::new(reader.clone()))
        .build();
    hub.set_stream::<OrderPlaced>(orders_stream());
    hub.read::<OrderPlaced, _>(handler, options).unwrap();
    hub.start(&Context::new()).await.unwrap();
    reader
}

// ============================================================================
// Test 1: An always-failing handler is bounded by the elapsed-time budget
// ============================================================================

#[tokio::test]
async fn always_failing_handler_is_bounded() {
    init_tracing();
    let attempts = Arc::new(AtomicU32::new(0));
    let reader = hub_with(
        Flaky {
            attempts: attempts.clone(),
            fail_first: u32::MAX,
        },
        ReaderOptions::new()
            .retry_initial_interval(Duration::from_millis(1))
            .retry_max_interval(Duration::from_millis(10))
            .retry_timeout(Duration::from_millis(2)),
    )
    .await;

    let started = Instant::now();
    let err = reader.tasks()[0]
        .handler
        .handle(Context::new(), order_message())
        .await
        .unwrap_err();
    let elapsed = started.elapsed();

    let made = attempts.load(Ordering::SeqCst);
    assert!(made >= 2, "expected a retry, got {made} attempt(s)");
    assert!(matches!(err, Error::Handler(_)));
    assert_eq!(err.to_string(), format!("handler: attempt {made} failed"));
    assert!(elapsed < Duration::from_millis(200), "took {elapsed:?}");
}

// ============================================================================
// Test 2: Transient failures are retried until the handler succeeds
// ============================================================================

#[tokio::test]
async fn transient_failures_recover() {
    init_tracing();
    let attempts = Arc::new(AtomicU32::new(0));
    let reader = hub_with(
        Flaky {
            attempts: attempts.clone(),
            fail_first: 3,
        },
        ReaderOptions::new()
            .retry_initial_interval(Duration::from_millis(1))
            .retry_max_interval(Duration::from_millis(5))
            .retry_timeout(Duration::from_secs(5)),
    )
    .await;

    reader.tasks()[0]
        .handler
        .handle(Context::new(), order_message())
        .await
        .unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
}

// ============================================================================
// Test 3: A cancelled context stops retrying after the current attempt
// ============================================================================

#[tokio::test]
async fn cancelled_context_stops_retry() {
    init_tracing();
    let attempts = Arc::new(AtomicU32::new(0));
    let reader = hub_with(
        Flaky {
            attempts: attempts.clone(),
            fail_first: u32::MAX,
        },
        ReaderOptions::new()
            .retry_initial_interval(Duration::from_secs(1))
            .retry_timeout(Duration::from_secs(60)),
    )
    .await;

    let ctx = Context::new();
    let handler = reader.tasks()[0].handler.clone();
    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = handler.handle(ctx, order_message()).await.unwrap_err();
    assert!(matches!(err, Error::Handler(_)));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert!(started.elapsed() < Duration::from_millis(500));
}
