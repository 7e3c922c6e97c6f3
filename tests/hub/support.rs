//! Test domain: order events and a writer that records what it receives.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use streamhub::{Context, Message, Result, StreamMessage, Writer};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness; `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, StreamMessage)]
#[stream(key = "orders.OrderPlaced")]
pub struct OrderPlaced {
    #[stream(subject)]
    pub order_id: String,
    pub total: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, StreamMessage)]
pub struct OrderShipped {
    pub order_id: String,
    pub carrier: String,
}

/// Records every envelope and every batch call.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub messages: Arc<Mutex<Vec<Message>>>,
    pub batches: Arc<Mutex<Vec<usize>>>,
}

impl RecordingWriter {
    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Writer for RecordingWriter {
    async fn write(&self, _ctx: &Context, message: Message) -> Result<()> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }

    async fn write_batch(&self, _ctx: &Context, messages: Vec<Message>) -> Result<u32> {
        self.batches.lock().unwrap().push(messages.len());
        let count = messages.len() as u32;
        self.messages.lock().unwrap().extend(messages);
        Ok(count)
    }
}
