//! Shared fixtures: a driver that captures tasks and a writer that captures
//! envelopes, so tests can feed written messages back into read handlers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use streamhub::{
    Context, Message, Reader, ReaderTask, Result, StreamMessage, StreamMetadata, Writer,
};
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

pub fn orders_stream() -> StreamMetadata {
    StreamMetadata::new("orders").with_stream_version(1)
}

#[derive(Clone, Default)]
pub struct CapturingReader {
    pub tasks: Arc<Mutex<Vec<ReaderTask>>>,
}

impl CapturingReader {
    pub fn tasks(&self) -> Vec<ReaderTask> {
        self.tasks.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reader for CapturingReader {
    async fn execute_task(&self, _ctx: &Context, task: ReaderTask) -> Result<()> {
        self.tasks.lock().unwrap().push(task);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct CapturingWriter {
    pub messages: Arc<Mutex<Vec<Message>>>,
}

impl CapturingWriter {
    pub fn last(&self) -> Message {
        self.messages.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl Writer for CapturingWriter {
    async fn write(&self, _ctx: &Context, message: Message) -> Result<()> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}
