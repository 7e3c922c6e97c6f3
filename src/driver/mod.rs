//! Driver contracts - the seam between the hub and a concrete transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Hub                                 │
//! │  write path: envelope -> Writer                              │
//! │  read path:  ReaderNode -> ReaderTask -> Reader              │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Writer + Reader Traits                       │
//! │  Writer: write(msg) / write_batch(msgs)                      │
//! │  Reader: execute_task(task)                                  │
//! └─────────────────────────────────────────────────────────────┘
//!          │                  │                     │
//!          ▼                  ▼                     ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────────────┐
//! │ InMemoryBus │    │ Kafka       │    │ Cloud queue / bus   │
//! │ (included)  │    │ (external)  │    │    (external)       │
//! └─────────────┘    └─────────────┘    └─────────────────────┘
//! ```

mod log_writer;
mod noop;

pub use log_writer::LogWriter;
pub use noop::NoopWriter;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::message::Message;
use crate::reader::ReaderTask;

/// Publishes envelopes to a transport.
#[async_trait]
pub trait Writer: Send + Sync {
    /// Publish a single message.
    async fn write(&self, ctx: &Context, message: Message) -> Result<()>;

    /// Publish several messages, returning how many were accepted.
    ///
    /// Default implementation writes sequentially and stops at the first
    /// error. Implementations may override for batch optimization.
    async fn write_batch(&self, ctx: &Context, messages: Vec<Message>) -> Result<u32> {
        let mut written = 0;
        for message in messages {
            self.write(ctx, message).await?;
            written += 1;
        }
        Ok(written)
    }
}

/// Schedules reader tasks on a transport.
///
/// `execute_task` must not block on message delivery: the driver registers
/// the task (or spawns its consumer) and returns. Each call is one unit of
/// dispatch capacity the driver may map to a worker, partition consumer, or
/// subscription.
#[async_trait]
pub trait Reader: Send + Sync {
    async fn execute_task(&self, ctx: &Context, task: ReaderTask) -> Result<()>;
}
