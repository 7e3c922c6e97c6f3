use async_trait::async_trait;

use super::Writer;
use crate::context::Context;
use crate::error::Result;
use crate::message::Message;

/// Writer that accepts and discards every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopWriter;

#[async_trait]
impl Writer for NoopWriter {
    async fn write(&self, _ctx: &Context, _message: Message) -> Result<()> {
        Ok(())
    }

    async fn write_batch(&self, _ctx: &Context, messages: Vec<Message>) -> Result<u32> {
        Ok(messages.len() as u32)
    }
}
