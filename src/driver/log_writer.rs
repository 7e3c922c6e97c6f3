use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use super::Writer;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::message::Message;

/// A writer that logs envelopes through `tracing` or into a buffer.
pub struct LogWriter {
    buffer: Option<Arc<Mutex<Vec<String>>>>,
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogWriter {
    pub fn new() -> Self {
        LogWriter { buffer: None }
    }

    pub fn with_buffer(buffer: Arc<Mutex<Vec<String>>>) -> Self {
        LogWriter {
            buffer: Some(buffer),
        }
    }
}

#[async_trait]
impl Writer for LogWriter {
    async fn write(&self, _ctx: &Context, message: Message) -> Result<()> {
        let payload = String::from_utf8_lossy(&message.data);
        if let Some(buffer) = &self.buffer {
            let line = format!(
                "[{}] {} {} {}",
                message.stream, message.message_type, message.id, payload
            );
            let mut buffer = buffer
                .lock()
                .map_err(|_| Error::LockPoisoned("log writer buffer"))?;
            buffer.push(line);
        } else {
            info!(
                stream = %message.stream,
                message_type = %message.message_type,
                id = %message.id,
                correlation_id = %message.correlation_id,
                payload = %payload,
                "message written"
            );
        }
        Ok(())
    }
}
