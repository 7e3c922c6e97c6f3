use serde_json::Value;

use crate::error::Result;
use crate::registry::{MessagePayload, StreamMessage};

/// One entry of a [`Hub::write_batch`](super::Hub::write_batch).
///
/// Payloads are serialized when the item is built so a single batch can mix
/// message types.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchItem {
    pub(crate) key: String,
    pub(crate) data: Value,
    pub(crate) subject: Option<String>,
}

impl BatchItem {
    /// An item resolved through `T`'s stream key.
    pub fn new<T: StreamMessage>(payload: &T) -> Result<Self> {
        Self::by_key(T::STREAM_KEY, payload)
    }

    /// An item resolved through an arbitrary registry key.
    pub fn by_key<P: MessagePayload + ?Sized>(key: impl Into<String>, payload: &P) -> Result<Self> {
        Ok(Self {
            key: key.into(),
            data: serde_json::to_value(payload)?,
            subject: payload.subject(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
