//! Stream registry: maps message types and custom keys to stream metadata.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CodecError, Error, Result};
use crate::message::DecodedData;

/// A payload that can be published through a hub.
///
/// `subject` is the optional "has subject" capability: when it returns a
/// value, the envelope's `subject` attribute is set from it.
pub trait MessagePayload: Serialize {
    fn subject(&self) -> Option<String> {
        None
    }
}

impl MessagePayload for Value {}

/// A message type bound to a stable registry key.
///
/// The key is an explicit token, normally generated with
/// `#[derive(StreamMessage)]`, and must not change between releases since
/// both the write and read paths resolve streams through it.
pub trait StreamMessage: MessagePayload + DeserializeOwned + Send + Sync + 'static {
    const STREAM_KEY: &'static str;
}

type DecodeFn = fn(Value) -> Result<Arc<dyn Any + Send + Sync>, CodecError>;

/// Describes the concrete type a stream's payload decodes into.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    key: &'static str,
    decode: DecodeFn,
}

impl TypeDescriptor {
    pub fn of<T: StreamMessage>() -> Self {
        Self {
            key: T::STREAM_KEY,
            decode: decode_as::<T>,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Convert a codec-decoded value into the described type.
    pub fn decode(&self, value: Value) -> Result<DecodedData, CodecError> {
        (self.decode)(value).map(DecodedData::from_arc)
    }
}

fn decode_as<T>(value: Value) -> Result<Arc<dyn Any + Send + Sync>, CodecError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    let decoded: T = serde_json::from_value(value)?;
    Ok(Arc::new(decoded))
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.key).finish()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for TypeDescriptor {}

/// Transport and schema facts bound to a message kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamMetadata {
    pub stream: String,
    #[serde(default)]
    pub stream_version: u32,
    #[serde(default)]
    pub schema_definition: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(skip)]
    pub type_descriptor: Option<TypeDescriptor>,
}

impl StreamMetadata {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            ..Default::default()
        }
    }

    pub fn with_stream_version(mut self, version: u32) -> Self {
        self.stream_version = version;
        self
    }

    pub fn with_schema(mut self, definition: impl Into<String>, version: u32) -> Self {
        self.schema_definition = definition.into();
        self.schema_version = version;
        self
    }
}

/// Lookup table from registration key to [`StreamMetadata`].
///
/// Populated during setup and read on every publish and delivery. Entries are
/// never removed.
#[derive(Clone, Debug, Default)]
pub struct StreamRegistry {
    entries: HashMap<String, StreamMetadata>,
    /// Stream name -> first key registered for it.
    stream_index: HashMap<String, String>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metadata` under `T`'s stream key, attaching its type descriptor.
    pub fn set<T: StreamMessage>(&mut self, mut metadata: StreamMetadata) {
        metadata.type_descriptor = Some(TypeDescriptor::of::<T>());
        self.set_by_string(T::STREAM_KEY, metadata);
    }

    /// Register `metadata` under an arbitrary key, usually the stream name.
    pub fn set_by_string(&mut self, key: impl Into<String>, metadata: StreamMetadata) {
        let key = key.into();

        if let Some(previous) = self.entries.get(&key) {
            if previous.stream != metadata.stream
                && self.stream_index.get(&previous.stream) == Some(&key)
            {
                let stale = previous.stream.clone();
                self.stream_index.remove(&stale);
                if let Some(other) = self
                    .entries
                    .iter()
                    .find(|(k, m)| **k != key && m.stream == stale)
                    .map(|(k, _)| k.clone())
                {
                    self.stream_index.insert(stale, other);
                }
            }
        }

        self.stream_index
            .entry(metadata.stream.clone())
            .or_insert_with(|| key.clone());
        self.entries.insert(key, metadata);
    }

    pub fn get<T: StreamMessage>(&self) -> Result<&StreamMetadata> {
        self.get_by_string(T::STREAM_KEY)
    }

    pub fn get_by_string(&self, key: &str) -> Result<&StreamMetadata> {
        self.entries
            .get(key)
            .ok_or_else(|| Error::MissingStream(key.to_string()))
    }

    /// Resolve metadata from a wire-level stream name.
    ///
    /// Tries `name` as a registration key first, then falls back to the
    /// stream-name index for entries registered under a type key.
    pub fn get_by_stream_name(&self, name: &str) -> Result<&StreamMetadata> {
        if let Some(metadata) = self.entries.get(name) {
            return Ok(metadata);
        }
        self.stream_index
            .get(name)
            .and_then(|key| self.entries.get(key))
            .ok_or_else(|| Error::MissingStream(name.to_string()))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StreamMetadata)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
