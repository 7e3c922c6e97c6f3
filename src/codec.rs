//! Payload encoding strategies.
//!
//! A codec turns a payload into bytes for the envelope and back. Payloads cross
//! the codec boundary as `serde_json::Value`; conversion to and from concrete
//! types happens on the hub side (write) and through the registered
//! [`TypeDescriptor`](crate::registry::TypeDescriptor) (read), which keeps the
//! trait object-safe so a hub can hold any codec behind an `Arc`.

use serde_json::Value;

use crate::error::CodecError;

pub trait Codec: Send + Sync {
    /// Encode `data`. `schema_def` is the resolved schema definition, empty
    /// when no schema registry is configured.
    fn marshal(&self, schema_def: &str, data: &Value) -> Result<Vec<u8>, CodecError>;

    /// Decode `bytes` produced by [`Codec::marshal`].
    fn unmarshal(&self, schema_def: &str, bytes: &[u8]) -> Result<Value, CodecError>;

    /// MIME type stamped on envelopes as `datacontenttype`.
    fn content_type(&self) -> &str;
}

/// JSON codec. Ignores schema definitions.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

pub const JSON_CONTENT_TYPE: &str = "application/json";

impl Codec for JsonCodec {
    fn marshal(&self, _schema_def: &str, data: &Value) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(data)?)
    }

    fn unmarshal(&self, _schema_def: &str, bytes: &[u8]) -> Result<Value, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }
}
