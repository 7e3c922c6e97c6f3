//! The transport-independent message envelope.
//!
//! `Message` follows the CloudEvents attribute set, extended with stream
//! routing fields and correlation/causation identifiers. Drivers serialize it
//! however their transport prefers; the JSON form produced by serde is the
//! reference wire shape, with `data` carried as base64.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// CloudEvents specification version stamped on every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// A payload decoded by the read path, type-erased.
///
/// Set by the unmarshal behavior when the stream was registered with a type
/// descriptor; recover the concrete value with [`Message::decoded`].
#[derive(Clone)]
pub struct DecodedData(Arc<dyn Any + Send + Sync>);

impl DecodedData {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub(crate) fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self(value)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for DecodedData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DecodedData(..)")
    }
}

/// A unit of data in flight.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub stream: String,
    pub stream_version: u32,
    pub id: String,
    pub source: String,
    #[serde(rename = "specversion")]
    pub spec_version: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    #[serde(rename = "datacontenttype", default, skip_serializing_if = "Option::is_none")]
    pub data_content_type: Option<String>,
    #[serde(rename = "dataschema", default, skip_serializing_if = "Option::is_none")]
    pub data_schema: Option<String>,
    #[serde(rename = "dataschemaversion", default, skip_serializing_if = "Option::is_none")]
    pub data_schema_version: Option<u32>,
    pub time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub correlation_id: String,
    pub causation_id: String,

    /// Consumer-side only: the payload decoded into its registered type.
    #[serde(skip)]
    pub decoded_data: Option<DecodedData>,
    /// Consumer-side only: the group of the reader node handling the message.
    #[serde(skip)]
    pub group_name: Option<String>,
}

/// Arguments for [`Message::new`].
#[derive(Clone, Debug, Default)]
pub struct NewMessageArgs {
    pub id: String,
    pub source: String,
    pub stream: String,
    pub stream_version: u32,
    pub data: Vec<u8>,
    pub content_type: Option<String>,
    pub schema_definition_name: Option<String>,
    pub schema_version: Option<u32>,
    pub subject: Option<String>,
}

impl Message {
    /// Build an envelope. Correlation and causation ids both start as the
    /// message's own id; the hub overrides them from the calling context.
    pub fn new(args: NewMessageArgs) -> Self {
        let message_type = compute_message_type(&args.source, &args.stream, args.stream_version);
        Self {
            correlation_id: args.id.clone(),
            causation_id: args.id.clone(),
            id: args.id,
            source: args.source,
            spec_version: SPEC_VERSION.to_string(),
            message_type,
            stream: args.stream,
            stream_version: args.stream_version,
            data: args.data,
            data_content_type: args.content_type,
            data_schema: args.schema_definition_name,
            data_schema_version: args.schema_version,
            time: Utc::now(),
            subject: args.subject,
            decoded_data: None,
            group_name: None,
        }
    }

    /// The decoded payload, if the read path decoded it into a `T`.
    pub fn decoded<T: Any>(&self) -> Option<&T> {
        self.decoded_data.as_ref()?.downcast_ref::<T>()
    }

    /// The raw payload as a string (if valid UTF-8).
    pub fn data_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

/// Derive the CloudEvents `type` attribute.
///
/// `source` is prefixed unless empty or already leading `stream`; a non-zero
/// version is appended as `.v{version}`.
pub fn compute_message_type(source: &str, stream: &str, stream_version: u32) -> String {
    let mut message_type = String::with_capacity(source.len() + stream.len() + 5);
    if !source.is_empty() && !stream.starts_with(source) {
        message_type.push_str(source);
        message_type.push('.');
    }
    message_type.push_str(stream);
    if stream_version > 0 {
        message_type.push_str(".v");
        message_type.push_str(&stream_version.to_string());
    }
    message_type
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
