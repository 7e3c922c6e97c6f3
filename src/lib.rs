//! Transport-agnostic pub/sub orchestration.
//!
//! A [`Hub`] binds payload types to streams, wraps them in CloudEvents-shaped
//! [`Message`] envelopes on the way out, and on the way in runs registered
//! handlers through a [`BehaviorChain`] (decode, group, correlation, retry)
//! on whatever transport the [`Writer`] / [`Reader`] drivers provide.
//! [`InMemoryBus`] is the bundled in-process transport.

extern crate self as streamhub;

pub mod behavior;
#[cfg(feature = "bus")]
pub mod bus;
mod codec;
mod context;
pub mod driver;
mod error;
pub mod hub;
mod identifier;
mod message;
pub mod reader;
mod registry;
mod schema;

pub use behavior::{
    Behavior, BehaviorChain, CorrelationBehavior, GroupBehavior, LoggingBehavior,
    RetryBehavior, RetryPolicy, UnmarshalBehavior,
};
#[cfg(feature = "bus")]
pub use bus::{BusConfig, InMemoryBus};
pub use codec::{Codec, JsonCodec, JSON_CONTENT_TYPE};
pub use context::{message_causation_id, message_correlation_id, Context};
pub use driver::{LogWriter, NoopWriter, Reader, Writer};
pub use error::{BoxError, CodecError, Error, Result};
pub use hub::{BatchItem, Hub, HubBuilder, HubConfig, ReaderConfig};
pub use identifier::{IdentifierFactory, UuidFactory};
pub use message::{compute_message_type, DecodedData, Message, NewMessageArgs, SPEC_VERSION};
pub use reader::{
    DriverConfig, MessageHandler, ReaderHandler, ReaderNode, ReaderOptions, ReaderSupervisor,
    ReaderTask,
};
pub use registry::{MessagePayload, StreamMessage, StreamMetadata, StreamRegistry, TypeDescriptor};
pub use schema::{InMemorySchemaRegistry, SchemaRegistry};

pub use streamhub_macros::StreamMessage;
