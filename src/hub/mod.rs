//! The hub: stream registry, write path and reader registration in one value.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                            Hub                                │
//! │                                                               │
//! │  set_stream::<T>()   ──►  StreamRegistry (Arc, copy-on-write) │
//! │                                                               │
//! │  write::<T>(payload) ──►  schema ─► codec ─► id ─► Message    │
//! │                                                 │             │
//! │                                                 ▼             │
//! │                                              Writer           │
//! │                                                               │
//! │  read::<T>(handler)  ──►  ReaderSupervisor                    │
//! │                             fork_node ─► BehaviorChain        │
//! │  start(ctx)          ──►    start_nodes ─► Reader driver      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Registration (`set_stream*`, `read*`) takes `&mut self` and happens during
//! setup. Traffic (`write*`, `start`) takes `&self`, so a built hub can be
//! shared behind an `Arc`.
//!
//! ## Example
//!
//! ```ignore
//! let bus = InMemoryBus::new(BusConfig::default());
//! let mut hub = Hub::builder()
//!     .instance_name("com.orders")
//!     .writer(Arc::new(bus.clone()))
//!     .reader(Arc::new(bus.clone()))
//!     .build();
//!
//! hub.set_stream::<OrderPlaced>(StreamMetadata::new("orders").with_stream_version(1));
//! hub.read::<OrderPlaced, _>(on_order_placed, ReaderOptions::new().group("billing"))?;
//!
//! bus.start(&ctx)?;
//! hub.start(&ctx).await?;
//! hub.write(&ctx, &OrderPlaced { id: "o-1".into() }).await?;
//! ```

mod batch;
mod config;

pub use batch::BatchItem;
pub use config::{HubConfig, ReaderConfig};

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::behavior::BehaviorChain;
use crate::codec::{Codec, JsonCodec};
use crate::context::{message_causation_id, message_correlation_id, Context};
use crate::driver::{Reader, Writer};
use crate::error::{Error, Result};
use crate::identifier::{IdentifierFactory, UuidFactory};
use crate::message::{Message, NewMessageArgs};
use crate::reader::{MessageHandler, ReaderHandler, ReaderOptions, ReaderSupervisor};
use crate::registry::{MessagePayload, StreamMessage, StreamMetadata, StreamRegistry};
use crate::schema::SchemaRegistry;

pub struct Hub {
    instance_name: String,
    registry: Arc<StreamRegistry>,
    writer: Option<Arc<dyn Writer>>,
    codec: Arc<dyn Codec>,
    id_factory: Arc<dyn IdentifierFactory>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
    supervisor: ReaderSupervisor,
}

impl Hub {
    pub fn builder() -> HubBuilder {
        HubBuilder::default()
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    // -- registry ----------------------------------------------------------

    /// Bind `T` to a stream.
    pub fn set_stream<T: StreamMessage>(&mut self, metadata: StreamMetadata) {
        Arc::make_mut(&mut self.registry).set::<T>(metadata);
    }

    /// Bind an arbitrary key (usually the stream name) to a stream.
    pub fn set_stream_by_key(&mut self, key: impl Into<String>, metadata: StreamMetadata) {
        Arc::make_mut(&mut self.registry).set_by_string(key, metadata);
    }

    pub fn registry(&self) -> &StreamRegistry {
        &self.registry
    }

    /// The registry as it stands now. Later registrations are not visible
    /// through the returned handle.
    pub fn registry_snapshot(&self) -> Arc<StreamRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.codec)
    }

    pub fn schema_registry(&self) -> Option<Arc<dyn SchemaRegistry>> {
        self.schema_registry.clone()
    }

    // -- write path --------------------------------------------------------

    /// Publish `payload` to the stream registered for `T`.
    pub async fn write<T: StreamMessage>(&self, ctx: &Context, payload: &T) -> Result<()> {
        self.write_by_key(ctx, T::STREAM_KEY, payload).await
    }

    /// Publish `payload` to the stream registered under `key`.
    pub async fn write_by_key<P>(&self, ctx: &Context, key: &str, payload: &P) -> Result<()>
    where
        P: MessagePayload + Sync + ?Sized,
    {
        let writer = self.writer()?;
        let data = serde_json::to_value(payload)?;
        let message = self
            .build_message(ctx, key, &data, payload.subject())
            .await?;
        writer.write(ctx, message).await
    }

    /// Publish several payloads in one writer call.
    ///
    /// Every envelope is built before anything is handed to the writer; the
    /// first failure aborts the batch with nothing written.
    pub async fn write_batch(&self, ctx: &Context, items: Vec<BatchItem>) -> Result<u32> {
        let writer = self.writer()?;
        let mut messages = Vec::with_capacity(items.len());
        for item in items {
            let message = self
                .build_message(ctx, &item.key, &item.data, item.subject)
                .await?;
            messages.push(message);
        }
        writer.write_batch(ctx, messages).await
    }

    /// Hand a pre-built envelope straight to the writer.
    pub async fn write_raw_message(&self, ctx: &Context, message: Message) -> Result<()> {
        self.writer()?.write(ctx, message).await
    }

    pub async fn write_raw_batch(&self, ctx: &Context, messages: Vec<Message>) -> Result<u32> {
        self.writer()?.write_batch(ctx, messages).await
    }

    fn writer(&self) -> Result<&Arc<dyn Writer>> {
        self.writer.as_ref().ok_or(Error::MissingWriter)
    }

    async fn build_message(
        &self,
        ctx: &Context,
        key: &str,
        data: &Value,
        subject: Option<String>,
    ) -> Result<Message> {
        let metadata = self.registry.get_by_string(key)?;

        let schema_def = match &self.schema_registry {
            Some(schemas) if !metadata.schema_definition.is_empty() => {
                schemas
                    .get_schema_definition(&metadata.schema_definition, metadata.schema_version)
                    .await?
            }
            _ => String::new(),
        };
        let encoded = self.codec.marshal(&schema_def, data)?;
        let id = self.id_factory.new_id()?;

        let (schema_name, schema_version) = if metadata.schema_definition.is_empty() {
            (None, None)
        } else {
            (
                Some(metadata.schema_definition.clone()),
                Some(metadata.schema_version),
            )
        };

        let mut message = Message::new(NewMessageArgs {
            id,
            source: self.instance_name.clone(),
            stream: metadata.stream.clone(),
            stream_version: metadata.stream_version,
            data: encoded,
            content_type: Some(self.codec.content_type().to_string()),
            schema_definition_name: schema_name,
            schema_version,
            subject,
        });
        message.correlation_id = message_correlation_id(ctx, &message.id);
        message.causation_id = message_causation_id(ctx, &message.correlation_id);
        Ok(message)
    }

    // -- read path ---------------------------------------------------------

    /// Register `handler` for the stream bound to `T`.
    pub fn read<T, H>(&mut self, handler: H, options: ReaderOptions) -> Result<()>
    where
        T: StreamMessage,
        H: MessageHandler + 'static,
    {
        self.read_by_key(T::STREAM_KEY, handler, options)
    }

    /// Register `handler` for the stream bound to `key`.
    pub fn read_by_key<H>(&mut self, key: &str, handler: H, options: ReaderOptions) -> Result<()>
    where
        H: MessageHandler + 'static,
    {
        let stream = self.registry.get_by_string(key)?.stream.clone();
        let handler: ReaderHandler = Arc::new(handler);
        if let Some(node) = self.supervisor.fork_node(self, &stream, handler, &options) {
            self.supervisor.register(node);
        }
        Ok(())
    }

    /// Start every registered reader node.
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        debug!(
            instance = %self.instance_name,
            nodes = self.supervisor.nodes().len(),
            "starting reader nodes"
        );
        self.supervisor.start_nodes(ctx).await
    }

    pub fn supervisor(&self) -> &ReaderSupervisor {
        &self.supervisor
    }
}

/// Builder for [`Hub`].
///
/// Defaults: JSON codec, UUID v4 ids, no writer, no reader driver, no schema
/// registry, the default behavior chain.
#[derive(Default)]
pub struct HubBuilder {
    instance_name: String,
    writer: Option<Arc<dyn Writer>>,
    reader: Option<Arc<dyn Reader>>,
    codec: Option<Arc<dyn Codec>>,
    id_factory: Option<Arc<dyn IdentifierFactory>>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
    reader_base_options: ReaderOptions,
    behaviors: Option<BehaviorChain>,
}

impl HubBuilder {
    /// Seed the instance name and base reader options from `config`.
    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            instance_name: config.instance_name.clone(),
            reader_base_options: config.reader.to_options(),
            ..Self::default()
        }
    }

    /// Used as the `source` attribute of every published envelope.
    pub fn instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    pub fn writer<W: Writer + 'static>(mut self, writer: Arc<W>) -> Self {
        self.writer = Some(writer as Arc<dyn Writer>);
        self
    }

    /// Default reader driver for nodes that do not name their own.
    pub fn reader<R: Reader + 'static>(mut self, reader: Arc<R>) -> Self {
        self.reader = Some(reader as Arc<dyn Reader>);
        self
    }

    pub fn codec<C: Codec + 'static>(mut self, codec: C) -> Self {
        self.codec = Some(Arc::new(codec) as Arc<dyn Codec>);
        self
    }

    pub fn id_factory<F: IdentifierFactory + 'static>(mut self, factory: F) -> Self {
        self.id_factory = Some(Arc::new(factory) as Arc<dyn IdentifierFactory>);
        self
    }

    pub fn schema_registry<S: SchemaRegistry + 'static>(mut self, registry: S) -> Self {
        self.schema_registry = Some(Arc::new(registry) as Arc<dyn SchemaRegistry>);
        self
    }

    /// Options applied to every node before call-site options.
    pub fn reader_base_options(mut self, options: ReaderOptions) -> Self {
        self.reader_base_options = options;
        self
    }

    /// Replace the default behavior chain.
    pub fn behaviors(mut self, chain: BehaviorChain) -> Self {
        self.behaviors = Some(chain);
        self
    }

    pub fn build(self) -> Hub {
        Hub {
            instance_name: self.instance_name,
            registry: Arc::new(StreamRegistry::new()),
            writer: self.writer,
            codec: self.codec.unwrap_or_else(|| Arc::new(JsonCodec)),
            id_factory: self.id_factory.unwrap_or_else(|| Arc::new(UuidFactory)),
            schema_registry: self.schema_registry,
            supervisor: ReaderSupervisor::new(
                self.reader_base_options,
                self.behaviors.unwrap_or_default(),
                self.reader,
            ),
        }
    }
}
