use std::sync::Arc;

use async_trait::async_trait;

use super::Behavior;
use crate::codec::Codec;
use crate::context::Context;
use crate::error::Result;
use crate::hub::Hub;
use crate::message::Message;
use crate::reader::{MessageHandler, ReaderHandler, ReaderNode};
use crate::registry::StreamRegistry;
use crate::schema::SchemaRegistry;

/// Decodes `data` into the stream's registered type and attaches it as
/// `decoded_data`.
///
/// Streams registered without a type descriptor (or unknown to the registry)
/// pass through undecoded. Decode failures abort the attempt.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnmarshalBehavior;

impl Behavior for UnmarshalBehavior {
    fn wrap(&self, _node: &ReaderNode, hub: &Hub, next: ReaderHandler) -> ReaderHandler {
        Arc::new(UnmarshalHandler {
            registry: hub.registry_snapshot(),
            codec: hub.codec(),
            schema_registry: hub.schema_registry(),
            next,
        })
    }
}

struct UnmarshalHandler {
    registry: Arc<StreamRegistry>,
    codec: Arc<dyn Codec>,
    schema_registry: Option<Arc<dyn SchemaRegistry>>,
    next: ReaderHandler,
}

#[async_trait]
impl MessageHandler for UnmarshalHandler {
    async fn handle(&self, ctx: Context, mut message: Message) -> Result<()> {
        let metadata = self.registry.get_by_stream_name(&message.stream).ok();
        if let Some(metadata) = metadata {
            if let Some(descriptor) = metadata.type_descriptor {
                let schema_def = match &self.schema_registry {
                    Some(schemas) if !metadata.schema_definition.is_empty() => {
                        schemas
                            .get_schema_definition(
                                &metadata.schema_definition,
                                metadata.schema_version,
                            )
                            .await?
                    }
                    _ => String::new(),
                };
                let value = self.codec.unmarshal(&schema_def, &message.data)?;
                message.decoded_data = Some(descriptor.decode(value)?);
            }
        }
        self.next.handle(ctx, message).await
    }
}
