use std::sync::Arc;

use async_trait::async_trait;

use super::Behavior;
use crate::context::Context;
use crate::error::Result;
use crate::hub::Hub;
use crate::message::Message;
use crate::reader::{MessageHandler, ReaderHandler, ReaderNode};

/// Carries the inbound flow into the handler's context.
///
/// The correlation id is copied from the envelope; the causation id becomes
/// the envelope's own id, so anything the handler publishes names this
/// message as its cause.
#[derive(Clone, Copy, Debug, Default)]
pub struct CorrelationBehavior;

impl Behavior for CorrelationBehavior {
    fn wrap(&self, _node: &ReaderNode, _hub: &Hub, next: ReaderHandler) -> ReaderHandler {
        Arc::new(CorrelationHandler { next })
    }
}

struct CorrelationHandler {
    next: ReaderHandler,
}

#[async_trait]
impl MessageHandler for CorrelationHandler {
    async fn handle(&self, ctx: Context, message: Message) -> Result<()> {
        let ctx = ctx
            .with_correlation_id(message.correlation_id.clone())
            .with_causation_id(message.id.clone());
        self.next.handle(ctx, message).await
    }
}
