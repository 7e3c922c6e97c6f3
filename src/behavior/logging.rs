use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info_span, warn, Instrument};

use super::Behavior;
use crate::context::Context;
use crate::error::Result;
use crate::hub::Hub;
use crate::message::Message;
use crate::reader::{MessageHandler, ReaderHandler, ReaderNode};

/// Opens a span per delivery and logs its outcome.
///
/// Not part of the default chain. Append it last to log once per delivery,
/// or before `RetryBehavior` to log every attempt.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingBehavior;

impl Behavior for LoggingBehavior {
    fn wrap(&self, node: &ReaderNode, _hub: &Hub, next: ReaderHandler) -> ReaderHandler {
        Arc::new(LoggingHandler {
            group: node.group.clone(),
            next,
        })
    }
}

struct LoggingHandler {
    group: String,
    next: ReaderHandler,
}

#[async_trait]
impl MessageHandler for LoggingHandler {
    async fn handle(&self, ctx: Context, message: Message) -> Result<()> {
        let span = info_span!(
            "message",
            stream = %message.stream,
            id = %message.id,
            group = %self.group,
            correlation_id = %message.correlation_id,
        );
        async move {
            let res = self.next.handle(ctx, message).await;
            match &res {
                Ok(()) => debug!("message handled"),
                Err(err) => warn!(error = %err, "message handling failed"),
            }
            res
        }
        .instrument(span)
        .await
    }
}
