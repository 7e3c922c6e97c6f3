use std::sync::Arc;

use async_trait::async_trait;

use super::Behavior;
use crate::context::Context;
use crate::error::Result;
use crate::hub::Hub;
use crate::message::Message;
use crate::reader::{MessageHandler, ReaderHandler, ReaderNode};

/// Stamps the node's consumer group onto each delivered message.
///
/// A node with an empty group leaves `group_name` as `None` rather than
/// `Some("")`.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupBehavior;

impl Behavior for GroupBehavior {
    fn wrap(&self, node: &ReaderNode, _hub: &Hub, next: ReaderHandler) -> ReaderHandler {
        Arc::new(GroupHandler {
            group: node.group.clone(),
            next,
        })
    }
}

struct GroupHandler {
    group: String,
    next: ReaderHandler,
}

#[async_trait]
impl MessageHandler for GroupHandler {
    async fn handle(&self, ctx: Context, mut message: Message) -> Result<()> {
        if !self.group.is_empty() {
            message.group_name = Some(self.group.clone());
        }
        self.next.handle(ctx, message).await
    }
}
