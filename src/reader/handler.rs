use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::message::Message;

/// Processes one inbound message. Returning `Ok(())` acknowledges it.
///
/// Implemented for any `Fn(Context, Message) -> impl Future<Output = Result<()>>`,
/// so plain async closures can be registered directly:
///
/// ```ignore
/// hub.read::<OrderPlaced, _>(
///     |_ctx: Context, msg: Message| async move {
///         let order = msg.decoded::<OrderPlaced>();
///         Ok(())
///     },
///     ReaderOptions::new().group("billing"),
/// )?;
/// ```
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, ctx: Context, message: Message) -> Result<()>;
}

/// Shared, type-erased handler as stored on reader nodes and tasks.
pub type ReaderHandler = Arc<dyn MessageHandler>;

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(Context, Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: Context, message: Message) -> Result<()> {
        (self)(ctx, message).await
    }
}
