//! Read-side middleware.
//!
//! A [`Behavior`] wraps a handler with one cross-cutting concern. A
//! [`BehaviorChain`] composes stages in list order, each stage wrapping the
//! handler produced by the previous one, so the **first stage runs innermost
//! and the last stage runs outermost**. With the default chain
//!
//! ```text
//! [Unmarshal, Group, Correlation, Retry]
//! ```
//!
//! a delivery flows as
//!
//! ```text
//! Retry ─► Correlation ─► Group ─► Unmarshal ─► caller's handler
//! ```
//!
//! so every retry attempt re-runs decoding and context injection, and the
//! caller always sees decoded data, its group, and the flow's ids.

mod correlation;
mod group;
mod logging;
pub mod retry;
mod unmarshal;

pub use correlation::CorrelationBehavior;
pub use group::GroupBehavior;
pub use logging::LoggingBehavior;
pub use retry::{RetryBehavior, RetryPolicy};
pub use unmarshal::UnmarshalBehavior;

use std::sync::Arc;

use crate::hub::Hub;
use crate::reader::{ReaderHandler, ReaderNode};

/// A middleware stage: `(node, hub, next) -> handler`.
pub trait Behavior: Send + Sync {
    fn wrap(&self, node: &ReaderNode, hub: &Hub, next: ReaderHandler) -> ReaderHandler;
}

/// Ordered list of behaviors applied to every forked reader node.
#[derive(Clone)]
pub struct BehaviorChain {
    stages: Vec<Arc<dyn Behavior>>,
}

impl Default for BehaviorChain {
    /// Unmarshal, group injection, correlation/causation injection, retry.
    fn default() -> Self {
        Self::new()
            .with(UnmarshalBehavior)
            .with(GroupBehavior)
            .with(CorrelationBehavior)
            .with(RetryBehavior)
    }
}

impl BehaviorChain {
    /// An empty chain: handlers run unwrapped.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append a stage. It will wrap (run outside of) every stage before it.
    pub fn with<B: Behavior + 'static>(mut self, behavior: B) -> Self {
        self.stages.push(Arc::new(behavior));
        self
    }

    /// Compose `handler` through every stage in list order.
    pub fn compose(&self, node: &ReaderNode, hub: &Hub, handler: ReaderHandler) -> ReaderHandler {
        self.stages
            .iter()
            .fold(handler, |next, stage| stage.wrap(node, hub, next))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
