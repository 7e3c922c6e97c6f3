use std::sync::Arc;

use tracing::debug;

use super::handler::ReaderHandler;
use super::node::ReaderNode;
use super::options::{
    ReaderOptions, DEFAULT_CONCURRENCY_LEVEL, DEFAULT_HANDLER_POOL_SIZE,
    DEFAULT_RETRY_INITIAL_INTERVAL, DEFAULT_RETRY_MAX_INTERVAL, DEFAULT_RETRY_TIMEOUT,
};
use crate::behavior::BehaviorChain;
use crate::context::Context;
use crate::driver::Reader;
use crate::error::Result;
use crate::hub::Hub;

/// Owns the reader nodes of a hub and starts them.
///
/// Nodes are kept in registration order; several nodes may listen on the
/// same stream (e.g. two consumer groups).
pub struct ReaderSupervisor {
    base_options: ReaderOptions,
    chain: BehaviorChain,
    default_driver: Option<Arc<dyn Reader>>,
    nodes: Vec<ReaderNode>,
}

impl ReaderSupervisor {
    pub fn new(
        base_options: ReaderOptions,
        chain: BehaviorChain,
        default_driver: Option<Arc<dyn Reader>>,
    ) -> Self {
        Self {
            base_options,
            chain,
            default_driver,
            nodes: Vec::new(),
        }
    }

    /// Build a node for `stream` with its handler wrapped in the behavior chain.
    ///
    /// Returns `None` for an empty stream name. Options resolve as
    /// compiled-in defaults, then hub base options, then `options`.
    pub fn fork_node(
        &self,
        hub: &Hub,
        stream: &str,
        handler: ReaderHandler,
        options: &ReaderOptions,
    ) -> Option<ReaderNode> {
        if stream.is_empty() {
            return None;
        }

        let resolved = self.defaults().merge(&self.base_options).merge(options);
        let mut node = ReaderNode {
            stream: stream.to_string(),
            handler: handler.clone(),
            group: resolved.group.unwrap_or_default(),
            concurrency_level: resolved
                .concurrency_level
                .unwrap_or(DEFAULT_CONCURRENCY_LEVEL),
            retry_initial_interval: resolved
                .retry_initial_interval
                .unwrap_or(DEFAULT_RETRY_INITIAL_INTERVAL),
            retry_max_interval: resolved
                .retry_max_interval
                .unwrap_or(DEFAULT_RETRY_MAX_INTERVAL),
            retry_timeout: resolved.retry_timeout.unwrap_or(DEFAULT_RETRY_TIMEOUT),
            handler_pool_size: resolved
                .handler_pool_size
                .unwrap_or(DEFAULT_HANDLER_POOL_SIZE),
            driver: resolved.driver,
            driver_config: resolved.driver_config,
        };
        node.handler = self.chain.compose(&node, hub, handler);

        debug!(
            stream = %node.stream,
            group = %node.group,
            behaviors = self.chain.len(),
            "reader node forked"
        );
        Some(node)
    }

    /// Append a forked node.
    pub fn register(&mut self, node: ReaderNode) {
        self.nodes.push(node);
    }

    /// Start every registered node once, in registration order.
    ///
    /// Not guarded against repeated calls; drivers that cannot tolerate a
    /// second `execute_task` for the same node must guard themselves.
    pub async fn start_nodes(&self, ctx: &Context) -> Result<()> {
        for node in &self.nodes {
            node.start(ctx).await?;
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[ReaderNode] {
        &self.nodes
    }

    /// Nodes listening on `stream`, in registration order.
    pub fn nodes_for<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a ReaderNode> + 'a {
        self.nodes.iter().filter(move |n| n.stream == stream)
    }

    pub fn behaviors(&self) -> &BehaviorChain {
        &self.chain
    }

    fn defaults(&self) -> ReaderOptions {
        ReaderOptions {
            concurrency_level: Some(DEFAULT_CONCURRENCY_LEVEL),
            retry_initial_interval: Some(DEFAULT_RETRY_INITIAL_INTERVAL),
            retry_max_interval: Some(DEFAULT_RETRY_MAX_INTERVAL),
            retry_timeout: Some(DEFAULT_RETRY_TIMEOUT),
            handler_pool_size: Some(DEFAULT_HANDLER_POOL_SIZE),
            driver: self.default_driver.clone(),
            ..ReaderOptions::default()
        }
    }
}
