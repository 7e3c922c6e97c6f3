use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::handler::ReaderHandler;
use crate::context::Context;
use crate::driver::Reader;
use crate::error::Result;

/// Opaque provider-specific configuration carried from options to the driver.
pub type DriverConfig = Arc<dyn Any + Send + Sync>;

/// A scheduled listening job bound to one stream.
///
/// Created by [`ReaderSupervisor::fork_node`](super::ReaderSupervisor::fork_node)
/// with its handler already wrapped in the behavior chain.
#[derive(Clone)]
pub struct ReaderNode {
    pub stream: String,
    pub handler: ReaderHandler,
    pub group: String,
    pub concurrency_level: usize,
    pub retry_initial_interval: Duration,
    pub retry_max_interval: Duration,
    pub retry_timeout: Duration,
    pub handler_pool_size: usize,
    pub driver: Option<Arc<dyn Reader>>,
    pub driver_config: Option<DriverConfig>,
}

/// Driver-facing view of a [`ReaderNode`], built fresh on every start.
#[derive(Clone)]
pub struct ReaderTask {
    pub stream: String,
    pub handler: ReaderHandler,
    pub group: String,
    /// Upper bound for one delivery, retries included.
    pub timeout: Duration,
    pub driver_config: Option<DriverConfig>,
}

impl ReaderNode {
    pub fn task(&self) -> ReaderTask {
        ReaderTask {
            stream: self.stream.clone(),
            handler: self.handler.clone(),
            group: self.group.clone(),
            timeout: self.retry_timeout,
            driver_config: self.driver_config.clone(),
        }
    }

    /// Hand the node to its driver, once per unit of concurrency.
    ///
    /// Does nothing when no driver is bound.
    pub async fn start(&self, ctx: &Context) -> Result<()> {
        let Some(driver) = &self.driver else {
            debug!(stream = %self.stream, "reader node has no driver, skipping");
            return Ok(());
        };

        for _ in 0..self.concurrency_level {
            driver.execute_task(ctx, self.task()).await?;
        }

        debug!(
            stream = %self.stream,
            group = %self.group,
            concurrency_level = self.concurrency_level,
            "reader node started"
        );
        Ok(())
    }
}

impl fmt::Debug for ReaderNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderNode")
            .field("stream", &self.stream)
            .field("group", &self.group)
            .field("concurrency_level", &self.concurrency_level)
            .field("retry_initial_interval", &self.retry_initial_interval)
            .field("retry_max_interval", &self.retry_max_interval)
            .field("retry_timeout", &self.retry_timeout)
            .field("handler_pool_size", &self.handler_pool_size)
            .field("driver", &self.driver.is_some())
            .finish()
    }
}

impl fmt::Debug for ReaderTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderTask")
            .field("stream", &self.stream)
            .field("group", &self.group)
            .field("timeout", &self.timeout)
            .finish()
    }
}
