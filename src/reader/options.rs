use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::node::DriverConfig;
use crate::driver::Reader;

pub const DEFAULT_CONCURRENCY_LEVEL: usize = 1;
pub const DEFAULT_RETRY_INITIAL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_RETRY_MAX_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_HANDLER_POOL_SIZE: usize = 10;

/// Partial reader node configuration.
///
/// Unset fields fall through to the next layer when options are merged:
/// compiled-in defaults, then hub base options, then call-site options.
#[derive(Clone, Default)]
pub struct ReaderOptions {
    pub group: Option<String>,
    pub concurrency_level: Option<usize>,
    pub retry_initial_interval: Option<Duration>,
    pub retry_max_interval: Option<Duration>,
    pub retry_timeout: Option<Duration>,
    pub handler_pool_size: Option<usize>,
    pub driver: Option<Arc<dyn Reader>>,
    pub driver_config: Option<DriverConfig>,
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn concurrency_level(mut self, level: usize) -> Self {
        self.concurrency_level = Some(level);
        self
    }

    pub fn retry_initial_interval(mut self, interval: Duration) -> Self {
        self.retry_initial_interval = Some(interval);
        self
    }

    pub fn retry_max_interval(mut self, interval: Duration) -> Self {
        self.retry_max_interval = Some(interval);
        self
    }

    pub fn retry_timeout(mut self, timeout: Duration) -> Self {
        self.retry_timeout = Some(timeout);
        self
    }

    pub fn handler_pool_size(mut self, size: usize) -> Self {
        self.handler_pool_size = Some(size);
        self
    }

    /// Bind the node to a specific reader driver instead of the hub default.
    pub fn driver<R: Reader + 'static>(mut self, driver: Arc<R>) -> Self {
        self.driver = Some(driver as Arc<dyn Reader>);
        self
    }

    /// Provider-specific configuration handed through to the driver untouched.
    pub fn driver_config<C: std::any::Any + Send + Sync>(mut self, config: C) -> Self {
        self.driver_config = Some(Arc::new(config) as DriverConfig);
        self
    }

    /// Overlay `other` on top of `self`; fields set in `other` win.
    pub fn merge(mut self, other: &ReaderOptions) -> Self {
        if other.group.is_some() {
            self.group = other.group.clone();
        }
        if other.concurrency_level.is_some() {
            self.concurrency_level = other.concurrency_level;
        }
        if other.retry_initial_interval.is_some() {
            self.retry_initial_interval = other.retry_initial_interval;
        }
        if other.retry_max_interval.is_some() {
            self.retry_max_interval = other.retry_max_interval;
        }
        if other.retry_timeout.is_some() {
            self.retry_timeout = other.retry_timeout;
        }
        if other.handler_pool_size.is_some() {
            self.handler_pool_size = other.handler_pool_size;
        }
        if other.driver.is_some() {
            self.driver = other.driver.clone();
        }
        if other.driver_config.is_some() {
            self.driver_config = other.driver_config.clone();
        }
        self
    }
}

impl fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("group", &self.group)
            .field("concurrency_level", &self.concurrency_level)
            .field("retry_initial_interval", &self.retry_initial_interval)
            .field("retry_max_interval", &self.retry_max_interval)
            .field("retry_timeout", &self.retry_timeout)
            .field("handler_pool_size", &self.handler_pool_size)
            .field("driver", &self.driver.is_some())
            .field("driver_config", &self.driver_config.is_some())
            .finish()
    }
}
