use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::reader::ReaderOptions;

/// Serializable hub settings.
///
/// ```json
/// { "instance_name": "com.orders",
///   "reader": { "group": "billing", "retry_timeout_ms": 30000 } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub instance_name: String,
    pub reader: ReaderConfig,
}

/// Base reader options. Unset fields fall back to the compiled-in defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub group: Option<String>,
    pub concurrency_level: Option<usize>,
    pub retry_initial_interval_ms: Option<u64>,
    pub retry_max_interval_ms: Option<u64>,
    pub retry_timeout_ms: Option<u64>,
    pub handler_pool_size: Option<usize>,
}

impl HubConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ReaderConfig {
    pub fn to_options(&self) -> ReaderOptions {
        ReaderOptions {
            group: self.group.clone(),
            concurrency_level: self.concurrency_level,
            retry_initial_interval: self.retry_initial_interval_ms.map(Duration::from_millis),
            retry_max_interval: self.retry_max_interval_ms.map(Duration::from_millis),
            retry_timeout: self.retry_timeout_ms.map(Duration::from_millis),
            handler_pool_size: self.handler_pool_size,
            ..ReaderOptions::default()
        }
    }
}
