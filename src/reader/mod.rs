//! Read path: handlers, reader nodes, and the supervisor that schedules them.
//!
//! ```text
//! Hub::read ──► ReaderSupervisor::fork_node ──► BehaviorChain::compose
//!                        │
//!                        ▼
//!                  ReaderNode (per stream, N per stream allowed)
//!                        │  Hub::start
//!                        ▼
//!             Reader::execute_task × concurrency_level
//! ```

mod handler;
mod node;
mod options;
mod supervisor;

pub use handler::{MessageHandler, ReaderHandler};
pub use node::{DriverConfig, ReaderNode, ReaderTask};
pub use options::{
    ReaderOptions, DEFAULT_CONCURRENCY_LEVEL, DEFAULT_HANDLER_POOL_SIZE,
    DEFAULT_RETRY_INITIAL_INTERVAL, DEFAULT_RETRY_MAX_INTERVAL, DEFAULT_RETRY_TIMEOUT,
};
pub use supervisor::ReaderSupervisor;
