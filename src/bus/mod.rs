//! Reference in-process transport.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  InMemoryBus (Writer + Reader)                │
//! │  write(msg) ──► bounded mpsc ──► dispatch loop                │
//! │                                     │                         │
//! │                 for each listener on msg.stream:              │
//! │                 acquire permit ─► spawn handler ─► release    │
//! └──────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼  ctx cancelled
//! ┌──────────────────────────────────────────────────────────────┐
//! │  shutdown watcher: close channel ─► join loop ─►              │
//! │  acquire all permits (handlers returned) ─► stopped           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Useful for tests, single-process deployments and prototyping against the
//! driver contracts before a broker is wired in.

mod in_memory;

pub use in_memory::InMemoryBus;

use serde::Deserialize;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_MAX_IN_FLIGHT: u32 = 100;

/// Bounds of an [`InMemoryBus`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Messages buffered between writers and the dispatch loop. Writers wait
    /// once the buffer is full.
    pub queue_capacity: usize,
    /// Handler invocations allowed to run at once.
    pub max_in_flight: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}
