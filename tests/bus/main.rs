//! In-memory bus integration tests.
//!
//! The bus serves as both writer and default reader of a hub:
//! - Lifecycle errors before start and after shutdown
//! - Delivery to every listener, with decoded payloads
//! - Bounded parallelism and prompt cancellation on shutdown

mod support;
mod lifecycle;
mod delivery;
