//! Message identifier generation.

use uuid::Uuid;

use crate::error::Result;

/// Produces unique message ids.
pub trait IdentifierFactory: Send + Sync {
    fn new_id(&self) -> Result<String>;
}

impl<F> IdentifierFactory for F
where
    F: Fn() -> Result<String> + Send + Sync,
{
    fn new_id(&self) -> Result<String> {
        self()
    }
}

/// Random (v4) UUIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidFactory;

impl IdentifierFactory for UuidFactory {
    fn new_id(&self) -> Result<String> {
        Ok(Uuid::new_v4().to_string())
    }
}
