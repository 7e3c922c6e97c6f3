//! Schema registry lookup.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{Error, Result};

/// Resolves `(definition name, version)` to a schema definition string.
///
/// Implementations backed by a remote registry should return
/// [`Error::MissingSchemaDefinition`] for unknown pairs and
/// [`Error::Driver`] for transport failures.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    async fn get_schema_definition(&self, name: &str, version: u32) -> Result<String>;
}

/// Schema registry held in process memory.
#[derive(Clone, Debug, Default)]
pub struct InMemorySchemaRegistry {
    definitions: HashMap<(String, u32), String>,
}

impl InMemorySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, replacing any existing one for the same pair.
    pub fn register(&mut self, name: impl Into<String>, version: u32, definition: impl Into<String>) {
        self.definitions
            .insert((name.into(), version), definition.into());
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_definition(
        mut self,
        name: impl Into<String>,
        version: u32,
        definition: impl Into<String>,
    ) -> Self {
        self.register(name, version, definition);
        self
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[async_trait]
impl SchemaRegistry for InMemorySchemaRegistry {
    async fn get_schema_definition(&self, name: &str, version: u32) -> Result<String> {
        self.definitions
            .get(&(name.to_string(), version))
            .cloned()
            .ok_or_else(|| Error::MissingSchemaDefinition {
                name: name.to_string(),
                version,
            })
    }
}
