use thiserror::Error;

/// Boxed error used for failures raised by application code and drivers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload could not be represented with the given schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("codec error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum Error {
    /// No stream metadata is registered under the lookup key.
    #[error("missing stream metadata for key `{0}`")]
    MissingStream(String),

    #[error("no writer configured on hub")]
    MissingWriter,

    #[error("missing schema definition `{name}` (version {version})")]
    MissingSchemaDefinition { name: String, version: u32 },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("identifier factory: {0}")]
    Identifier(#[source] BoxError),

    #[error("in-memory bus not started")]
    BusNotStarted,

    #[error("in-memory bus closed")]
    BusClosed,

    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error("handler: {0}")]
    Handler(#[source] BoxError),

    #[error("driver: {0}")]
    Driver(#[source] BoxError),
}

impl Error {
    /// Wrap an application error returned from a message handler.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Error::Handler(err.into())
    }

    /// Wrap an error raised by a transport driver.
    pub fn driver(err: impl Into<BoxError>) -> Self {
        Error::Driver(err.into())
    }

    /// Wrap an error raised by an identifier factory.
    pub fn identifier(err: impl Into<BoxError>) -> Self {
        Error::Identifier(err.into())
    }

    /// Whether the error came from the context ending rather than the work itself.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(CodecError::Json(err))
    }
}
