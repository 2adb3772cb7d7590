use thiserror::Error;

/// Unified error type for all sheaf operations.
///
/// Format, schema and key errors are raised synchronously at the decode /
/// translation / query entry points. Store pushes triggered by a bound field
/// mutation are fire-and-forget and report through the log instead (see
/// [`crate::Record::set`]).
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or truncated serialized input.
    #[error("malformed input: {0}")]
    Format(String),

    /// Two records joined into one view are structurally incompatible.
    #[error("incompatible schemas: {0}")]
    SchemaMismatch(String),

    /// Read or write of an undeclared field on a fixed-schema record.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The table has no registered primary key, or the target row is gone.
    #[error("no primary key registered for table {0}")]
    KeyNotFound(String),

    /// The adapter cannot perform the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The value's runtime kind has no safe textual literal form.
    #[error("no literal form for {0} value")]
    LiteralUnsupported(&'static str),

    /// I/O failure on the underlying byte pipe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque failure from a connector or other external collaborator.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for an opaque message error, mirroring `anyhow::Error::msg`.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Other(anyhow::Error::msg(message.into()))
    }
}
