//! Error types shared by the compilers and the execution session.

/// Errors raised while compiling or running a statement.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request has the wrong shape (empty values, bad BETWEEN range, ...).
    #[error("argument error: {0}")]
    Argument(String),

    /// A keyword that is not part of the operator/connector vocabulary.
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// A strict `get` found no row.
    #[error("{0}")]
    EmptyResultPolicy(String),

    /// Error reported by the database driver, passed through untouched.
    #[error("driver error: {0}")]
    Driver(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub(crate) fn driver<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Driver(Box::new(err))
    }
}

/// Result type for compiler and session operations.
pub type Result<T> = std::result::Result<T, Error>;
