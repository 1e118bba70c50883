use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Domain not found: {0}")]
    NotFound(String),

    #[error("Integrity error at domain {id}: {reason}")]
    Integrity { id: String, reason: String },

    #[error("Invalid domain id: {0:?}")]
    InvalidId(String),

    #[error("Domain already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// Failure to obtain an embedding for one domain.
///
/// Recovered locally by the distance engine: the domain's pairs are left out
/// of the result instead of failing the whole batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    #[error("vector source failed: {0}")]
    Failed(String),

    #[error("vector source timed out after {0}ms")]
    Timeout(u64),

    #[error("wrong embedding dimension: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("vector source returned an empty embedding")]
    Empty,

    #[error("embedding contains non-finite values")]
    NonFinite,

    #[error("vector source unavailable: {0}")]
    Unavailable(String),
}
