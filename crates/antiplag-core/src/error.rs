//! Error taxonomy shared by the storage and analysis engines.

use thiserror::Error;

use crate::models::DocumentId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No catalog row exists for the id.
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The catalog row exists but its content is gone from the blob store.
    #[error("content for document {id} not found in storage at {location}")]
    BlobMissing { id: DocumentId, location: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    InvalidInput,
    Internal,
}

impl Error {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Error::Storage(err.to_string())
    }

    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Error::Upstream(err.to_string())
    }

    /// `BlobMissing` is a data-integrity fault internally but reads as
    /// "not found" to clients.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::NotFound(_) | Error::BlobMissing { .. } => ErrorClass::NotFound,
            Error::InvalidInput(_) => ErrorClass::InvalidInput,
            Error::Storage(_) | Error::Upstream(_) => ErrorClass::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
