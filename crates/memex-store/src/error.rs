use memex_core::error::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("id `{0}` already exists")]
    DuplicateId(String),

    #[error("id `{0}` not found")]
    NotFound(String),

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DuplicateId(_) => ErrorKind::DuplicateId,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::MalformedRecord(_) => ErrorKind::MalformedRecord,
            StoreError::Io(_) => ErrorKind::IoFailure,
            StoreError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }
}
