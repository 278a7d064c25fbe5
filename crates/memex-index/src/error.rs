use memex_core::error::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector index unavailable: {0}")]
    Unavailable(String),

    #[error("id `{0}` not found in index")]
    NotFound(String),

    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("encode error: {0}")]
    Encode(String),

    #[error("decode error: {0}")]
    Decode(String),
}

impl IndexError {
    pub fn backend(message: impl Into<String>) -> Self {
        IndexError::Unavailable(message.into())
    }
}

impl Classify for IndexError {
    fn kind(&self) -> ErrorKind {
        match self {
            IndexError::Unavailable(_) => ErrorKind::Unavailable,
            IndexError::NotFound(_) => ErrorKind::NotFound,
            IndexError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            IndexError::Encode(_) | IndexError::Decode(_) => ErrorKind::MalformedRecord,
        }
    }
}
