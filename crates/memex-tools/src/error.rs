use memex_core::error::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("record store failure: {0}")]
    Store(#[from] memex_store::StoreError),

    #[error("vector index failure: {0}")]
    Index(#[from] memex_index::IndexError),
}

impl Classify for ToolError {
    fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ToolError::Store(e) => e.kind(),
            ToolError::Index(e) => e.kind(),
        }
    }
}

impl From<memex_core::error::CoreError> for ToolError {
    fn from(e: memex_core::error::CoreError) -> Self {
        match e {
            memex_core::error::CoreError::InvalidArgument { field, message } => {
                ToolError::InvalidArgument { field, message }
            }
            other => ToolError::InvalidArgument {
                field: "date".to_string(),
                message: other.to_string(),
            },
        }
    }
}
