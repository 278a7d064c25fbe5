use memex_core::error::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("record store unreadable: {0}")]
    StoreUnreadable(String),

    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },
}

impl Classify for SyncError {
    fn kind(&self) -> ErrorKind {
        match self {
            SyncError::IndexUnavailable(_) => ErrorKind::Unavailable,
            SyncError::StoreUnreadable(_) => ErrorKind::IoFailure,
            SyncError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl From<memex_index::IndexError> for SyncError {
    fn from(e: memex_index::IndexError) -> Self {
        SyncError::IndexUnavailable(e.to_string())
    }
}

impl From<memex_store::StoreError> for SyncError {
    fn from(e: memex_store::StoreError) -> Self {
        SyncError::StoreUnreadable(e.to_string())
    }
}

/// Exit codes for the batch `memex-sync-cli` invocation (SPEC_FULL §6.5).
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const PARTIAL: i32 = 2;
    pub const INDEX_UNAVAILABLE: i32 = 3;
    pub const CONFIG_ERROR: i32 = 4;
    pub const STORE_UNREADABLE: i32 = 5;
}
