use memex_core::error::{Classify, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("display `{0}` is unavailable")]
    DisplayUnavailable(String),

    #[error("ocr failed: {0}")]
    OcrFailed(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("record store failure: {0}")]
    Store(#[from] memex_store::StoreError),

    #[error("vector index failure: {0}")]
    Index(#[from] memex_index::IndexError),

    #[error("pending queue io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classify for CaptureError {
    fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::DisplayUnavailable(_) => ErrorKind::Unavailable,
            CaptureError::OcrFailed(_) | CaptureError::EmbeddingFailed(_) => ErrorKind::IoFailure,
            CaptureError::Store(e) => e.kind(),
            CaptureError::Index(e) => e.kind(),
            CaptureError::Io(_) => ErrorKind::IoFailure,
        }
    }
}
