//! Crate-crossing error classification.
//!
//! Every crate in the workspace defines its own `thiserror` enum for its
//! own failure modes, but each variant maps onto one of the semantic kinds
//! here so that callers (the tool service, the capture loop) can branch on
//! "what kind of problem is this" without matching on every crate's error
//! type individually.
use thiserror::Error;

/// Semantic error classification shared across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateId,
    IoFailure,
    Unavailable,
    Timeout,
    MalformedRecord,
    InvalidArgument,
}

impl ErrorKind {
    /// Whether the core should attempt local recovery for this kind rather
    /// than surface it to the caller unchanged.
    pub fn recoverable_locally(self) -> bool {
        matches!(
            self,
            ErrorKind::Unavailable | ErrorKind::Timeout | ErrorKind::MalformedRecord
        )
    }
}

/// A value that can classify itself into an [`ErrorKind`].
///
/// Implemented by every crate's error enum so shared helpers (retry,
/// fallback dispatch) can operate generically.
pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

/// Errors produced directly by `memex-core` helpers (config loading, time
/// parsing).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid argument `{field}`: {message}")]
    InvalidArgument { field: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Classify for CoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            CoreError::Config(_) => ErrorKind::InvalidArgument,
            CoreError::Io(_) => ErrorKind::IoFailure,
        }
    }
}

/// Retry a fallible operation with bounded exponential backoff plus jitter.
///
/// Used for `IoFailure`-classified operations per the error handling
/// design: three attempts, base 50ms, factor 2, persistent failure is
/// surfaced to the caller.
pub async fn retry_io<T, E, F, Fut>(mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    use rand::Rng;

    const ATTEMPTS: u32 = 3;
    const BASE_MS: u64 = 50;

    let mut last_err = None;
    for attempt in 0..ATTEMPTS {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                last_err = Some(e);
                if attempt + 1 < ATTEMPTS {
                    let jitter_ms = rand::thread_rng().gen_range(0..BASE_MS);
                    let backoff = BASE_MS * (1 << attempt) + jitter_ms;
                    tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once"))
}
