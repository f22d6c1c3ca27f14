//! Error types for DBX entity streams.
//!
//! All public APIs return `StreamResult<T>` — no panics in library code.
//! Translation failures are not errors: they silently fall back to in-memory
//! evaluation and never surface here.

use thiserror::Error;

/// Unified error type for stream construction, execution and release.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Two NULL values compared under `NullOrder::None`
    #[error("cannot compare two null values of field '{field}' without a null order")]
    NullComparison { field: String },

    /// Predicate built with the wrong number of operands
    #[error("malformed predicate '{predicate}': expected {expected} operand(s), got {actual}")]
    PredicateShape {
        predicate: String,
        expected: String,
        actual: usize,
    },

    /// Underlying cursor / connection failed to close
    #[error("resource release failed: {0}")]
    ResourceRelease(String),

    /// Data source failed to produce rows
    #[error("fetch failed: {message}\nSQL: {sql}")]
    Fetch { message: String, sql: String },

    /// Row could not be converted into an entity
    #[error("row mapping failed: {0}")]
    RowMapping(String),

    /// Invalid operation
    #[error("invalid operation: {message}\nContext: {context}")]
    InvalidOperation { message: String, context: String },

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Standard I/O error
    #[error("io error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Result type alias for all stream operations.
pub type StreamResult<T> = Result<T, StreamError>;

// From 구현들
impl From<serde_json::Error> for StreamError {
    fn from(err: serde_json::Error) -> Self {
        StreamError::Serialization(err.to_string())
    }
}

/// 계산 결과와 close 결과를 합친다.
///
/// 계산 실패가 항상 우선하며, 그 경우 close 실패는 버리지 않고 로그로 남긴다.
pub(crate) fn finish<T>(result: StreamResult<T>, closed: StreamResult<()>) -> StreamResult<T> {
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_err)) => Err(close_err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            tracing::warn!(
                target: crate::logging::CLOSE,
                error = %close_err,
                "close failure suppressed by earlier stream failure"
            );
            Err(err)
        }
    }
}
