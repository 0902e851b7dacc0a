use thiserror::Error;

/// Failures from reading or writing the three (four, with per-stream
/// revisions) persisted dataset files. These never propagate out of
/// [`crate::store::DatasetStore`] as hard errors — every call site
/// that can hit one treats it as a fallback-or-log-and-continue
/// condition, per the error handling design.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
