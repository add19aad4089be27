use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("page count mismatch: expected {expected}, composed {actual}")]
    PageCount { expected: usize, actual: usize },

    #[error("pdf assembly error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
