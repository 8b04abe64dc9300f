use folio_layout::LayoutError;
use thiserror::Error;

/// Errors surfaced by document loading and pagination.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Document is invalid or missing required parts: {0}")]
    Config(String),

    #[error("Pagination stopped after {limit} pages")]
    PageLimitExceeded { limit: usize },
}

impl From<folio_traits::MetricsError> for PipelineError {
    fn from(e: folio_traits::MetricsError) -> Self {
        PipelineError::Layout(LayoutError::Metrics(e))
    }
}
