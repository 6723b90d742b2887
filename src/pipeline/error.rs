use thiserror::Error;

use crate::pagination::{CursorDecodeError, PaginationError, PlanError};

/// Marker placed in front of every callback fault message returned to clients
pub const INTERNAL_ERROR_MARKER: &str = "Internal failure: ";

/// Failures raised while a request travels through the resource pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("authentication required")]
    AuthDenied { challenge: Option<String> },

    #[error("{0}")]
    ValidationFailed(String),

    #[error("Payload size exceeds the allowed limit of {limit} bytes.")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("payload could not be encoded: {0}")]
    EncodingFailure(#[from] serde_json::Error),

    #[error(transparent)]
    MalformedCursor(#[from] CursorDecodeError),

    #[error(transparent)]
    InvalidPage(#[from] PaginationError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    CallbackFault(String),
}

impl From<PlanError> for PipelineError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Page(e) => PipelineError::InvalidPage(e),
            PlanError::Cursor(e) => PipelineError::MalformedCursor(e),
        }
    }
}

impl PipelineError {
    pub fn callback_fault(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain
        PipelineError::CallbackFault(format!("{:#}", err))
    }

    /// Short label used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::AuthDenied { .. } => "auth_denied",
            PipelineError::ValidationFailed(_) => "validation_failed",
            PipelineError::PayloadTooLarge { .. } => "payload_too_large",
            PipelineError::EncodingFailure(_) => "encoding_failure",
            PipelineError::MalformedCursor(_) => "malformed_cursor",
            PipelineError::InvalidPage(_) => "invalid_page",
            PipelineError::BadRequest(_) => "bad_request",
            PipelineError::NotFound(_) => "not_found",
            PipelineError::CallbackFault(_) => "callback_fault",
        }
    }
}
