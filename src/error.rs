// HTTP API Error Types
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::pagination::{CursorDecodeError, PaginationError};
use crate::pipeline::error::{PipelineError, INTERNAL_ERROR_MARKER};

/// HTTP API error with appropriate status codes and client-friendly messages.
///
/// Bodies are plain text. A 401 carries no body, only the challenge header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized { challenge: Option<String> },

    // 404 Not Found
    NotFound(String),

    // 413 Payload Too Large (outbound)
    PayloadTooLarge(String),

    // 422 Unprocessable Entity (validation message passed through verbatim)
    UnprocessableEntity(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized { .. } => "",
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge(msg) => msg,
            ApiError::UnprocessableEntity(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Get error code for log correlation
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(challenge: Option<String>) -> Self {
        ApiError::Unauthorized { challenge }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(format!("{}{}", INTERNAL_ERROR_MARKER, message.into()))
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::AuthDenied { challenge } => ApiError::unauthorized(challenge),
            PipelineError::ValidationFailed(msg) => ApiError::unprocessable_entity(msg),
            e @ PipelineError::PayloadTooLarge { .. } => ApiError::PayloadTooLarge(e.to_string()),
            PipelineError::EncodingFailure(e) => {
                tracing::error!("Response encoding failed: {}", e);
                ApiError::internal_server_error(format!("payload could not be encoded: {}", e))
            }
            e @ PipelineError::MalformedCursor(_) => {
                ApiError::bad_request(format!("Invalid pagination token: {}", e))
            }
            PipelineError::InvalidPage(e) => ApiError::bad_request(e.to_string()),
            PipelineError::BadRequest(msg) => ApiError::bad_request(msg),
            PipelineError::NotFound(msg) => ApiError::not_found(msg),
            PipelineError::CallbackFault(msg) => ApiError::internal_server_error(msg),
        }
    }
}

impl From<PaginationError> for ApiError {
    fn from(err: PaginationError) -> Self {
        PipelineError::InvalidPage(err).into()
    }
}

impl From<CursorDecodeError> for ApiError {
    fn from(err: CursorDecodeError) -> Self {
        PipelineError::MalformedCursor(err).into()
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Unauthorized { challenge } = &self {
            let mut response = status.into_response();
            if let Some(value) = challenge.as_deref().and_then(|c| HeaderValue::from_str(c).ok()) {
                response.headers_mut().insert(header::WWW_AUTHENTICATE, value);
            }
            return response;
        }

        (status, self.message().to_string()).into_response()
    }
}
