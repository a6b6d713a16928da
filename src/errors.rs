use crate::extractor::ExtractionError;
use crate::scoring::InputError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Failure talking to an upstream API (generator or speech synthesis).
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamError {
    /// Network failure, timeout, or a request that could not be built.
    Request(String),
    /// Upstream answered with a non-success status.
    Status { status: u16, body: String },
    /// Upstream answered successfully but without usable content.
    EmptyResponse,
    /// Upstream body could not be decoded.
    Decode(String),
    /// Circuit breaker is open; the call was not attempted.
    Rejected,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Request(msg) => write!(f, "request failed: {}", msg),
            UpstreamError::Status { status, body } => {
                write!(f, "upstream returned {}: {}", status, body)
            }
            UpstreamError::EmptyResponse => write!(f, "upstream returned no content"),
            UpstreamError::Decode(msg) => write!(f, "failed to decode upstream response: {}", msg),
            UpstreamError::Rejected => write!(f, "circuit open, call rejected"),
        }
    }
}

impl std::error::Error for UpstreamError {}

impl From<reqwest::Error> for UpstreamError {
    /// Converts a `reqwest::Error` into an `UpstreamError`.
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Request(err.to_string())
        }
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Input parsed but failed validation (negative or non-finite amounts).
    InvalidInput(InputError),
    /// Generator reply could not be turned into structured data.
    Extraction(ExtractionError),
    /// The generator could not be reached or failed.
    Upstream(UpstreamError),
    /// The speech-synthesis service could not be reached or failed.
    Speech(UpstreamError),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            AppError::Extraction(e) => write!(f, "Extraction error: {}", e),
            AppError::Upstream(e) => write!(f, "Upstream model error: {}", e),
            AppError::Speech(e) => write!(f, "Speech synthesis error: {}", e),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Maps each error variant to an appropriate HTTP status code and JSON body.
    /// Dependency failures are logged here; clients only see a generic message.
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InvalidInput(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": e.to_string() }),
            ),
            AppError::Extraction(e) => {
                tracing::warn!("Model output could not be parsed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": e.to_string(),
                        "raw": e.raw(),
                    }),
                )
            }
            AppError::Upstream(e) => {
                tracing::error!("Upstream model error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Upstream model unavailable" }),
                )
            }
            AppError::Speech(e) => {
                tracing::error!("Speech synthesis error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({ "error": "Speech synthesis failed" }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        AppError::Extraction(err)
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::InvalidInput(err)
    }
}

impl From<UpstreamError> for AppError {
    /// Generator failures are the default upstream; speech call sites map explicitly.
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }
}
