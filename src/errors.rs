use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use tracing::{debug, error};

/// Result type returned by every route handler
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors raised while talking to the Jira REST API
#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    #[error("Jira is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Jira returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid Jira response: {0}")]
    InvalidResponse(String),
}

/// Errors raised while calling the chat-completion endpoint
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Model is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Any failure coming from a third-party API
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Jira error: {0}")]
    Jira(#[from] JiraError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Error type surfaced to HTTP clients
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Upstream {
        message: &'static str,
        #[source]
        source: UpstreamError,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Upstream { message, source } => {
                error!("{}: {}", message, source);
            }
            other => debug!("Rejected request: {}", other),
        }

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }
}

/// Attaches a route's fixed failure message to an upstream error
pub trait UpstreamContext<T> {
    fn upstream(self, message: &'static str) -> ApiResult<T>;
}

impl<T, E> UpstreamContext<T> for Result<T, E>
where
    E: Into<UpstreamError>,
{
    fn upstream(self, message: &'static str) -> ApiResult<T> {
        self.map_err(|e| ApiError::Upstream {
            message,
            source: e.into(),
        })
    }
}
