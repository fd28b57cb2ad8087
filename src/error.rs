use crate::isbn::{Isbn, IsbnError};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ShelfError {
    #[error(transparent)]
    Isbn(#[from] IsbnError),

    #[error("Book with ISBN {0} already exists in your collection")]
    Duplicate(Isbn),

    #[error("Book with ID {0} not found")]
    NotFound(i64),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error while saving book: {0}")]
    Save(#[source] SqlxError),

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Metadata lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),
}

impl ShelfError {
    pub fn status(&self) -> StatusCode {
        match self {
            ShelfError::Isbn(_) | ShelfError::Duplicate(_) | ShelfError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ShelfError::Json(_) => StatusCode::BAD_REQUEST,
            ShelfError::NotFound(_) => StatusCode::NOT_FOUND,
            ShelfError::Lookup(_) | ShelfError::Reqwest(_) => StatusCode::BAD_GATEWAY,
            ShelfError::Save(_)
            | ShelfError::Database(_)
            | ShelfError::Io(_)
            | ShelfError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ShelfError::Isbn(_) => "INVALID_ISBN",
            ShelfError::Duplicate(_) => "DUPLICATE",
            ShelfError::NotFound(_) => "NOT_FOUND",
            ShelfError::BadRequest(_) | ShelfError::Json(_) => "BAD_REQUEST",
            ShelfError::Lookup(_) | ShelfError::Reqwest(_) => "BAD_GATEWAY",
            ShelfError::Save(_)
            | ShelfError::Database(_)
            | ShelfError::Io(_)
            | ShelfError::Config(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show an end user.
    pub fn user_message(&self) -> String {
        match self {
            ShelfError::Database(_) | ShelfError::Io(_) | ShelfError::Config(_) => {
                "An internal server error occurred.".to_string()
            }
            ShelfError::Lookup(e) => e.user_message().to_string(),
            ShelfError::Reqwest(_) => "Upstream service is unavailable.".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ShelfError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ApiErrorBody {
            code: self.code().to_string(),
            message: self.user_message(),
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Failure modes of a single metadata lookup.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum LookupError {
    #[error("API rate limit exceeded")]
    RateLimited,

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("API request failed with status {0}")]
    Upstream(StatusCode),

    #[error("circuit breaker is open")]
    CircuitOpen,

    #[error("no books found for this ISBN")]
    NotFound,

    #[error("invalid API response: {0}")]
    Decode(String),
}

impl LookupError {
    /// Whether the failure says something about the health of the remote service.
    pub fn is_service_failure(&self) -> bool {
        matches!(self, LookupError::RateLimited | LookupError::Unavailable(_))
    }

    /// Whether a later attempt has a reasonable chance of returning real data.
    pub fn should_retry_later(&self) -> bool {
        matches!(
            self,
            LookupError::RateLimited | LookupError::Unavailable(_) | LookupError::CircuitOpen
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            LookupError::RateLimited => {
                "Google Books API rate limit exceeded. Please try again in a few minutes."
            }
            LookupError::Unavailable(_) => {
                "Google Books API is currently unavailable. Please try again later."
            }
            LookupError::CircuitOpen => {
                "Google Books API is temporarily unavailable. Please try again later."
            }
            LookupError::NotFound => "No books found for this ISBN in Google Books database",
            LookupError::Upstream(_) | LookupError::Decode(_) => {
                "Unable to retrieve book information from Google Books API. Please check the ISBN and try again."
            }
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LookupError::Unavailable(
                "Request timeout - Google Books API may be slow or unavailable".to_string(),
            )
        } else if e.is_connect() {
            LookupError::Unavailable(
                "Connection error - unable to reach Google Books API".to_string(),
            )
        } else if e.is_decode() {
            LookupError::Decode(e.to_string())
        } else {
            LookupError::Unavailable(format!("Network error: {e}"))
        }
    }
}

/// Errors that a retry policy may try again.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for LookupError {
    fn is_retryable(&self) -> bool {
        matches!(self, LookupError::RateLimited | LookupError::Unavailable(_))
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
