//! Shared error handling for admin API calls.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::FetchError;

/// Admin API error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The server answered with a non-success status.
    #[error("{status}: {message}")]
    Status { status: StatusCode, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] reqwest::Error),

    /// Rejected before sending, mirroring the dashboard's form checks.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The OAuth callback URL lacks `token` or `refreshToken`.
    #[error("login callback is missing its tokens")]
    MissingCallbackTokens,

    /// Signed in with an account that is not on the admin allow-list.
    #[error("{0} is not an admin account")]
    NotAdmin(String),
}

impl ApiError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True when the failure ended the session.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Fetch(e) if e.is_session_expired())
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Turn a non-success response into [`ApiError::Status`], using the body's
/// `message` or `error` field when the server sent one.
pub(crate) async fn status_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    ApiError::Status {
        status,
        message: error_message(status, &text),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        })
}
