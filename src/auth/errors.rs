//! Authenticated fetch error types.

use thiserror::Error;

/// Errors from [`AuthClient::request`](super::AuthClient::request).
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request (or the refresh call) could not be sent or completed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The refresh endpoint rejected the refresh token. The session has been
    /// expired and the login redirect issued before this is returned.
    #[error("token refresh failed")]
    TokenRefreshFailed,

    /// The refresh endpoint answered 2xx with a body that is not a token object.
    #[error("invalid refresh response: {0}")]
    InvalidRefreshResponse(#[source] reqwest::Error),

    /// A header value could not be encoded.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// A multipart part carries an unparseable MIME type.
    #[error("invalid multipart part '{part}': {source}")]
    InvalidForm {
        part: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// True when the session is over and the caller should stop.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, FetchError::TokenRefreshFailed)
    }
}
