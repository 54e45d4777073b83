//! OAuth2 error types.

use thiserror::Error;

pub type OAuth2Result<T> = Result<T, OAuth2Error>;

#[derive(Debug, Error)]
pub enum OAuth2Error {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    /// The token endpoint answered with an OAuth2 error body.
    #[error("Token endpoint error {code}: {}", .description.as_deref().unwrap_or("No description"))]
    TokenEndpoint {
        code: String,
        description: Option<String>,
        uri: Option<String>,
        status: u16,
    },

    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("Invalid token response: {0}")]
    InvalidTokenResponse(String),

    #[error("Request to {url} failed with status {status}")]
    RequestFailed {
        url: String,
        status: u16,
        body: String,
    },
}

impl OAuth2Error {
    /// HTTP status reported by the remote endpoint, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpError(e) => e.status().map(|s| s.as_u16()),
            Self::TokenEndpoint { status, .. }
            | Self::TokenExchangeFailed { status, .. }
            | Self::RequestFailed { status, .. } => Some(*status),
            Self::UrlError(_) | Self::InvalidTokenResponse(_) => None,
        }
    }
}
