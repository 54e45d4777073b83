//! Error types for the Connections strategy.

use crate::profile::ProfileError;
use ras_identity_core::{BoxError, RequestError, SessionError};
use ras_identity_oauth2::OAuth2Error;
use serde::Serialize;
use thiserror::Error;

/// Code assumed when the provider reports an error without one.
pub const DEFAULT_ERROR_CODE: &str = "server_error";

const FALLBACK_STATUS: u16 = 500;

/// HTTP status for each authorization error code the provider documents.
const STATUS_BY_CODE: &[(&str, u16)] = &[
    ("oauth_denied", 403),
    ("server_error", 502),
    ("temporarily_unavailable", 503),
];

/// Errors detected while constructing a strategy.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IBM Connections Cloud OAuth requires a hostname")]
    MissingHostname,

    #[error("Invalid hostname '{hostname}': {reason}")]
    InvalidHostname { hostname: String, reason: String },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] OAuth2Error),
}

/// Error reported by the provider on the authorization redirect
/// (RFC 6749 section 4.1.2.1, with the provider's `oauth_` prefixed parameters).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{}", .message.as_deref().unwrap_or("Authorization request failed"))]
pub struct AuthorizationError {
    pub message: Option<String>,
    pub code: String,
    pub uri: Option<String>,
    pub status: u16,
}

impl AuthorizationError {
    /// Build an error, deriving `status` from the supplied `code` when no
    /// explicit status is given. A missing code reports as `server_error`
    /// but keeps the generic 500 status.
    pub fn new(
        message: Option<String>,
        code: Option<&str>,
        uri: Option<String>,
        status: Option<u16>,
    ) -> Self {
        let status = status
            .filter(|status| *status != 0)
            .unwrap_or_else(|| code.map_or(FALLBACK_STATUS, Self::status_for_code));

        Self {
            message,
            code: code.unwrap_or(DEFAULT_ERROR_CODE).to_string(),
            uri,
            status,
        }
    }

    /// Status associated with an error code; unknown codes map to 500.
    pub fn status_for_code(code: &str) -> u16 {
        STATUS_BY_CODE
            .iter()
            .find(|(known, _)| *known == code)
            .map_or(FALLBACK_STATUS, |(_, status)| *status)
    }
}

/// Faults surfaced through [`AuthOutcome::Error`](ras_identity_core::AuthOutcome).
#[derive(Debug, Error)]
pub enum ConnectionsError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("OAuth 2.0 authentication requires session support when using state")]
    SessionRequired,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Failed to resolve callback URL: {0}")]
    CallbackUrl(#[from] RequestError),

    #[error("Failed to build authorization URL: {0}")]
    AuthorizationUrl(#[source] OAuth2Error),

    #[error("Failed to obtain access token: {0}")]
    TokenExchange(#[source] OAuth2Error),

    #[error("Failed to fetch user profile: {0}")]
    ProfileFetch(#[source] OAuth2Error),

    #[error("Failed to parse user profile: {0}")]
    ProfileParse(#[from] ProfileError),

    #[error("Verification failed: {0}")]
    Verification(#[source] BoxError),

    #[error("Verification panicked: {0}")]
    VerificationPanicked(String),
}

impl ConnectionsError {
    /// HTTP status a host application should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::Authorization(e) => e.status,
            Self::TokenExchange(_) | Self::ProfileFetch(_) => 502,
            _ => FALLBACK_STATUS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_derived_from_code() {
        let cases = [
            ("oauth_denied", 403),
            ("server_error", 502),
            ("temporarily_unavailable", 503),
            ("oauth_invalid_clientid", 500),
            ("oauth_consumer_missing_subscription", 500),
        ];

        for (code, expected) in cases {
            let err = AuthorizationError::new(None, Some(code), None, None);
            assert_eq!(err.status, expected, "status for {}", code);
            assert_eq!(err.code, code);
        }
    }

    #[test]
    fn test_explicit_status_wins() {
        let err = AuthorizationError::new(
            Some("Callback URI mismatch".to_string()),
            Some("oauth_denied"),
            None,
            Some(401),
        );
        assert_eq!(err.status, 401);
        assert_eq!(err.to_string(), "Callback URI mismatch");
    }

    #[test]
    fn test_missing_code_defaults() {
        let err = AuthorizationError::new(None, None, Some("https://docs".to_string()), None);

        assert_eq!(err.code, "server_error");
        assert_eq!(err.status, 500);
        assert_eq!(err.uri.as_deref(), Some("https://docs"));
        assert_eq!(err.to_string(), "Authorization request failed");
    }

    #[test]
    fn test_connections_error_status() {
        let err: ConnectionsError =
            AuthorizationError::new(None, Some("temporarily_unavailable"), None, None).into();
        assert_eq!(err.status(), 503);

        assert_eq!(ConnectionsError::SessionRequired.status(), 500);
        assert_eq!(
            ConnectionsError::TokenExchange(OAuth2Error::InvalidTokenResponse(
                "missing access_token".to_string()
            ))
            .status(),
            502
        );
    }
}
