//! OAuth2 client configuration.

use serde::{Deserialize, Serialize};

const DEFAULT_REDIRECT_URI_PARAM: &str = "redirect_uri";

/// Endpoints and credentials for one OAuth2 client registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    /// Name of the parameter carrying the redirect URI. Most providers use
    /// `redirect_uri`; some use their own spelling.
    pub redirect_uri_param: String,
    /// Send the access token as a bearer `Authorization` header on GETs
    /// instead of as an `access_token` query parameter.
    pub use_authorization_header_for_get: bool,
    pub http_timeout_seconds: Option<u64>,
}

impl OAuth2ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            redirect_uri_param: DEFAULT_REDIRECT_URI_PARAM.to_string(),
            use_authorization_header_for_get: false,
            http_timeout_seconds: None,
        }
    }

    pub fn with_redirect_uri_param(mut self, param: impl Into<String>) -> Self {
        self.redirect_uri_param = param.into();
        self
    }

    pub fn with_authorization_header_for_get(mut self, enabled: bool) -> Self {
        self.use_authorization_header_for_get = enabled;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = Some(seconds);
        self
    }
}
