//! Strategy configuration and endpoint resolution.

use crate::error::ConfigError;
use ras_identity_oauth2::OAuth2ClientConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Name the strategy registers under.
pub const STRATEGY_NAME: &str = "ibm-connections-cloud";

/// Connections Cloud expects the redirect URI under this parameter name.
pub const CALLBACK_URI_PARAM: &str = "callback_uri";

const AUTHORIZE_PATH: &str = "/manage/oauth2/authorize";
const TOKEN_PATH: &str = "/manage/oauth2/token";
const PROFILE_PATH: &str = "/connections/opensocial/oauth/rest/people/@me/@self";

/// Options for a [`ConnectionsStrategy`](crate::ConnectionsStrategy).
///
/// There is no scope setting. A per request scope can be passed through
/// [`AuthenticateOptions`](ras_identity_core::AuthenticateOptions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    /// Tenant hostname, e.g. `apps.na.collabserv.com`. Required.
    #[serde(default)]
    pub hostname: String,
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider redirects after consent. Relative values are
    /// resolved against the request that started the flow.
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Protect the redirect round trip with a session-held `state`.
    #[serde(default = "default_use_state")]
    pub use_state: bool,
    /// Session key holding the pending state; defaults to `oauth2:{hostname}`.
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub pass_req_to_callback: bool,
    /// Honour `X-Forwarded-Proto` / `X-Forwarded-Host` when resolving a
    /// relative callback URL.
    #[serde(default)]
    pub trust_proxy: bool,
    #[serde(default)]
    pub http_timeout_seconds: Option<u64>,
}

fn default_use_state() -> bool {
    true
}

impl ConnectionsConfig {
    pub fn new(
        hostname: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            callback_url: None,
            use_state: default_use_state(),
            session_key: None,
            pass_req_to_callback: false,
            trust_proxy: false,
            http_timeout_seconds: None,
        }
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub fn with_state(mut self, use_state: bool) -> Self {
        self.use_state = use_state;
        self
    }

    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = Some(session_key.into());
        self
    }

    pub fn with_pass_req_to_callback(mut self, enabled: bool) -> Self {
        self.pass_req_to_callback = enabled;
        self
    }

    pub fn with_trust_proxy(mut self, enabled: bool) -> Self {
        self.trust_proxy = enabled;
        self
    }

    pub fn with_http_timeout(mut self, seconds: u64) -> Self {
        self.http_timeout_seconds = Some(seconds);
        self
    }

    /// Session key used for the pending state slot.
    pub fn effective_session_key(&self) -> String {
        self.session_key
            .clone()
            .unwrap_or_else(|| format!("oauth2:{}", self.hostname.trim()))
    }

    /// Client configuration for the generic OAuth2 engine.
    pub fn oauth2_client_config(&self, endpoints: &Endpoints) -> OAuth2ClientConfig {
        let config = OAuth2ClientConfig::new(
            &self.client_id,
            &self.client_secret,
            &endpoints.authorization_url,
            &endpoints.token_url,
        )
        .with_redirect_uri_param(CALLBACK_URI_PARAM)
        .with_authorization_header_for_get(true);

        match self.http_timeout_seconds {
            Some(seconds) => config.with_http_timeout(seconds),
            None => config,
        }
    }
}

/// Provider endpoints derived from the tenant hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub authorization_url: String,
    pub token_url: String,
    pub profile_url: String,
}

impl Endpoints {
    pub fn from_hostname(hostname: &str) -> Result<Self, ConfigError> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return Err(ConfigError::MissingHostname);
        }

        if hostname.contains(['/', '?', '#', '@']) || hostname.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidHostname {
                hostname: hostname.to_string(),
                reason: "expected a bare host name without scheme or path".to_string(),
            });
        }

        let endpoints = Self {
            authorization_url: format!("https://{}{}", hostname, AUTHORIZE_PATH),
            token_url: format!("https://{}{}", hostname, TOKEN_PATH),
            profile_url: format!("https://{}{}", hostname, PROFILE_PATH),
        };

        Url::parse(&endpoints.authorization_url).map_err(|e| ConfigError::InvalidHostname {
            hostname: hostname.to_string(),
            reason: e.to_string(),
        })?;

        Ok(endpoints)
    }
}
