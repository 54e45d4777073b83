//! The Connections Cloud authentication state machine.

use crate::config::{ConnectionsConfig, Endpoints, STRATEGY_NAME};
use crate::error::{AuthorizationError, ConfigError, ConnectionsError};
use crate::profile::Profile;
use crate::state::{SessionStateStore, generate_state};
use crate::verify::Verify;
use async_trait::async_trait;
use ras_identity_core::{AuthOutcome, AuthRequest, AuthStrategy, AuthenticateOptions};
use ras_identity_oauth2::{OAuth2Client, OAuth2Flow};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

const OAUTH_DENIED: &str = "oauth_denied";
const STATE_UNVERIFIED: &str = "Unable to verify authorization request state.";
const STATE_INVALID: &str = "Invalid authorization request state.";
const STATE_FAILURE_STATUS: u16 = 403;

type Outcome<U> = AuthOutcome<U, ConnectionsError>;

/// Authenticates requests by delegating to IBM Connections Cloud over
/// OAuth 2.0.
///
/// A request without `code` starts the flow and yields a redirect to the
/// provider. The provider's callback carries `code` (or `oauth_error`) and is
/// turned into a success, failure or error outcome.
pub struct ConnectionsStrategy<U> {
    config: ConnectionsConfig,
    endpoints: Endpoints,
    flow: Arc<dyn OAuth2Flow>,
    state_store: SessionStateStore,
    verify: Verify<U>,
}

impl<U: Send + 'static> ConnectionsStrategy<U> {
    /// Build a strategy talking to the provider over a reqwest client.
    pub fn new(config: ConnectionsConfig, verify: Verify<U>) -> Result<Self, ConfigError> {
        let endpoints = Endpoints::from_hostname(&config.hostname)?;
        let client = OAuth2Client::new(config.oauth2_client_config(&endpoints))
            .map_err(ConfigError::HttpClient)?;

        Ok(Self::assemble(config, endpoints, Arc::new(client), verify))
    }

    /// Build a strategy on top of a caller supplied OAuth2 engine.
    pub fn with_flow(
        config: ConnectionsConfig,
        flow: Arc<dyn OAuth2Flow>,
        verify: Verify<U>,
    ) -> Result<Self, ConfigError> {
        let endpoints = Endpoints::from_hostname(&config.hostname)?;
        Ok(Self::assemble(config, endpoints, flow, verify))
    }

    fn assemble(
        config: ConnectionsConfig,
        endpoints: Endpoints,
        flow: Arc<dyn OAuth2Flow>,
        verify: Verify<U>,
    ) -> Self {
        if config.pass_req_to_callback != verify.takes_request() {
            warn!(
                "pass_req_to_callback is {} but the verify callback is {:?}; the callback signature wins",
                config.pass_req_to_callback, verify
            );
        }

        let state_store = SessionStateStore::new(config.effective_session_key());

        Self {
            config,
            endpoints,
            flow,
            state_store,
            verify,
        }
    }

    pub fn config(&self) -> &ConnectionsConfig {
        &self.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn session_key(&self) -> &str {
        self.state_store.key()
    }

    /// Run one step of the authorization code flow for `req`.
    pub async fn authenticate(&self, req: &AuthRequest, options: &AuthenticateOptions) -> Outcome<U> {
        if let Some(code) = non_empty(req.query_param("oauth_error")) {
            return self.provider_error(req, &code);
        }

        let callback_url = match self.resolve_callback_url(req, options) {
            Ok(callback_url) => callback_url,
            Err(e) => return AuthOutcome::Error(e),
        };

        match non_empty(req.query_param("code")) {
            Some(code) => {
                self.complete_flow(req, options, &code, callback_url.as_deref())
                    .await
            }
            None => self.begin_flow(req, options, callback_url.as_deref()).await,
        }
    }

    /// Fetch and normalize the profile of the user owning `access_token`.
    pub async fn user_profile(&self, access_token: &str) -> Result<Profile, ConnectionsError> {
        let body = self
            .flow
            .get(&self.endpoints.profile_url, access_token)
            .await
            .map_err(ConnectionsError::ProfileFetch)?;

        Ok(Profile::parse(&body)?)
    }

    fn provider_error(&self, req: &AuthRequest, code: &str) -> Outcome<U> {
        let description = req.query_param("oauth_error_description");

        if code == OAUTH_DENIED {
            info!("User denied authorization at {}", self.config.hostname);
            return AuthOutcome::Fail {
                info: Some(json!({ "message": description })),
                status: None,
            };
        }

        let err = AuthorizationError::new(
            description,
            Some(code),
            req.query_param("oauth_error_uri"),
            None,
        );
        warn!("Authorization request failed with {}: {}", err.code, err);
        AuthOutcome::Error(err.into())
    }

    fn resolve_callback_url(
        &self,
        req: &AuthRequest,
        options: &AuthenticateOptions,
    ) -> Result<Option<String>, ConnectionsError> {
        let Some(callback_url) = options
            .callback_url
            .as_deref()
            .or(self.config.callback_url.as_deref())
        else {
            return Ok(None);
        };

        if Url::parse(callback_url).is_ok() {
            return Ok(Some(callback_url.to_string()));
        }

        let resolved = req.resolve_url(callback_url, self.config.trust_proxy)?;
        debug!("Resolved callback URL {} to {}", callback_url, resolved);
        Ok(Some(resolved.to_string()))
    }

    async fn begin_flow(
        &self,
        req: &AuthRequest,
        options: &AuthenticateOptions,
        callback_url: Option<&str>,
    ) -> Outcome<U> {
        let mut params = vec![("response_type".to_string(), "code".to_string())];
        params.extend(options.authorization_params.iter().cloned());

        if let Some(scope) = options.scope.as_ref().filter(|scope| !scope.is_empty()) {
            params.push(("scope".to_string(), scope.join(" ")));
        }

        if let Some(state) = options.state.as_ref() {
            params.push(("state".to_string(), state.clone()));
        } else if self.config.use_state {
            let Some(session) = req.session() else {
                return AuthOutcome::Error(ConnectionsError::SessionRequired);
            };

            let state = generate_state();
            if let Err(e) = self.state_store.store(session.as_ref(), &state).await {
                return AuthOutcome::Error(e.into());
            }
            params.push(("state".to_string(), state));
        }

        match self.flow.authorize_url(callback_url, &params) {
            Ok(location) => {
                info!("Started OAuth2 flow for provider: {}", STRATEGY_NAME);
                AuthOutcome::Redirect { location }
            }
            Err(e) => AuthOutcome::Error(ConnectionsError::AuthorizationUrl(e)),
        }
    }

    async fn complete_flow(
        &self,
        req: &AuthRequest,
        options: &AuthenticateOptions,
        code: &str,
        callback_url: Option<&str>,
    ) -> Outcome<U> {
        if self.config.use_state {
            if let Err(outcome) = self.verify_state(req).await {
                return outcome;
            }
        }

        let mut params = vec![(
            "grant_type".to_string(),
            "authorization_code".to_string(),
        )];
        params.extend(options.token_params.iter().cloned());

        let tokens = match self.flow.exchange_code(code, callback_url, &params).await {
            Ok(tokens) => tokens,
            Err(e) => return AuthOutcome::Error(ConnectionsError::TokenExchange(e)),
        };

        let profile = match self.user_profile(&tokens.access_token).await {
            Ok(profile) => profile,
            Err(e) => return AuthOutcome::Error(e),
        };

        debug!("Loaded profile for user {}", profile.user_id);
        self.verify.dispatch(req, tokens, profile).await
    }

    /// Consume the pending state and compare it with the callback's. The
    /// slot is gone afterwards whatever the result.
    async fn verify_state(&self, req: &AuthRequest) -> Result<(), Outcome<U>> {
        let session = req
            .session()
            .ok_or(AuthOutcome::Error(ConnectionsError::SessionRequired))?;

        let expected = self
            .state_store
            .take(session.as_ref())
            .await
            .map_err(|e| AuthOutcome::Error(e.into()))?;

        let Some(expected) = expected else {
            warn!("No pending authorization state in session");
            return Err(AuthOutcome::fail_message(
                STATE_UNVERIFIED,
                Some(STATE_FAILURE_STATUS),
            ));
        };

        if req.query_param("state").as_deref() != Some(expected.as_str()) {
            warn!("Authorization state mismatch");
            return Err(AuthOutcome::fail_message(
                STATE_INVALID,
                Some(STATE_FAILURE_STATUS),
            ));
        }

        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[async_trait]
impl<U: Send + 'static> AuthStrategy for ConnectionsStrategy<U> {
    type User = U;
    type Error = ConnectionsError;

    fn name(&self) -> &str {
        STRATEGY_NAME
    }

    async fn authenticate(&self, req: &AuthRequest, options: &AuthenticateOptions) -> Outcome<U> {
        ConnectionsStrategy::authenticate(self, req, options).await
    }
}
