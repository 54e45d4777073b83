//! The seam between the request pipeline and a concrete strategy.

use crate::outcome::AuthOutcome;
use crate::request::AuthRequest;
use async_trait::async_trait;

/// Per-call options the pipeline passes to [`AuthStrategy::authenticate`].
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    /// Overrides the strategy's configured callback URL. May be relative.
    pub callback_url: Option<String>,
    /// Explicit `state` value for the authorization request. Bypasses the
    /// session-backed state store.
    pub state: Option<String>,
    /// Scope to pass through on the authorization request.
    pub scope: Option<Vec<String>>,
    /// Extra parameters for the authorization request
    pub authorization_params: Vec<(String, String)>,
    /// Extra parameters for the token request
    pub token_params: Vec<(String, String)>,
}

impl AuthenticateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback_url(mut self, callback_url: impl Into<String>) -> Self {
        self.callback_url = Some(callback_url.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(scope.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_authorization_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.authorization_params.push((key.into(), value.into()));
        self
    }

    pub fn with_token_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.token_params.push((key.into(), value.into()));
        self
    }
}

/// A request authentication strategy.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    type User: Send;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Name the strategy is registered under.
    fn name(&self) -> &str;

    async fn authenticate(
        &self,
        req: &AuthRequest,
        options: &AuthenticateOptions,
    ) -> AuthOutcome<Self::User, Self::Error>;
}
