//! Application verification callbacks.
//!
//! The calling convention is picked once, when the strategy is built, by
//! choosing a [`Verify`] variant. Each variant receives exactly the values
//! its signature names and nothing else.

use crate::error::ConnectionsError;
use crate::profile::Profile;
use futures::FutureExt;
use futures::future::BoxFuture;
use ras_identity_core::{AuthOutcome, AuthRequest, BoxError};
use ras_identity_oauth2::TokenResponse;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// What a verify callback decided about the user.
///
/// `user: None` rejects the login without it being an error; `info` is
/// passed through to the outcome either way.
#[derive(Debug, Clone)]
pub struct Verified<U> {
    pub user: Option<U>,
    pub info: Option<Value>,
}

impl<U> Verified<U> {
    pub fn user(user: U) -> Self {
        Self {
            user: Some(user),
            info: None,
        }
    }

    pub fn rejected(info: Option<Value>) -> Self {
        Self { user: None, info }
    }

    pub fn with_info(mut self, info: Value) -> Self {
        self.info = Some(info);
        self
    }
}

pub type VerifyFuture<U> = BoxFuture<'static, Result<Verified<U>, BoxError>>;

type ProfileFn<U> = dyn Fn(String, Option<String>, Profile) -> VerifyFuture<U> + Send + Sync;
type ProfileWithParamsFn<U> =
    dyn Fn(String, Option<String>, Map<String, Value>, Profile) -> VerifyFuture<U> + Send + Sync;
type RequestProfileFn<U> =
    dyn Fn(AuthRequest, String, Option<String>, Profile) -> VerifyFuture<U> + Send + Sync;
type RequestProfileWithParamsFn<U> = dyn Fn(AuthRequest, String, Option<String>, Map<String, Value>, Profile) -> VerifyFuture<U>
    + Send
    + Sync;

/// Supported verify callback signatures.
pub enum Verify<U> {
    /// `(access_token, refresh_token, profile)`
    Profile(Arc<ProfileFn<U>>),
    /// `(access_token, refresh_token, token_params, profile)`
    ProfileWithParams(Arc<ProfileWithParamsFn<U>>),
    /// `(request, access_token, refresh_token, profile)`
    RequestProfile(Arc<RequestProfileFn<U>>),
    /// `(request, access_token, refresh_token, token_params, profile)`
    RequestProfileWithParams(Arc<RequestProfileWithParamsFn<U>>),
}

impl<U: Send + 'static> Verify<U> {
    pub fn profile<F, Fut>(f: F) -> Self
    where
        F: Fn(String, Option<String>, Profile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Verified<U>, BoxError>> + Send + 'static,
    {
        Self::Profile(Arc::new(move |access, refresh, profile| {
            f(access, refresh, profile).boxed()
        }))
    }

    pub fn profile_with_params<F, Fut>(f: F) -> Self
    where
        F: Fn(String, Option<String>, Map<String, Value>, Profile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Verified<U>, BoxError>> + Send + 'static,
    {
        Self::ProfileWithParams(Arc::new(move |access, refresh, params, profile| {
            f(access, refresh, params, profile).boxed()
        }))
    }

    pub fn request_profile<F, Fut>(f: F) -> Self
    where
        F: Fn(AuthRequest, String, Option<String>, Profile) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Verified<U>, BoxError>> + Send + 'static,
    {
        Self::RequestProfile(Arc::new(move |req, access, refresh, profile| {
            f(req, access, refresh, profile).boxed()
        }))
    }

    pub fn request_profile_with_params<F, Fut>(f: F) -> Self
    where
        F: Fn(AuthRequest, String, Option<String>, Map<String, Value>, Profile) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = Result<Verified<U>, BoxError>> + Send + 'static,
    {
        Self::RequestProfileWithParams(Arc::new(move |req, access, refresh, params, profile| {
            f(req, access, refresh, params, profile).boxed()
        }))
    }

    pub fn takes_request(&self) -> bool {
        matches!(
            self,
            Self::RequestProfile(_) | Self::RequestProfileWithParams(_)
        )
    }

    pub fn takes_params(&self) -> bool {
        matches!(
            self,
            Self::ProfileWithParams(_) | Self::RequestProfileWithParams(_)
        )
    }

    /// Run the callback and translate its answer into an outcome. Errors
    /// and panics from the callback become `AuthOutcome::Error`.
    pub(crate) async fn dispatch(
        &self,
        req: &AuthRequest,
        tokens: TokenResponse,
        profile: Profile,
    ) -> AuthOutcome<U, ConnectionsError> {
        let TokenResponse {
            access_token,
            refresh_token,
            params,
        } = tokens;

        let call = AssertUnwindSafe(|| match self {
            Self::Profile(f) => f(access_token, refresh_token, profile),
            Self::ProfileWithParams(f) => f(access_token, refresh_token, params, profile),
            Self::RequestProfile(f) => f(req.clone(), access_token, refresh_token, profile),
            Self::RequestProfileWithParams(f) => {
                f(req.clone(), access_token, refresh_token, params, profile)
            }
        });

        let future = match std::panic::catch_unwind(call) {
            Ok(future) => future,
            Err(panic) => {
                return AuthOutcome::Error(ConnectionsError::VerificationPanicked(
                    panic_message(panic),
                ));
            }
        };

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(Ok(Verified {
                user: Some(user),
                info,
            })) => AuthOutcome::Success { user, info },
            Ok(Ok(Verified { user: None, info })) => AuthOutcome::Fail { info, status: None },
            Ok(Err(err)) => AuthOutcome::Error(ConnectionsError::Verification(err)),
            Err(panic) => {
                AuthOutcome::Error(ConnectionsError::VerificationPanicked(panic_message(panic)))
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "verify callback panicked".to_string()
    }
}

impl<U> fmt::Debug for Verify<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Profile(_) => "Profile",
            Self::ProfileWithParams(_) => "ProfileWithParams",
            Self::RequestProfile(_) => "RequestProfile",
            Self::RequestProfileWithParams(_) => "RequestProfileWithParams",
        };
        write!(f, "Verify::{}", name)
    }
}
