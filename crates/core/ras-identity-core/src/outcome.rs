//! Terminal outcomes of a single authentication attempt.

use serde_json::Value;

/// Result of running a strategy against one request.
///
/// `Fail` covers recoverable, locally detected conditions (declined consent,
/// CSRF mismatch, a verifier rejecting the user). `Error` is reserved for
/// faults the host application has to log or present.
#[derive(Debug)]
pub enum AuthOutcome<U, E> {
    /// The user was authenticated.
    Success { user: U, info: Option<Value> },
    /// Authentication failed; `status` overrides the pipeline's default
    /// challenge status when set.
    Fail {
        info: Option<Value>,
        status: Option<u16>,
    },
    /// The user agent must be sent to `location` to continue the flow.
    Redirect { location: String },
    /// An internal or provider-side fault.
    Error(E),
}

impl<U, E> AuthOutcome<U, E> {
    pub fn success(user: U, info: Option<Value>) -> Self {
        Self::Success { user, info }
    }

    /// A failure carrying `{"message": ...}` as its info.
    pub fn fail_message(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Fail {
            info: Some(serde_json::json!({ "message": message.into() })),
            status,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        Self::Redirect {
            location: location.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Message attached to a `Fail` outcome, if any.
    pub fn fail_message_text(&self) -> Option<&str> {
        match self {
            Self::Fail { info: Some(info), .. } => info.get("message").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn map_user<V>(self, f: impl FnOnce(U) -> V) -> AuthOutcome<V, E> {
        match self {
            Self::Success { user, info } => AuthOutcome::Success {
                user: f(user),
                info,
            },
            Self::Fail { info, status } => AuthOutcome::Fail { info, status },
            Self::Redirect { location } => AuthOutcome::Redirect { location },
            Self::Error(err) => AuthOutcome::Error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_message_is_wrapped_in_info() {
        let outcome: AuthOutcome<(), ()> = AuthOutcome::fail_message("nope", Some(403));

        assert!(outcome.is_fail());
        assert_eq!(outcome.fail_message_text(), Some("nope"));
        match outcome {
            AuthOutcome::Fail { status, .. } => assert_eq!(status, Some(403)),
            _ => panic!("Expected Fail outcome"),
        }
    }

    #[test]
    fn test_map_user_keeps_non_success_variants() {
        let outcome: AuthOutcome<u32, ()> = AuthOutcome::redirect("https://example.com");
        let mapped = outcome.map_user(|id| id.to_string());
        assert!(mapped.is_redirect());

        let outcome: AuthOutcome<u32, ()> = AuthOutcome::success(7, None);
        match outcome.map_user(|id| id.to_string()) {
            AuthOutcome::Success { user, .. } => assert_eq!(user, "7"),
            _ => panic!("Expected Success outcome"),
        }
    }
}
