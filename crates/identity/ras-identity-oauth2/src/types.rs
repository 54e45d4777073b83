//! OAuth2 protocol types.

use crate::error::{OAuth2Error, OAuth2Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tokens issued by the token endpoint.
///
/// `params` keeps every field the endpoint returned, including the tokens
/// themselves, so callers can reach provider-specific extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub params: Map<String, Value>,
}

impl TokenResponse {
    /// Parse a token endpoint body. JSON objects are accepted as is; anything
    /// else is read as `application/x-www-form-urlencoded`.
    pub fn parse(body: &str) -> OAuth2Result<Self> {
        let params = match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => url::form_urlencoded::parse(body.trim().as_bytes())
                .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
                .collect(),
        };

        Self::from_params(params)
    }

    pub fn from_params(params: Map<String, Value>) -> OAuth2Result<Self> {
        let access_token = params
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                OAuth2Error::InvalidTokenResponse("missing access_token".to_string())
            })?
            .to_string();

        let refresh_token = params
            .get("refresh_token")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Self {
            access_token,
            refresh_token,
            params,
        })
    }

    /// Lifetime of the access token in seconds; form-encoded bodies carry it as a string.
    pub fn expires_in(&self) -> Option<u64> {
        match self.params.get("expires_in")? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Error body returned by a token endpoint (RFC 6749 section 5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
    pub error_uri: Option<String>,
}

impl TokenErrorResponse {
    pub fn into_error(self, status: u16) -> OAuth2Error {
        OAuth2Error::TokenEndpoint {
            code: self.error,
            description: self.error_description,
            uri: self.error_uri,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_token_response() {
        let body = r#"{
            "access_token": "at-123",
            "refresh_token": "rt-456",
            "token_type": "Bearer",
            "expires_in": 7200
        }"#;

        let token = TokenResponse::parse(body).unwrap();
        assert_eq!(token.access_token, "at-123");
        assert_eq!(token.refresh_token, Some("rt-456".to_string()));
        assert_eq!(token.expires_in(), Some(7200));
        assert_eq!(token.params["token_type"], "Bearer");
    }

    #[test]
    fn test_parse_form_encoded_token_response() {
        let body = "access_token=at-123&refresh_token=rt-456&issued_on=1467887190&expires_in=7200\n";

        let token = TokenResponse::parse(body).unwrap();
        assert_eq!(token.access_token, "at-123");
        assert_eq!(token.refresh_token, Some("rt-456".to_string()));
        assert_eq!(token.expires_in(), Some(7200));
        assert_eq!(token.params["issued_on"], "1467887190");
    }

    #[test]
    fn test_missing_access_token_is_rejected() {
        let result = TokenResponse::parse(r#"{"refresh_token": "rt"}"#);
        assert!(matches!(result, Err(OAuth2Error::InvalidTokenResponse(_))));

        let result = TokenResponse::parse("not a token body");
        assert!(matches!(result, Err(OAuth2Error::InvalidTokenResponse(_))));
    }

    #[test]
    fn test_refresh_token_is_optional() {
        let token = TokenResponse::parse(r#"{"access_token": "at"}"#).unwrap();
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.expires_in(), None);
    }
}
