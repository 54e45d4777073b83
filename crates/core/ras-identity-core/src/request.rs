//! Transport-neutral view of the inbound request a strategy inspects.

use crate::session::Session;
use http::{HeaderMap, Uri, request::Parts};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

const FORWARDED_PROTO: &str = "x-forwarded-proto";
const FORWARDED_HOST: &str = "x-forwarded-host";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Request carries no host to build an absolute URL from")]
    MissingHost,

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),
}

/// The parts of an HTTP request an authentication strategy needs, plus the
/// session the host application attached to it.
#[derive(Clone)]
pub struct AuthRequest {
    uri: Uri,
    headers: HeaderMap,
    secure: bool,
    session: Option<Arc<dyn Session>>,
}

impl AuthRequest {
    pub fn new(uri: Uri, headers: HeaderMap) -> Self {
        Self {
            uri,
            headers,
            secure: false,
            session: None,
        }
    }

    /// Build from the head of an `http` request. TLS is inferred from an
    /// absolute `https` URI; servers terminating TLS themselves should call
    /// [`AuthRequest::with_secure`].
    pub fn from_parts(parts: &Parts) -> Self {
        let secure = parts.uri.scheme_str() == Some("https");
        Self::new(parts.uri.clone(), parts.headers.clone()).with_secure(secure)
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn session(&self) -> Option<&Arc<dyn Session>> {
        self.session.as_ref()
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// All query parameters; the first occurrence of a repeated key wins.
    pub fn query(&self) -> HashMap<String, String> {
        let mut params = HashMap::new();
        if let Some(query) = self.uri.query() {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                params
                    .entry(key.into_owned())
                    .or_insert_with(|| value.into_owned());
            }
        }
        params
    }

    /// Reconstruct the absolute URL the user agent requested.
    ///
    /// With `trust_proxy`, `X-Forwarded-Proto` and `X-Forwarded-Host` take
    /// precedence over the connection and `Host` header.
    pub fn original_url(&self, trust_proxy: bool) -> Result<Url, RequestError> {
        let forwarded_https = trust_proxy
            && self.first_header_value(FORWARDED_PROTO).as_deref() == Some("https");
        let scheme = if self.secure || forwarded_https {
            "https"
        } else {
            "http"
        };

        let host = trust_proxy
            .then(|| self.first_header_value(FORWARDED_HOST))
            .flatten()
            .or_else(|| {
                self.headers
                    .get(http::header::HOST)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            })
            .or_else(|| self.uri.authority().map(|authority| authority.to_string()))
            .ok_or(RequestError::MissingHost)?;

        let path = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        Ok(Url::parse(&format!("{}://{}{}", scheme, host, path))?)
    }

    /// Resolve `target` against the originating request URL. Absolute
    /// targets are returned unchanged.
    pub fn resolve_url(&self, target: &str, trust_proxy: bool) -> Result<Url, RequestError> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(self.original_url(trust_proxy)?.join(target)?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn first_header_value(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("uri", &self.uri)
            .field("secure", &self.secure)
            .field("has_session", &self.session.is_some())
            .finish()
    }
}
