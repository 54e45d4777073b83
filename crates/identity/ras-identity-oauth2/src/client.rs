//! OAuth2 client for the authorization code grant.

use crate::config::OAuth2ClientConfig;
use crate::error::{OAuth2Error, OAuth2Result};
use crate::types::{TokenErrorResponse, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// The capabilities a provider strategy needs from an OAuth2 client.
#[async_trait]
pub trait OAuth2Flow: Send + Sync {
    /// Build the URL the user agent is redirected to for consent.
    fn authorize_url(
        &self,
        redirect_uri: Option<&str>,
        params: &[(String, String)],
    ) -> OAuth2Result<String>;

    /// Exchange an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        params: &[(String, String)],
    ) -> OAuth2Result<TokenResponse>;

    /// GET a protected resource, returning the response body.
    async fn get(&self, url: &str, access_token: &str) -> OAuth2Result<String>;
}

/// reqwest-backed [`OAuth2Flow`].
#[derive(Clone)]
pub struct OAuth2Client {
    http_client: Client,
    config: OAuth2ClientConfig,
}

impl OAuth2Client {
    pub fn new(config: OAuth2ClientConfig) -> OAuth2Result<Self> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.http_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            http_client: builder.build()?,
            config,
        })
    }

    /// Use an existing HTTP client, e.g. one shared with the rest of the application.
    pub fn with_http_client(config: OAuth2ClientConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    pub fn config(&self) -> &OAuth2ClientConfig {
        &self.config
    }
}

#[async_trait]
impl OAuth2Flow for OAuth2Client {
    fn authorize_url(
        &self,
        redirect_uri: Option<&str>,
        params: &[(String, String)],
    ) -> OAuth2Result<String> {
        let mut url = Url::parse(&self.config.authorization_endpoint)?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("client_id", &self.config.client_id);
            if let Some(redirect_uri) = redirect_uri {
                query.append_pair(&self.config.redirect_uri_param, redirect_uri);
            }
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        debug!(
            "Generated authorization URL for endpoint {}",
            self.config.authorization_endpoint
        );
        Ok(url.to_string())
    }

    async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        params: &[(String, String)],
    ) -> OAuth2Result<TokenResponse> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if let Some(redirect_uri) = redirect_uri {
            form.push((self.config.redirect_uri_param.as_str(), redirect_uri));
        }
        form.extend(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        form.push(("code", code));

        let response = self
            .http_client
            .post(&self.config.token_endpoint)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Token exchange failed with status {}", status);
            let error_body = serde_json::from_str::<TokenErrorResponse>(&body);
            return Err(match error_body {
                Ok(error_body) => error_body.into_error(status.as_u16()),
                Err(_) => OAuth2Error::TokenExchangeFailed {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let token_response = TokenResponse::parse(&body)?;
        info!("Successfully exchanged code for tokens");
        Ok(token_response)
    }

    async fn get(&self, url: &str, access_token: &str) -> OAuth2Result<String> {
        let request = if self.config.use_authorization_header_for_get {
            self.http_client.get(url).bearer_auth(access_token)
        } else {
            let mut url = Url::parse(url)?;
            url.query_pairs_mut()
                .append_pair("access_token", access_token);
            self.http_client.get(url)
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("GET {} failed with status {}", url, status);
            return Err(OAuth2Error::RequestFailed {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        debug!("GET {} succeeded", url);
        Ok(body)
    }
}
