use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use ras_identity_connections::{
    AuthOutcome, AuthRequest, AuthenticateOptions, ConnectionsConfig, ConnectionsStrategy,
    Profile, Verified, Verify,
};
use ras_identity_core::{InMemorySession, Session};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const SESSION_COOKIE: &str = "sid";
const USER_KEY: &str = "user";

/// Configuration for the Connections Cloud demo
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connections: ConnectionsConfig,
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let hostname = std::env::var("CONNECTIONS_HOSTNAME")
            .context("CONNECTIONS_HOSTNAME environment variable is required")?;
        let client_id = std::env::var("CONNECTIONS_CLIENT_ID")
            .context("CONNECTIONS_CLIENT_ID environment variable is required")?;
        let client_secret = std::env::var("CONNECTIONS_CLIENT_SECRET")
            .context("CONNECTIONS_CLIENT_SECRET environment variable is required")?;
        let callback_url = std::env::var("CONNECTIONS_CALLBACK_URL")
            .unwrap_or_else(|_| "/auth/connections/callback".to_string());
        let trust_proxy = std::env::var("TRUST_PROXY")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .context("TRUST_PROXY must be true or false")?;

        Ok(Self {
            connections: ConnectionsConfig::new(hostname, client_id, client_secret)
                .with_callback_url(callback_url)
                .with_trust_proxy(trust_proxy)
                .with_http_timeout(30),
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}

/// The signed in user as stored in the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoUser {
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl From<Profile> for DemoUser {
    fn from(profile: Profile) -> Self {
        let email = profile
            .emails
            .iter()
            .flatten()
            .find_map(|email| email.get("value").and_then(|value| value.as_str()))
            .map(str::to_string);

        Self {
            user_id: profile.user_id,
            display_name: profile.display_name,
            email,
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub strategy: Arc<ConnectionsStrategy<DemoUser>>,
    pub sessions: Arc<RwLock<HashMap<String, InMemorySession>>>,
}

impl AppState {
    /// Look up the session named by the cookie, starting a new one if needed.
    async fn session(&self, jar: CookieJar) -> (CookieJar, InMemorySession) {
        if let Some(sid) = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
            if let Some(session) = self.sessions.read().await.get(&sid) {
                return (jar, session.clone());
            }
        }

        let sid = Uuid::new_v4().to_string();
        let session = InMemorySession::new();
        self.sessions
            .write()
            .await
            .insert(sid.clone(), session.clone());

        let cookie = Cookie::build((SESSION_COOKIE, sid))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        (jar.add(cookie), session)
    }
}

fn create_strategy(config: &AppConfig) -> Result<ConnectionsStrategy<DemoUser>> {
    let verify = Verify::profile(|_access_token, _refresh_token, profile| async move {
        info!("Verified Connections user {}", profile.user_id);
        Ok(Verified::user(DemoUser::from(profile)))
    });

    ConnectionsStrategy::new(config.connections.clone(), verify)
        .context("Failed to create IBM Connections Cloud strategy")
}

/// Handler for both legs of the flow: without `code` it redirects to the
/// provider, on the callback it completes the login.
async fn authenticate_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
) -> (CookieJar, Response) {
    let (jar, session) = state.session(jar).await;
    let (parts, _body) = request.into_parts();
    let auth_request = AuthRequest::from_parts(&parts).with_session(Arc::new(session.clone()));

    let outcome = state
        .strategy
        .authenticate(&auth_request, &AuthenticateOptions::default())
        .await;

    let response = match outcome {
        AuthOutcome::Redirect { location } => Redirect::to(&location).into_response(),
        AuthOutcome::Success { user, .. } => match serde_json::to_value(&user) {
            Ok(value) => match session.insert(USER_KEY, value).await {
                Ok(()) => Redirect::to("/me").into_response(),
                Err(e) => {
                    error!("Failed to store user in session: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            },
            Err(e) => {
                error!("Failed to serialize user: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        },
        AuthOutcome::Fail { info, status } => {
            warn!("Authentication failed: {:?}", info);
            let status = status
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::UNAUTHORIZED);
            (status, Json(info.unwrap_or_else(|| json!({})))).into_response()
        }
        AuthOutcome::Error(e) => {
            error!("Authentication error: {}", e);
            let status =
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    };

    (jar, response)
}

/// Handler returning the signed in user
async fn me_handler(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Response) {
    let (jar, session) = state.session(jar).await;

    let response = match session.get(USER_KEY).await {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Not signed in", "login": "/auth/connections" })),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to read session: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    (jar, response)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ras_identity_connections=debug")),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(
        "Starting IBM Connections Cloud demo for {}",
        config.connections.hostname
    );

    let app_state = AppState {
        strategy: Arc::new(create_strategy(&config)?),
        sessions: Arc::new(RwLock::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/auth/connections", get(authenticate_handler))
        .route("/auth/connections/callback", get(authenticate_handler))
        .route("/me", get(me_handler))
        .with_state(app_state);

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Server running on http://{}", bind_addr);
    warn!(
        "This is an example application. Sessions live in memory and are lost on restart."
    );

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
