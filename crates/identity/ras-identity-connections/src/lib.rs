//! IBM Connections Cloud authentication strategy.
//!
//! Drives the OAuth 2.0 authorization code grant against a Connections Cloud
//! tenant: the first request redirects to the provider with a CSRF `state`
//! kept in the caller's session, the callback request exchanges the code,
//! loads the OpenSocial profile and hands both to the application's
//! [`Verify`] callback.
//!
//! ```no_run
//! use ras_identity_connections::{ConnectionsConfig, ConnectionsStrategy, Verified, Verify};
//!
//! # fn build() -> Result<(), ras_identity_connections::ConfigError> {
//! let config = ConnectionsConfig::new("apps.na.collabserv.com", "client-id", "client-secret")
//!     .with_callback_url("/auth/connections/callback");
//!
//! let strategy = ConnectionsStrategy::new(
//!     config,
//!     Verify::profile(|_access_token, _refresh_token, profile| async move {
//!         Ok(Verified::user(profile.user_id))
//!     }),
//! )?;
//! # let _ = strategy;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod profile;
mod state;
mod strategy;
mod verify;


pub use config::{CALLBACK_URI_PARAM, ConnectionsConfig, Endpoints, STRATEGY_NAME};
pub use error::{AuthorizationError, ConfigError, ConnectionsError};
pub use profile::{PROFILE_ID_PREFIX, Profile, ProfileError};
pub use state::{SessionStateStore, generate_state};
pub use strategy::ConnectionsStrategy;
pub use verify::{Verified, Verify, VerifyFuture};

// Re-export common types for convenience
pub use ras_identity_core::{AuthOutcome, AuthRequest, AuthStrategy, AuthenticateOptions, BoxError};
pub use ras_identity_oauth2::{OAuth2Flow, TokenResponse};
