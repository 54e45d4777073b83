//! Generic OAuth2 authorization code flow engine.
//!
//! This crate knows nothing about any particular identity provider. It builds
//! authorization URLs, exchanges authorization codes at a token endpoint and
//! performs authenticated GETs with the resulting access token. Provider
//! strategies compose an [`OAuth2Flow`] rather than extending it.

mod client;
mod config;
mod error;
mod types;


pub use client::{OAuth2Client, OAuth2Flow};
pub use config::OAuth2ClientConfig;
pub use error::{OAuth2Error, OAuth2Result};
pub use types::{TokenErrorResponse, TokenResponse};
