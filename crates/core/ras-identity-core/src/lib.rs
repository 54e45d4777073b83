//! Core traits and types for request authentication strategies.
//!
//! A strategy inspects an inbound [`AuthRequest`] and answers with one of the
//! four terminal [`AuthOutcome`]s understood by the surrounding pipeline. Any
//! cross-request state a strategy needs lives in the caller's [`Session`].

mod outcome;
mod request;
mod session;
mod strategy;

pub use outcome::AuthOutcome;
pub use request::{AuthRequest, RequestError};
pub use session::{InMemorySession, Session, SessionError, SessionResult};
pub use strategy::{AuthStrategy, AuthenticateOptions};

/// Boxed error used where application code hands arbitrary failures back to a strategy.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
