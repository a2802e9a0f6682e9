//! Gatekeeper - username/credential gatekeeper
//!
//! Registers users by identifier, stores a salted password hash, verifies
//! login attempts and locks a connection out after repeated failures.

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod store;

pub use auth::{
    hash_with_new_salt, hash_with_salt, AuthOutcome, AuthState, Authenticator, CountdownEvent,
    LockoutPolicy, LoginDeadline, LoginSession, SessionState,
};
pub use config::Config;
pub use error::{GatekeeperError, Result};
pub use store::{CredentialRecord, CredentialStore};
