//! Authentication module for Gatekeeper.
//!
//! This module provides salted password hashing, the per-connection session
//! capability, the login attempt/lockout state machine and the login
//! countdown for connections that have not authenticated yet.

mod deadline;
mod hash;
mod lockout;
mod session;

pub use deadline::{CountdownEvent, LoginDeadline, DEFAULT_TICKS_PER_SECOND};
pub use hash::{
    generate_salt, hash_with_new_salt, hash_with_salt, hash_with_salt_slice, verify_password,
    PasswordHash, Salt, HASH_LEN, SALT_LEN,
};
pub use lockout::{AuthEvent, AuthOutcome, AuthState, Authenticator, LockoutPolicy};
pub use session::{LoginSession, SessionState, DEFAULT_SESSION_TIMER_TICKS, MAX_LOGIN_ATTEMPTS};
