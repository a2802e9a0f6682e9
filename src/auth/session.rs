//! Per-connection login state.
//!
//! The host owns the per-connection fields; Gatekeeper only reads and
//! writes them through [`SessionState`].

/// Session timer value set on a successful login, in host ticks.
pub const DEFAULT_SESSION_TIMER_TICKS: i64 = 400;

/// Failed login attempts allowed before the connection is locked.
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;

/// Access to the login fields of one connection.
///
/// Implemented by the host's connection or player type.
pub trait SessionState {
    /// Consecutive failed login attempts on this connection.
    fn attempts(&self) -> u32;

    /// Set the failed attempt count.
    fn set_attempts(&mut self, attempts: u32);

    /// Whether this connection has logged in.
    fn is_logged_in(&self) -> bool;

    /// Mark this connection as logged in or not.
    fn set_logged_in(&mut self, logged_in: bool);

    /// Current session timer, in ticks.
    fn session_timer(&self) -> i64;

    /// Set the session timer, in ticks.
    fn set_session_timer(&mut self, ticks: i64);
}

/// A plain in-memory [`SessionState`].
///
/// Starts logged out with zero attempts and a full timer, which is also the
/// state a reconnecting client gets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSession {
    logged_in: bool,
    attempts: u32,
    session_timer: i64,
}

impl Default for LoginSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginSession {
    /// Create a fresh session.
    pub fn new() -> Self {
        Self::with_timer(DEFAULT_SESSION_TIMER_TICKS)
    }

    /// Create a fresh session with a custom starting timer.
    pub fn with_timer(ticks: i64) -> Self {
        Self {
            logged_in: false,
            attempts: 0,
            session_timer: ticks,
        }
    }
}

impl SessionState for LoginSession {
    fn attempts(&self) -> u32 {
        self.attempts
    }

    fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
    }

    fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    fn session_timer(&self) -> i64 {
        self.session_timer
    }

    fn set_session_timer(&mut self, ticks: i64) {
        self.session_timer = ticks;
    }
}
