//! Login countdown for connections that have not logged in yet.
//!
//! The host calls [`LoginDeadline::tick`] once per tick for each connection.
//! While logged out the session timer counts down, and at fixed marks the
//! host is told to prompt, warn, or disconnect.

use tracing::debug;

use super::session::{SessionState, DEFAULT_SESSION_TIMER_TICKS};
use crate::config::AuthConfig;

/// Host ticks per second.
pub const DEFAULT_TICKS_PER_SECOND: i64 = 20;

/// Seconds-remaining marks at which a warning is emitted.
const WARNING_SECONDS: [i64; 6] = [10, 5, 4, 3, 2, 1];

/// Something the host should tell or do to a logged-out connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownEvent {
    /// Ask the user to log in or register.
    Prompt,
    /// Time is running out.
    Warning {
        /// Whole seconds left before the timeout.
        seconds_remaining: i64,
    },
    /// The timer ran out; the user will be disconnected.
    TimedOut,
    /// Terminate the connection now.
    Disconnect,
}

/// Countdown schedule for unauthenticated connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginDeadline {
    budget_ticks: i64,
    ticks_per_second: i64,
}

impl Default for LoginDeadline {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TIMER_TICKS, DEFAULT_TICKS_PER_SECOND)
    }
}

impl From<&AuthConfig> for LoginDeadline {
    fn from(config: &AuthConfig) -> Self {
        Self::new(config.session_timer_ticks, config.ticks_per_second)
    }
}

impl LoginDeadline {
    /// Create a schedule with a full budget of `budget_ticks`.
    ///
    /// `ticks_per_second` must be positive.
    pub fn new(budget_ticks: i64, ticks_per_second: i64) -> Self {
        debug_assert!(ticks_per_second > 0, "ticks_per_second must be positive");
        Self {
            budget_ticks,
            ticks_per_second,
        }
    }

    /// The event for a timer value, if any.
    ///
    /// A warning mark whose tick count does not fit in an `i64` never fires.
    pub fn event_at(&self, ticks: i64) -> Option<CountdownEvent> {
        if ticks == self.budget_ticks {
            return Some(CountdownEvent::Prompt);
        }
        if ticks == 0 {
            return Some(CountdownEvent::TimedOut);
        }
        if ticks <= self.ticks_per_second.saturating_neg() {
            return Some(CountdownEvent::Disconnect);
        }
        WARNING_SECONDS
            .iter()
            .find(|&&secs| secs.checked_mul(self.ticks_per_second) == Some(ticks))
            .map(|&seconds_remaining| CountdownEvent::Warning { seconds_remaining })
    }

    /// Advance the countdown by one tick.
    ///
    /// Does nothing for a logged-in connection. Otherwise reports the event
    /// for the current timer value, then decrements the timer.
    pub fn tick<S: SessionState + ?Sized>(&self, session: &mut S) -> Option<CountdownEvent> {
        if session.is_logged_in() {
            return None;
        }

        let ticks = session.session_timer();
        let event = self.event_at(ticks);
        session.set_session_timer(ticks.saturating_sub(1));

        if let Some(event) = event {
            debug!(ticks, ?event, "Login countdown");
        }
        event
    }
}
