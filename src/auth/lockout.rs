//! Login attempt and lockout state machine.
//!
//! [`AuthState::step`] is a pure transition function over what the store
//! reported for a request. [`Authenticator`] runs requests against a
//! [`CredentialStore`] and writes the resulting state back into the
//! connection's [`SessionState`].

use tracing::{error, info, warn};
use uuid::Uuid;

use super::session::{SessionState, DEFAULT_SESSION_TIMER_TICKS, MAX_LOGIN_ATTEMPTS};
use crate::config::AuthConfig;
use crate::store::CredentialStore;

/// Lockout and session timer settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    /// Failed attempts after which the connection is locked.
    pub max_attempts: u32,
    /// Session timer value set on successful login.
    pub session_timer_ticks: i64,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_LOGIN_ATTEMPTS,
            session_timer_ticks: DEFAULT_SESSION_TIMER_TICKS,
        }
    }
}

impl From<&AuthConfig> for LockoutPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self {
            max_attempts: config.max_login_attempts,
            session_timer_ticks: config.session_timer_ticks,
        }
    }
}

/// Result of a register or login request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Logged in (after login or registration).
    Success,
    /// The identifier already has a credential.
    AlreadyRegistered,
    /// The connection is already logged in.
    AlreadyLoggedIn,
    /// The identifier has no credential.
    NotRegistered,
    /// Wrong password; `remaining` attempts are left before lockout.
    WrongPassword {
        /// Attempts left.
        remaining: u32,
    },
    /// Too many failed attempts; the caller must terminate the connection.
    AttemptsExceeded,
    /// Registration stored a credential that then failed to verify.
    InternalError,
}

impl AuthOutcome {
    /// Whether the connection is now logged in.
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    /// Whether the caller must terminate the connection.
    pub fn must_disconnect(&self) -> bool {
        matches!(self, AuthOutcome::AttemptsExceeded)
    }
}

/// What the store reported for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// A new credential was stored; `verified` is the result of logging in
    /// with the same password straight afterwards.
    Registered {
        /// Whether the post-registration login matched.
        verified: bool,
    },
    /// Registration refused because the identifier already has a credential.
    RegisterRejected,
    /// The password matched the stored credential.
    LoginAccepted,
    /// The password did not match.
    LoginRejected,
    /// Login for an identifier with no credential.
    LoginUnknown,
}

impl AuthEvent {
    fn is_login(&self) -> bool {
        matches!(
            self,
            AuthEvent::LoginAccepted | AuthEvent::LoginRejected | AuthEvent::LoginUnknown
        )
    }
}

/// Login state of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Not logged in, no failed attempts.
    Anonymous,
    /// Not logged in, with `attempts` failures below the limit.
    Authenticating {
        /// Failed attempts so far.
        attempts: u32,
    },
    /// Logged in for the rest of the connection.
    LoggedIn,
    /// Attempt limit reached; the connection must be terminated.
    Locked {
        /// Failed attempts recorded.
        attempts: u32,
    },
}

impl AuthState {
    /// Derive the state from a connection's session fields.
    pub fn from_session<S: SessionState + ?Sized>(session: &S, policy: &LockoutPolicy) -> Self {
        let attempts = session.attempts();
        if session.is_logged_in() {
            AuthState::LoggedIn
        } else if attempts >= policy.max_attempts {
            AuthState::Locked { attempts }
        } else if attempts == 0 {
            AuthState::Anonymous
        } else {
            AuthState::Authenticating { attempts }
        }
    }

    /// Failed attempts to record for this state.
    pub fn attempts(&self) -> u32 {
        match self {
            AuthState::Anonymous | AuthState::LoggedIn => 0,
            AuthState::Authenticating { attempts } | AuthState::Locked { attempts } => *attempts,
        }
    }

    /// Outcome for a request this state refuses without consulting the store.
    ///
    /// A locked connection refuses everything; a logged-in one refuses
    /// further logins.
    pub fn refuse(&self, login: bool) -> Option<AuthOutcome> {
        match self {
            AuthState::Locked { .. } => Some(AuthOutcome::AttemptsExceeded),
            AuthState::LoggedIn if login => Some(AuthOutcome::AlreadyLoggedIn),
            _ => None,
        }
    }

    /// Apply `event` and return the next state and the request outcome.
    ///
    /// On a wrong password the attempt count is incremented first; reaching
    /// the limit yields [`AuthOutcome::AttemptsExceeded`] instead of a
    /// "0 remaining" result.
    pub fn step(self, event: AuthEvent, policy: &LockoutPolicy) -> (AuthState, AuthOutcome) {
        if let Some(outcome) = self.refuse(event.is_login()) {
            return (self, outcome);
        }

        match event {
            AuthEvent::Registered { verified: true } | AuthEvent::LoginAccepted => {
                (AuthState::LoggedIn, AuthOutcome::Success)
            }
            AuthEvent::Registered { verified: false } => (self, AuthOutcome::InternalError),
            AuthEvent::RegisterRejected => (self, AuthOutcome::AlreadyRegistered),
            AuthEvent::LoginUnknown => (self, AuthOutcome::NotRegistered),
            AuthEvent::LoginRejected => {
                let attempts = self.attempts().saturating_add(1);
                if attempts >= policy.max_attempts {
                    (AuthState::Locked { attempts }, AuthOutcome::AttemptsExceeded)
                } else {
                    (
                        AuthState::Authenticating { attempts },
                        AuthOutcome::WrongPassword {
                            remaining: policy.max_attempts - attempts,
                        },
                    )
                }
            }
        }
    }
}

/// Runs register and login requests against a credential store.
#[derive(Debug, Clone, Copy)]
pub struct Authenticator<'a> {
    store: &'a CredentialStore,
    policy: LockoutPolicy,
}

impl<'a> Authenticator<'a> {
    /// Create an authenticator with the default policy.
    pub fn new(store: &'a CredentialStore) -> Self {
        Self::with_policy(store, LockoutPolicy::default())
    }

    /// Create an authenticator with a custom policy.
    pub fn with_policy(store: &'a CredentialStore, policy: LockoutPolicy) -> Self {
        Self { store, policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    /// Register `id` with `password` and log the connection in.
    ///
    /// The check for an existing credential and the insert happen under one
    /// lock, so of two concurrent registrations for the same identifier
    /// exactly one succeeds and the other gets
    /// [`AuthOutcome::AlreadyRegistered`].
    pub fn register<S: SessionState + ?Sized>(
        &self,
        session: &mut S,
        id: Uuid,
        password: &str,
    ) -> AuthOutcome {
        let state = AuthState::from_session(session, &self.policy);
        if let Some(outcome) = state.refuse(false) {
            warn!(id = %id, ?outcome, "Registration refused");
            return outcome;
        }

        let event = if self.store.register_if_absent(id, password) {
            AuthEvent::Registered {
                verified: self.store.login(id, password),
            }
        } else {
            AuthEvent::RegisterRejected
        };

        let outcome = self.commit(session, state, event);
        match outcome {
            AuthOutcome::Success => info!(id = %id, "Registration succeeded"),
            AuthOutcome::AlreadyRegistered => {
                info!(id = %id, "Registration failed: user already registered")
            }
            AuthOutcome::InternalError => {
                error!(id = %id, "Registration failed: post-registration login did not verify")
            }
            _ => {}
        }
        outcome
    }

    /// Log the connection in as `id`.
    pub fn login<S: SessionState + ?Sized>(
        &self,
        session: &mut S,
        id: Uuid,
        password: &str,
    ) -> AuthOutcome {
        let state = AuthState::from_session(session, &self.policy);
        if let Some(outcome) = state.refuse(true) {
            info!(id = %id, ?outcome, "Login refused");
            return outcome;
        }

        let event = if !self.store.contains(id) {
            AuthEvent::LoginUnknown
        } else if self.store.login(id, password) {
            AuthEvent::LoginAccepted
        } else {
            AuthEvent::LoginRejected
        };

        let outcome = self.commit(session, state, event);
        match outcome {
            AuthOutcome::Success => info!(id = %id, "Login succeeded"),
            AuthOutcome::NotRegistered => info!(id = %id, "Login failed: user not registered"),
            AuthOutcome::WrongPassword { remaining } => {
                warn!(id = %id, remaining, "Login failed: wrong password")
            }
            AuthOutcome::AttemptsExceeded => {
                warn!(id = %id, "Login failed: maximum login attempts exceeded")
            }
            _ => {}
        }
        outcome
    }

    fn commit<S: SessionState + ?Sized>(
        &self,
        session: &mut S,
        state: AuthState,
        event: AuthEvent,
    ) -> AuthOutcome {
        let (next, outcome) = state.step(event, &self.policy);

        if outcome.is_success() {
            session.set_logged_in(true);
            session.set_attempts(0);
            session.set_session_timer(self.policy.session_timer_ticks);
        } else if next != state {
            session.set_attempts(next.attempts());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LoginSession;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::default()
    }

    #[test]
    fn test_step_wrong_password_sequence() {
        let p = policy();
        let (s1, o1) = AuthState::Anonymous.step(AuthEvent::LoginRejected, &p);
        let (s2, o2) = s1.step(AuthEvent::LoginRejected, &p);
        let (s3, o3) = s2.step(AuthEvent::LoginRejected, &p);

        assert_eq!(o1, AuthOutcome::WrongPassword { remaining: 2 });
        assert_eq!(s1, AuthState::Authenticating { attempts: 1 });
        assert_eq!(o2, AuthOutcome::WrongPassword { remaining: 1 });
        assert_eq!(s2, AuthState::Authenticating { attempts: 2 });
        assert_eq!(o3, AuthOutcome::AttemptsExceeded);
        assert_eq!(s3, AuthState::Locked { attempts: 3 });
    }

    #[test]
    fn test_step_locked_refuses_everything() {
        let p = policy();
        let locked = AuthState::Locked { attempts: 3 };
        for event in [
            AuthEvent::LoginAccepted,
            AuthEvent::LoginRejected,
            AuthEvent::LoginUnknown,
            AuthEvent::Registered { verified: true },
            AuthEvent::RegisterRejected,
        ] {
            assert_eq!(locked.step(event, &p), (locked, AuthOutcome::AttemptsExceeded));
        }
    }

    #[test]
    fn test_step_logged_in_refuses_login() {
        let p = policy();
        assert_eq!(
            AuthState::LoggedIn.step(AuthEvent::LoginRejected, &p),
            (AuthState::LoggedIn, AuthOutcome::AlreadyLoggedIn)
        );
        assert_eq!(
            AuthState::LoggedIn.step(AuthEvent::LoginAccepted, &p),
            (AuthState::LoggedIn, AuthOutcome::AlreadyLoggedIn)
        );
    }

    #[test]
    fn test_step_success_resets_attempts() {
        let p = policy();
        let (state, outcome) =
            AuthState::Authenticating { attempts: 2 }.step(AuthEvent::LoginAccepted, &p);
        assert_eq!(state, AuthState::LoggedIn);
        assert_eq!(outcome, AuthOutcome::Success);
        assert_eq!(state.attempts(), 0);
    }

    #[test]
    fn test_step_unchanged_outcomes() {
        let p = policy();
        let s = AuthState::Authenticating { attempts: 1 };
        assert_eq!(
            s.step(AuthEvent::LoginUnknown, &p),
            (s, AuthOutcome::NotRegistered)
        );
        assert_eq!(
            s.step(AuthEvent::RegisterRejected, &p),
            (s, AuthOutcome::AlreadyRegistered)
        );
        assert_eq!(
            s.step(AuthEvent::Registered { verified: false }, &p),
            (s, AuthOutcome::InternalError)
        );
    }

    #[test]
    fn test_step_custom_limit() {
        let p = LockoutPolicy {
            max_attempts: 1,
            ..LockoutPolicy::default()
        };
        assert_eq!(
            AuthState::Anonymous.step(AuthEvent::LoginRejected, &p),
            (AuthState::Locked { attempts: 1 }, AuthOutcome::AttemptsExceeded)
        );
    }

    #[test]
    fn test_from_session() {
        let p = policy();
        let mut session = LoginSession::new();
        assert_eq!(AuthState::from_session(&session, &p), AuthState::Anonymous);

        session.set_attempts(2);
        assert_eq!(
            AuthState::from_session(&session, &p),
            AuthState::Authenticating { attempts: 2 }
        );

        session.set_attempts(3);
        assert_eq!(
            AuthState::from_session(&session, &p),
            AuthState::Locked { attempts: 3 }
        );

        session.set_logged_in(true);
        assert_eq!(AuthState::from_session(&session, &p), AuthState::LoggedIn);
    }

    #[test]
    fn test_policy_from_config() {
        let config = AuthConfig {
            max_login_attempts: 5,
            session_timer_ticks: 100,
            ticks_per_second: 20,
        };
        let p = LockoutPolicy::from(&config);
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.session_timer_ticks, 100);
    }

    #[test]
    fn test_authenticator_register_logs_in() {
        let store = CredentialStore::new();
        let auth = Authenticator::new(&store);
        let mut session = LoginSession::with_timer(17);
        let id = Uuid::new_v4();

        assert_eq!(auth.register(&mut session, id, "secret"), AuthOutcome::Success);
        assert!(session.is_logged_in());
        assert_eq!(session.session_timer(), 400);
        assert!(store.login(id, "secret"));
    }

    #[test]
    fn test_authenticator_wrong_password_updates_session() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();
        store.register(id, "secret");
        let auth = Authenticator::new(&store);
        let mut session = LoginSession::new();

        assert_eq!(
            auth.login(&mut session, id, "nope"),
            AuthOutcome::WrongPassword { remaining: 2 }
        );
        assert_eq!(session.attempts(), 1);
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_authenticator_not_registered_leaves_session() {
        let store = CredentialStore::new();
        let auth = Authenticator::new(&store);
        let mut session = LoginSession::new();
        session.set_attempts(1);

        assert_eq!(
            auth.login(&mut session, Uuid::new_v4(), "pw"),
            AuthOutcome::NotRegistered
        );
        assert_eq!(session.attempts(), 1);
    }

    #[test]
    fn test_authenticator_locked_does_not_register() {
        let store = CredentialStore::new();
        let auth = Authenticator::new(&store);
        let mut session = LoginSession::new();
        session.set_attempts(3);
        let id = Uuid::new_v4();

        assert_eq!(
            auth.register(&mut session, id, "pw"),
            AuthOutcome::AttemptsExceeded
        );
        assert!(!store.contains(id));
    }

    #[test]
    fn test_outcome_helpers() {
        assert!(AuthOutcome::Success.is_success());
        assert!(!AuthOutcome::AlreadyLoggedIn.is_success());
        assert!(AuthOutcome::AttemptsExceeded.must_disconnect());
        assert!(!AuthOutcome::WrongPassword { remaining: 1 }.must_disconnect());
    }
}
