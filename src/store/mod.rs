//! Credential store for Gatekeeper.
//!
//! The store maps user identifiers to salted password hashes. It is
//! constructed explicitly by the host, shared by reference (or `Arc`) with
//! whatever dispatches register/login requests, and persisted as a whole
//! file at startup and shutdown (see [`file`]).

mod file;
mod record;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use uuid::Uuid;

pub use file::EMPTY_DATABASE;
pub use record::CredentialRecord;

/// In-memory identifier to credential mapping.
///
/// All access goes through an internal lock, so concurrent calls for
/// different identifiers never interfere. A `contains` followed by
/// `register` is *not* atomic; use [`CredentialStore::register_if_absent`]
/// when two callers may race on the same identifier.
#[derive(Debug, Default)]
pub struct CredentialStore {
    users: RwLock<HashMap<Uuid, CredentialRecord>>,
}

impl CredentialStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, CredentialRecord>> {
        self.users.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, CredentialRecord>> {
        self.users.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check whether `id` has a stored record.
    pub fn contains(&self, id: Uuid) -> bool {
        self.read().contains_key(&id)
    }

    /// Create or overwrite the record for `id` with a freshly salted hash.
    ///
    /// This does not check for an existing registration; callers that must
    /// not overwrite should check [`contains`](Self::contains) first or use
    /// [`register_if_absent`](Self::register_if_absent).
    pub fn register(&self, id: Uuid, password: &str) {
        let record = CredentialRecord::new(password);
        self.write().insert(id, record);
        debug!(id = %id, "Stored credential");
    }

    /// Create the record for `id` only if none exists.
    ///
    /// Returns `true` if this call created the record, `false` if `id` was
    /// already registered (the existing record is left untouched).
    pub fn register_if_absent(&self, id: Uuid, password: &str) -> bool {
        let record = CredentialRecord::new(password);
        match self.write().entry(id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                debug!(id = %id, "Stored credential");
                true
            }
        }
    }

    /// Verify `password` for `id`.
    ///
    /// Returns `false` if `id` is not registered or the password does not
    /// match. Never mutates the store.
    pub fn login(&self, id: Uuid, password: &str) -> bool {
        self.read()
            .get(&id)
            .is_some_and(|record| record.verify(password))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check if the store has no records.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Get a copy of the record for `id`.
    pub fn record(&self, id: Uuid) -> Option<CredentialRecord> {
        self.read().get(&id).cloned()
    }

    /// All registered identifiers, sorted.
    pub fn identifiers(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.read().keys().copied().collect();
        ids.sort();
        ids
    }

    fn replace_all(&self, users: HashMap<Uuid, CredentialRecord>) {
        *self.write() = users;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = CredentialStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(!store.contains(Uuid::new_v4()));
    }

    #[test]
    fn test_register_and_contains() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();

        store.register(id, "secret");

        assert!(store.contains(id));
        assert!(!store.contains(Uuid::new_v4()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_login_correct_and_wrong() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();
        store.register(id, "secret");

        for _ in 0..3 {
            assert!(store.login(id, "secret"));
            assert!(!store.login(id, "wrong"));
        }
    }

    #[test]
    fn test_login_unknown_id() {
        let store = CredentialStore::new();
        assert!(!store.login(Uuid::new_v4(), "anything"));
    }

    #[test]
    fn test_login_does_not_mutate() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();
        store.register(id, "secret");
        let before = store.record(id).unwrap();

        store.login(id, "secret");
        store.login(id, "wrong");

        assert_eq!(store.record(id).unwrap(), before);
    }

    #[test]
    fn test_register_overwrites() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();

        store.register(id, "first");
        store.register(id, "second");

        assert_eq!(store.len(), 1);
        assert!(!store.login(id, "first"));
        assert!(store.login(id, "second"));
    }

    #[test]
    fn test_register_if_absent() {
        let store = CredentialStore::new();
        let id = Uuid::new_v4();

        assert!(store.register_if_absent(id, "first"));
        assert!(!store.register_if_absent(id, "second"));

        assert!(store.login(id, "first"));
        assert!(!store.login(id, "second"));
    }

    #[test]
    fn test_identifiers_sorted() {
        let store = CredentialStore::new();
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            store.register(*id, "pw");
        }
        ids.sort();

        assert_eq!(store.identifiers(), ids);
    }
}
