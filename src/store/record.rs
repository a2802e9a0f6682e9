//! Stored credential records and their on-disk representation.

use serde::{Deserialize, Serialize};

use crate::auth::{hash_with_new_salt, verify_password, PasswordHash, Salt};
use crate::{GatekeeperError, Result};

/// A salted password hash for one identifier.
///
/// `hash` is always SHA-256 of `salt || UTF-8(password)` for the password
/// the record was registered with. The salt never changes for the lifetime
/// of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    hash: PasswordHash,
    salt: Salt,
}

impl CredentialRecord {
    /// Create a record for `password` with a fresh random salt.
    pub fn new(password: &str) -> Self {
        let (hash, salt) = hash_with_new_salt(password);
        Self { hash, salt }
    }

    /// Build a record from an existing hash and salt.
    pub fn from_parts(hash: PasswordHash, salt: Salt) -> Self {
        Self { hash, salt }
    }

    /// The stored hash.
    pub fn hash(&self) -> &PasswordHash {
        &self.hash
    }

    /// The stored salt.
    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Check whether `password` matches this record.
    pub fn verify(&self, password: &str) -> bool {
        verify_password(password, &self.salt, &self.hash)
    }
}

/// JSON form of a record: lowercase hex `hash` and `salt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredRecord {
    pub hash: String,
    pub salt: String,
}

impl From<&CredentialRecord> for StoredRecord {
    fn from(record: &CredentialRecord) -> Self {
        Self {
            hash: hex::encode(record.hash),
            salt: hex::encode(record.salt),
        }
    }
}

impl StoredRecord {
    /// Decode into a [`CredentialRecord`], naming `id` in any error.
    pub fn decode(&self, id: &str) -> Result<CredentialRecord> {
        Ok(CredentialRecord {
            hash: decode_fixed(id, "hash", &self.hash)?,
            salt: decode_fixed(id, "salt", &self.salt)?,
        })
    }
}

fn decode_fixed<const N: usize>(id: &str, field: &str, value: &str) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    hex::decode_to_slice(value, &mut out).map_err(|e| {
        GatekeeperError::Format(format!(
            "{field} for '{id}' is not {len} bytes of hex: {e}",
            len = N
        ))
    })?;
    Ok(out)
}
