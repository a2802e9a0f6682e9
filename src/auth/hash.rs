//! Salted password hashing for Gatekeeper.
//!
//! Hashes are a single SHA-256 pass over `salt || UTF-8(password)` with a
//! 32-byte random salt per credential. This is not a slow KDF; the scheme is
//! kept as-is because changing it would invalidate every stored credential.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Salt length in bytes.
pub const SALT_LEN: usize = 32;

/// Hash length in bytes (SHA-256 output).
pub const HASH_LEN: usize = 32;

/// A per-credential random salt.
pub type Salt = [u8; SALT_LEN];

/// A salted SHA-256 password hash.
pub type PasswordHash = [u8; HASH_LEN];

fn digest(password: &str, salt: &[u8]) -> PasswordHash {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Hash a password with the given salt.
///
/// Deterministic: the same password and salt always produce the same hash.
///
/// # Examples
///
/// ```
/// use gatekeeper::auth::hash_with_salt;
///
/// let salt = [7u8; 32];
/// assert_eq!(hash_with_salt("secret", &salt), hash_with_salt("secret", &salt));
/// ```
pub fn hash_with_salt(password: &str, salt: &Salt) -> PasswordHash {
    digest(password, salt)
}

/// Hash a password with a salt given as a slice.
///
/// # Panics
///
/// Panics if `salt` is not exactly [`SALT_LEN`] bytes long.
pub fn hash_with_salt_slice(password: &str, salt: &[u8]) -> PasswordHash {
    assert_eq!(
        salt.len(),
        SALT_LEN,
        "salt must be exactly {SALT_LEN} bytes, got {}",
        salt.len()
    );
    digest(password, salt)
}

/// Generate a fresh salt from the operating system CSPRNG.
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Hash a password with a newly generated salt.
///
/// Returns the hash and the salt used to produce it.
pub fn hash_with_new_salt(password: &str) -> (PasswordHash, Salt) {
    let salt = generate_salt();
    (hash_with_salt(password, &salt), salt)
}

/// Check a password against a stored hash and salt.
///
/// The final comparison runs in constant time.
pub fn verify_password(password: &str, salt: &Salt, expected: &PasswordHash) -> bool {
    let actual = hash_with_salt(password, salt);
    constant_time_eq(&actual, expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
