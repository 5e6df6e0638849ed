//! Utilities for cryptographic operations.

use ring::digest::{digest, SHA256};

/// Hashes a password using unsalted SHA-256, returning lowercase hex.
///
/// The output is deterministic so that sign-in can match a user by `(username, password_hash)`
/// directly in SQL.
pub(crate) fn hash_password<T: AsRef<[u8]>>(password: &T) -> String {
    hex::encode(digest(&SHA256, password.as_ref()))
}
