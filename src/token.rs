//! See [`Token`].

use std::fmt::{self, Display, Formatter};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde_with::SerializeDisplay;

/// How many random bytes make up a [`Token`].
const TOKEN_LENGTH: usize = 32;

/// An opaque session token, serialized as `base64url` (without padding).
///
/// Tokens are only issued. Nothing in this crate stores or verifies them.
#[derive(SerializeDisplay, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Token([u8; TOKEN_LENGTH]);

impl Token {
    /// Generates a cryptographically secure pseudorandom token.
    pub fn generate() -> Self {
        let mut bytes = [0; TOKEN_LENGTH];
        rand::rng().fill_bytes(&mut bytes);

        Self(bytes)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}
