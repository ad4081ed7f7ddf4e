//! # Auth - Database Credentials
//!
//! A database carries one username and one password, each stored as an
//! opaque blob produced by a [`Cipher`]. The catalog only ever needs the
//! `encode`/`decode` pair, so the scheme is swappable.
//!
//! [`ShiftCipher`] reproduces the scheme used by existing databases so their
//! `auth/` files stay readable. It obscures, it does not encrypt.

use rand::Rng;
use regex::Regex;
use std::sync::LazyLock;

use thiserror::Error;

/// Minimum username length accepted by [`Credentials::new`].
pub const MIN_USERNAME_LEN: usize = 3;
/// Minimum password length accepted by [`Credentials::new`].
pub const MIN_PASSWORD_LEN: usize = 8;

static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("invalid regex"));

/// Errors produced while validating or decoding credentials.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The supplied credentials break a setup rule.
    #[error("{0}")]
    Validation(String),

    /// A stored blob is not something the cipher produced.
    #[error("cannot decode credential: {0}")]
    Decode(String),
}

/// Reversible transform applied to each credential before it is written.
pub trait Cipher {
    fn encode(&self, plain: &str) -> Vec<u8>;
    fn decode(&self, blob: &[u8]) -> Result<String, AuthError>;
}

/// Legacy credential scheme.
///
/// Layout: 23 random bytes from `'#'..='>'`, the payload with each byte
/// shifted up by 7, then 23 more random bytes. The two shifted values that
/// would land on 127 and 129 are written as `!` and `"` instead, so input
/// bytes 26 and 27 (control characters) cannot be told apart from `x` and
/// `z` and decode as the latter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftCipher;

impl ShiftCipher {
    const PADDING: usize = 23;
    const SHIFT: u8 = 7;
    const NOISE_MIN: u8 = b'#';
    const NOISE_MAX: u8 = b'>';

    fn push_noise(out: &mut Vec<u8>) {
        let mut rng = rand::rng();
        for _ in 0..Self::PADDING {
            out.push(rng.random_range(Self::NOISE_MIN..=Self::NOISE_MAX));
        }
    }
}

impl Cipher for ShiftCipher {
    fn encode(&self, plain: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(plain.len() + 2 * Self::PADDING);
        Self::push_noise(&mut out);
        for b in plain.bytes() {
            out.push(match b {
                b'x' => b'!',
                b'z' => b'"',
                other => other.wrapping_add(Self::SHIFT),
            });
        }
        Self::push_noise(&mut out);
        out
    }

    fn decode(&self, blob: &[u8]) -> Result<String, AuthError> {
        if blob.len() < 2 * Self::PADDING {
            return Err(AuthError::Decode(format!(
                "blob is {} bytes, shorter than its padding",
                blob.len()
            )));
        }
        let payload = &blob[Self::PADDING..blob.len() - Self::PADDING];
        let bytes: Vec<u8> = payload
            .iter()
            .map(|&b| match b {
                b'!' => b'x',
                b'"' => b'z',
                other => other.wrapping_sub(Self::SHIFT),
            })
            .collect();
        String::from_utf8(bytes).map_err(|e| AuthError::Decode(e.to_string()))
    }
}

/// A validated username/password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Validates a new pair as entered at setup time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the username is not made of
    /// `[A-Za-z0-9_-]` or is shorter than [`MIN_USERNAME_LEN`], if the
    /// passwords differ, if the password is shorter than
    /// [`MIN_PASSWORD_LEN`], or if it contains control characters.
    pub fn new(username: &str, password: &str, confirm: &str) -> Result<Self, AuthError> {
        if !USERNAME_REGEX.is_match(username) {
            return Err(AuthError::Validation("username must be alphanumeric".into()));
        }
        if username.len() < MIN_USERNAME_LEN {
            return Err(AuthError::Validation(format!(
                "username must be at least {MIN_USERNAME_LEN} characters long"
            )));
        }
        if password != confirm {
            return Err(AuthError::Validation("passwords do not match".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        if password.chars().any(char::is_control) {
            return Err(AuthError::Validation(
                "password must not contain control characters".into(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    /// Rebuilds a pair read back from storage without re-validating it.
    pub fn from_stored(username: String, password: String) -> Self {
        Self { username, password }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}
