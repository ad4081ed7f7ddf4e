//! Naming rule shared by table names and field names.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("invalid regex"));

/// What a validated token names; used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Table,
    Field,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => f.write_str("table name"),
            Self::Field => f.write_str("field name"),
        }
    }
}

/// A token that is empty or contains characters outside `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be alphanumeric or '_': {token:?}")]
pub struct InvalidIdentifier {
    pub kind: IdentifierKind,
    pub token: String,
}

/// Checks `token` against `^[A-Za-z0-9_]+$`.
pub fn validate_identifier(kind: IdentifierKind, token: &str) -> Result<(), InvalidIdentifier> {
    if IDENTIFIER_REGEX.is_match(token) {
        Ok(())
    } else {
        Err(InvalidIdentifier {
            kind,
            token: token.to_string(),
        })
    }
}
