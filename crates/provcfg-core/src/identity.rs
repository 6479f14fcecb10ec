//! # Provider Identification
//!
//! A provider is named by exactly one of a UUID or a free-form name. The
//! UUID shape check here is the permissive one the host platform applies
//! everywhere else: it is format hinting, not cryptographic validation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Interprets `value` as a UUID using the host platform's loose rules.
///
/// Accepted beyond the canonical hyphenated form: any hex case, no
/// hyphens, hyphens in arbitrary positions, surrounding braces, and
/// `urn:` / `uuid:` prefixes. Returns `None` when the remaining characters
/// are not exactly 32 hex digits.
pub fn normalize_uuid_like(value: &str) -> Option<Uuid> {
    let stripped = value.replace("urn:", "").replace("uuid:", "");
    let hex: String = stripped
        .trim_matches(|c| c == '{' || c == '}')
        .chars()
        .filter(|c| *c != '-')
        .collect();
    if hex.len() != 32 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Uuid::try_parse(&hex.to_ascii_lowercase()).ok()
}

/// Returns true if `value` is shaped like a UUID. See [`normalize_uuid_like`].
pub fn is_uuid_like(value: &str) -> bool {
    normalize_uuid_like(value).is_some()
}

/// How a provider entry names its resource provider.
///
/// Serialized as a single-key mapping, `{uuid: ...}` or `{name: ...}`,
/// which is exactly the document shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identification {
    /// Provider UUID as written by the operator.
    Uuid(String),
    /// Provider name.
    Name(String),
}

impl Identification {
    /// Returns the normalized UUID for UUID identification.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(raw) => normalize_uuid_like(raw),
            Self::Name(_) => None,
        }
    }

    /// Returns the name for name identification.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Uuid(_) => None,
        }
    }

    /// Returns the document key this identification uses.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Uuid(_) => "uuid",
            Self::Name(_) => "name",
        }
    }
}

impl std::fmt::Display for Identification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uuid(raw) => write!(f, "uuid:{raw}"),
            Self::Name(name) => write!(f, "name:{name}"),
        }
    }
}
