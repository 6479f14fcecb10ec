//! # Schema Versions
//!
//! Configuration documents and schema assets both declare a
//! `<major>.<minor>` version. Which document versions a schema reads is
//! decided by the schema's version pattern alone.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A `<major>.<minor>` version identifier such as `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    major: u32,
    minor: u32,
}

impl SchemaVersion {
    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Major component.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor component.
    pub fn minor(&self) -> u32 {
        self.minor
    }
}

fn parse_component(component: &str, original: &str) -> Result<u32, CoreError> {
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::InvalidVersion(format!(
            "{original:?} is not of the form <major>.<minor>"
        )));
    }
    // All-digit components that overflow saturate, so any version the schema
    // pattern accepts also parses.
    Ok(component.parse().unwrap_or(u32::MAX))
}

impl FromStr for SchemaVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').ok_or_else(|| {
            CoreError::InvalidVersion(format!("{s:?} is not of the form <major>.<minor>"))
        })?;
        Ok(Self {
            major: parse_component(major, s)?,
            minor: parse_component(minor, s)?,
        })
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(version: SchemaVersion) -> Self {
        version.to_string()
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let v: SchemaVersion = "1.0".parse().unwrap();
        assert_eq!(v, SchemaVersion::new(1, 0));
        let v: SchemaVersion = "1.12".parse().unwrap();
        assert_eq!(v.major(), 1);
        assert_eq!(v.minor(), 12);
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "1", "1.", ".1", "!@#", "1.0.0", "a.b", "+1.0", "1.-1"] {
            assert!(bad.parse::<SchemaVersion>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_display_roundtrip() {
        let v = SchemaVersion::new(2, 7);
        assert_eq!(v.to_string(), "2.7");
        assert_eq!(v.to_string().parse::<SchemaVersion>().unwrap(), v);
    }

    #[test]
    fn test_serde_as_string() {
        let v = SchemaVersion::new(1, 3);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"1.3\"");
        let parsed: SchemaVersion = serde_json::from_str("\"1.3\"").unwrap();
        assert_eq!(parsed, v);
        assert!(serde_json::from_str::<SchemaVersion>("\"x\"").is_err());
    }

    #[test]
    fn test_oversized_component_saturates() {
        let v: SchemaVersion = "1.99999999999".parse().unwrap();
        assert_eq!(v, SchemaVersion::new(1, u32::MAX));
        let v: SchemaVersion = "4294967296.0".parse().unwrap();
        assert_eq!(v.major(), u32::MAX);
    }
}
