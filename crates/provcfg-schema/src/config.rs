//! Validator configuration.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::SchemaSource;

/// How much of an invalid document to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationMode {
    /// Stop at the first failure.
    #[default]
    FailFast,
    /// Report every violation.
    CollectAll,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FailFast => "fail-fast",
            Self::CollectAll => "collect-all",
        })
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fail-fast" => Ok(Self::FailFast),
            "collect-all" => Ok(Self::CollectAll),
            other => Err(format!("unknown validation mode: {other}")),
        }
    }
}

/// Where the schema comes from and how documents are checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    pub source: SchemaSource,
    pub mode: ValidationMode,
}

impl ValidatorConfig {
    /// Read the schema from `path` instead of the packaged asset.
    pub fn with_schema_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = SchemaSource::File(path.into());
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }
}
