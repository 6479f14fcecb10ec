//! # provcfg-cli: Provider Configuration Command-Line Interface
//!
//! ## Subcommands
//!
//! - `provcfg validate <PATH>...` validates files, or every `.yaml`,
//!   `.yml` and `.json` file under a directory.
//! - `provcfg schema` prints the schema version, the version pattern, the
//!   known resource classes and traits, and the custom naming patterns.
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | every document is valid |
//! | 1 | at least one document is invalid or unreadable |
//! | 2 | the schema could not be loaded |
//!
//! ```bash
//! provcfg validate /etc/provcfg/providers.d/
//! provcfg validate --all-errors --json compute.yaml
//! PROVCFG_SCHEMA_PATH=./schema.yaml provcfg schema
//! ```

pub mod schema;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use provcfg_schema::{ValidationMode, Validator, ValidatorConfig};

pub const EXIT_OK: u8 = 0;
pub const EXIT_INVALID: u8 = 1;
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;

/// Build a validator over `schema`, or over the packaged schema when `None`,
/// checking documents in `mode`.
pub fn load_validator(schema: Option<&Path>, mode: ValidationMode) -> Result<Validator> {
    let config = match schema {
        Some(path) => ValidatorConfig::default().with_schema_file(path),
        None => ValidatorConfig::default(),
    }
    .with_mode(mode);
    let validator = Validator::from_config(&config)
        .with_context(|| format!("failed to load provider schema from {}", config.source))?;
    tracing::info!(
        source = %config.source,
        schema_version = %validator.schema().version(),
        mode = %validator.mode(),
        "loaded provider schema"
    );
    Ok(validator)
}
