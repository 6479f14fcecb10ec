//! # Schema Subcommand
//!
//! Prints what the loaded provider schema accepts.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use provcfg_schema::{ExtensionRules, ProviderSchema, ValidationMode};

use crate::{load_validator, EXIT_OK};

/// Arguments for the `provcfg schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Schema file to describe instead of the packaged schema.
    #[arg(long, value_name = "SCHEMA", env = "PROVCFG_SCHEMA_PATH")]
    pub schema: Option<PathBuf>,

    /// Print the summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Summary of a compiled provider schema.
#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub schema_version: String,
    pub version_pattern: String,
    pub uuid_format: String,
    pub name_min_length: usize,
    pub inventories: ExtensionSummary,
    pub traits: ExtensionSummary,
    pub formats: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtensionSummary {
    pub known: Vec<String>,
    pub custom_patterns: Vec<String>,
}

impl From<&ExtensionRules> for ExtensionSummary {
    fn from(rules: &ExtensionRules) -> Self {
        Self {
            known: rules.known_keys().map(str::to_string).collect(),
            custom_patterns: rules.custom_patterns().map(str::to_string).collect(),
        }
    }
}

impl From<&ProviderSchema> for SchemaSummary {
    fn from(schema: &ProviderSchema) -> Self {
        let identification = schema.identification();
        Self {
            schema_version: schema.version().to_string(),
            version_pattern: schema.version_pattern().as_str().to_string(),
            uuid_format: identification.uuid_format.clone(),
            name_min_length: identification.name_min_length,
            inventories: schema.inventories().into(),
            traits: schema.traits().into(),
            formats: schema.format_names().map(str::to_string).collect(),
        }
    }
}

/// Execute the schema subcommand.
pub fn run_schema(args: &SchemaArgs) -> Result<u8> {
    let validator = load_validator(args.schema.as_deref(), ValidationMode::default())?;
    let summary = SchemaSummary::from(validator.schema());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_text(&summary));
    }
    Ok(EXIT_OK)
}

fn render_text(summary: &SchemaSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Schema version: {}\n", summary.schema_version));
    out.push_str(&format!("meta.schema_version pattern: {}\n", summary.version_pattern));
    out.push_str(&format!(
        "identification: uuid ({} format) or name (min length {})\n",
        summary.uuid_format, summary.name_min_length
    ));
    for (label, ext) in [("Resource classes", &summary.inventories), ("Traits", &summary.traits)] {
        out.push_str(&format!("{label}: {} known\n", ext.known.len()));
        for key in &ext.known {
            out.push_str(&format!("  {key}\n"));
        }
        out.push_str(&format!("  custom: {}\n", ext.custom_patterns.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_packaged_schema() {
        let validator = load_validator(None, ValidationMode::default()).unwrap();
        let summary = SchemaSummary::from(validator.schema());
        assert_eq!(summary.schema_version, "1.0");
        assert_eq!(summary.uuid_format, "uuid");
        assert_eq!(summary.name_min_length, 1);
        assert!(summary.inventories.known.iter().any(|k| k == "VCPU"));
        assert!(summary.traits.known.iter().any(|k| k == "HW_CPU_X86_AVX2"));
        assert_eq!(summary.traits.custom_patterns, vec!["^CUSTOM_[A-Z0-9_]+$".to_string()]);
        assert_eq!(summary.formats, vec!["uuid".to_string()]);
    }

    #[test]
    fn render_text_lists_identifiers() {
        let validator = load_validator(None, ValidationMode::default()).unwrap();
        let text = render_text(&SchemaSummary::from(validator.schema()));
        assert!(text.starts_with("Schema version: 1.0\n"));
        assert!(text.contains("  MEMORY_MB\n"));
        assert!(text.contains("custom: ^CUSTOM_[A-Z0-9_]+$"));
    }

    #[test]
    fn run_schema_exits_zero() {
        let args = SchemaArgs { schema: None, json: true };
        assert_eq!(run_schema(&args).unwrap(), EXIT_OK);
    }
}
