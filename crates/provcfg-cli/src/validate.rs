//! # Validate Subcommand
//!
//! Validates provider configuration documents. Each path may be a file or a
//! directory; directories are searched recursively for `.yaml`, `.yml` and
//! `.json` files. Every file is reported, then the exit code summarizes.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use provcfg_core::FailureKind;
use provcfg_schema::{load_document, ProviderConfigError, ValidationMode, Validator};

use crate::{load_validator, EXIT_INVALID, EXIT_OK};

/// Arguments for the `provcfg validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Provider configuration files, or directories containing them.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Schema file to validate against instead of the packaged schema.
    #[arg(long, value_name = "SCHEMA", env = "PROVCFG_SCHEMA_PATH")]
    pub schema: Option<PathBuf>,

    /// Report every violation instead of stopping at the first.
    #[arg(long)]
    pub all_errors: bool,

    /// Print a JSON report instead of text.
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    fn mode(&self) -> ValidationMode {
        if self.all_errors {
            ValidationMode::CollectAll
        } else {
            ValidationMode::FailFast
        }
    }
}

/// Outcome of validating one file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorReport>,
}

/// One problem found in a file.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    /// JSON Pointer to the offending node; empty for the document root.
    pub path: String,
    pub message: String,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when every document is valid, 1 otherwise. A
/// schema that cannot be loaded is returned as an error.
pub fn run_validate(args: &ValidateArgs) -> Result<u8> {
    let validator = load_validator(args.schema.as_deref(), args.mode())?;

    let mut files = Vec::new();
    for path in &args.paths {
        if path.is_dir() {
            let found = find_documents(path);
            if found.is_empty() {
                tracing::warn!(dir = %path.display(), "no provider configuration files found");
            }
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        reports.push(validate_file(&validator, &file)?);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_text(&reports);
    }

    if reports.iter().all(|r| r.valid) {
        Ok(EXIT_OK)
    } else {
        Ok(EXIT_INVALID)
    }
}

/// Validate one file in the validator's configured mode. Document problems
/// become a failed report; only an unusable schema is an error.
pub fn validate_file(validator: &Validator, path: &Path) -> Result<FileReport> {
    let outcome =
        load_document(path).and_then(|document| validator.validate_configured(&document));
    let errors = match outcome {
        Ok(_) => Vec::new(),
        Err(ProviderConfigError::Invalid(failure)) => vec![ErrorReport {
            kind: Some(failure.kind),
            path: failure.path.to_pointer(),
            message: failure.message,
        }],
        Err(ProviderConfigError::Violations(violations)) => violations
            .into_inner()
            .into_iter()
            .map(|v| ErrorReport {
                kind: v.kind,
                path: v.instance_path,
                message: v.message,
            })
            .collect(),
        Err(ProviderConfigError::DocumentLoad { reason, .. }) => vec![ErrorReport {
            kind: None,
            path: String::new(),
            message: reason,
        }],
        Err(e @ ProviderConfigError::SchemaUnavailable { .. }) => return Err(e.into()),
    };

    tracing::debug!(path = %path.display(), errors = errors.len(), "validated");
    Ok(FileReport {
        path: path.to_path_buf(),
        valid: errors.is_empty(),
        errors,
    })
}

fn print_text(reports: &[FileReport]) {
    for report in reports {
        if report.valid {
            println!("OK: {}", report.path.display());
            continue;
        }
        println!("FAIL: {}", report.path.display());
        for error in &report.errors {
            let location = if error.path.is_empty() {
                "(root)"
            } else {
                error.path.as_str()
            };
            match error.kind {
                Some(kind) => println!("  {location}: [{kind}] {}", error.message),
                None => println!("  {location}: {}", error.message),
            }
        }
    }

    let failed = reports.iter().filter(|r| !r.valid).count();
    if failed > 0 {
        println!("\n{failed} of {} file(s) failed validation.", reports.len());
    }
}

/// Recursively find provider documents under `dir`, sorted.
fn find_documents(dir: &Path) -> Vec<PathBuf> {
    let mut results = Vec::new();
    walk_for_documents(dir, &mut results);
    results.sort();
    results
}

fn walk_for_documents(dir: &Path, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "failed to read directory");
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(
                    dir = %dir.display(),
                    error = %e,
                    "failed to read directory entry"
                );
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            walk_for_documents(&path, acc);
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml" | "yml" | "json")
        ) {
            acc.push(path);
        }
    }
}
