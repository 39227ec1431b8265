//! # Validate Subcommand
//!
//! Validates one document against its contract and prints every violation
//! with its dotted path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dhc_core::ContractKind;
use dhc_schema::{load_document, ValidationReport};

use crate::config::DhcConfig;
use crate::{OutputFormat, EXIT_INVALID, EXIT_OK};

/// Arguments for the `dhc validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to validate (JSON, or YAML by extension).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Contract to validate against (cha, kpi, lfa). Inferred when omitted.
    #[arg(long)]
    pub contract: Option<ContractKind>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Validate against the schemas in this directory instead of the
    /// embedded contracts.
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when valid, 2 when invalid.
pub fn run_validate(args: &ValidateArgs, config: &DhcConfig) -> Result<u8> {
    let validator = config.validator(args.schema_dir.as_deref())?;
    let document = load_document(&args.file)?;
    let report = validator
        .validate_detected(&document, args.contract, &args.file.display().to_string())
        .with_context(|| format!("failed to validate {}", args.file.display()))?;

    match args.format {
        OutputFormat::Text => print_report(&args.file, &report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        ),
    }

    Ok(if report.is_valid() { EXIT_OK } else { EXIT_INVALID })
}

/// Print a report as `PASS`/`FAIL` plus one line per violation.
pub fn print_report(file: &Path, report: &ValidationReport) {
    if report.is_valid() {
        println!("PASS: {} ({})", file.display(), report.schema);
        return;
    }
    println!(
        "FAIL: {} ({}): {} violation(s)",
        file.display(),
        report.schema,
        report.violations.len()
    );
    println!("{report}");
}
