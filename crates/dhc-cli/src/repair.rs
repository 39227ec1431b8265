//! # Repair Subcommand
//!
//! Runs the repair pipeline on one document. The repaired document goes to
//! `--out`, back into the input with `--in-place`, or to stdout; the list of
//! changes and the final verdict go to stderr so stdout stays a document.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dhc_core::ContractKind;
use dhc_schema::load_document;

use crate::config::DhcConfig;
use crate::{emit_document, write_document, EXIT_INVALID, EXIT_OK};

/// Arguments for the `dhc repair` subcommand.
#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Document to repair.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Contract of the document (cha, kpi, lfa). Inferred when omitted.
    #[arg(long)]
    pub contract: Option<ContractKind>,

    /// Write the repaired document here.
    #[arg(long, value_name = "FILE", conflicts_with = "in_place")]
    pub out: Option<PathBuf>,

    /// Overwrite the input file.
    #[arg(long)]
    pub in_place: bool,

    /// Repair against the schemas in this directory.
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,
}

/// Execute the repair subcommand.
///
/// Returns exit code: 0 when the repaired document is valid, 2 otherwise.
/// The repaired document is written either way.
pub fn run_repair(args: &RepairArgs, config: &DhcConfig) -> Result<u8> {
    let validator = config.validator(args.schema_dir.as_deref())?;
    let document = load_document(&args.file)?;
    let outcome = config
        .pipeline(&validator)
        .run(document, args.contract)
        .with_context(|| format!("failed to repair {}", args.file.display()))?;

    if outcome.changed() {
        eprintln!("{} repair(s) to {}:", outcome.actions.len(), args.file.display());
        for action in &outcome.actions {
            eprintln!("{action}");
        }
    } else {
        eprintln!("No repairs needed for {}", args.file.display());
    }

    if args.in_place {
        if outcome.changed() {
            write_document(&args.file, &outcome.document)?;
        }
    } else {
        emit_document(args.out.as_deref(), &outcome.document)?;
    }

    if outcome.is_valid() {
        eprintln!("PASS: repaired document is valid ({})", outcome.repaired.schema);
        Ok(EXIT_OK)
    } else {
        eprintln!(
            "FAIL: {} violation(s) remain after repair:",
            outcome.repaired.violations.len()
        );
        eprintln!("{}", outcome.repaired);
        Ok(EXIT_INVALID)
    }
}
