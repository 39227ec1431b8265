//! # Fields Subcommand
//!
//! Reports which dotted paths resolve in a document, for checking that a
//! producer emits what a downstream reader expects.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dhc_core::{missing_fields, FieldPath};
use dhc_schema::load_document;

use crate::config::DhcConfig;
use crate::{EXIT_INVALID, EXIT_OK};

/// Arguments for the `dhc fields` subcommand.
#[derive(Args, Debug)]
pub struct FieldsArgs {
    /// Document to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Dotted paths (`kpis.hydraulic.pump_power_kw`, `pipes[0].id`).
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

/// Execute the fields subcommand.
///
/// Returns exit code: 0 when every path resolves, 2 otherwise.
pub fn run_fields(args: &FieldsArgs, _config: &DhcConfig) -> Result<u8> {
    let document = load_document(&args.file)?;
    let requested: Vec<&str> = args.paths.iter().map(String::as_str).collect();

    for path in &requested {
        match FieldPath::parse(path) {
            Ok(parsed) => match parsed.lookup(&document) {
                Some(value) => println!("  OK      {path} = {value}"),
                None => println!("  MISSING {path}"),
            },
            Err(e) => println!("  INVALID {path}: {e}"),
        }
    }

    let missing = missing_fields(&document, &requested);
    println!(
        "{}/{} field(s) present in {}",
        requested.len() - missing.len(),
        requested.len(),
        args.file.display()
    );
    Ok(if missing.is_empty() { EXIT_OK } else { EXIT_INVALID })
}
