//! # Consumers Subcommand
//!
//! Checks a CHA document against the fields EAA and TCA read, and every
//! KPI against the non-negative rule.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use dhc_core::ContractKind;
use dhc_schema::{check_consumer, check_non_negative_kpis, load_document, Consumer, ConsumerIssue};
use serde::Serialize;

use crate::config::DhcConfig;
use crate::{OutputFormat, EXIT_INVALID, EXIT_OK};

/// Arguments for the `dhc consumers` subcommand.
#[derive(Args, Debug)]
pub struct ConsumersArgs {
    /// Document to check.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Check one consumer (eaa, tca). Both when omitted.
    #[arg(long)]
    pub consumer: Option<Consumer>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ConsumerReport {
    consumer: Consumer,
    issues: Vec<ConsumerIssue>,
}

#[derive(Debug, Serialize)]
struct Report {
    contract: ContractKind,
    consumers: Vec<ConsumerReport>,
    negative_kpis: Vec<ConsumerIssue>,
}

impl Report {
    fn passed(&self) -> bool {
        self.negative_kpis.is_empty() && self.consumers.iter().all(|c| c.issues.is_empty())
    }
}

/// Execute the consumers subcommand.
///
/// Returns exit code: 0 when every check passes, 2 otherwise.
pub fn run_consumers(args: &ConsumersArgs, _config: &DhcConfig) -> Result<u8> {
    let document = load_document(&args.file)?;
    let contract = ContractKind::detect(&document)
        .with_context(|| format!("cannot tell which contract {} follows", args.file.display()))?;

    let consumers: Vec<ConsumerReport> = if contract == ContractKind::ChaOutput {
        let selected = match args.consumer {
            Some(c) => vec![c],
            None => Consumer::ALL.to_vec(),
        };
        selected
            .into_iter()
            .map(|consumer| ConsumerReport {
                consumer,
                issues: check_consumer(&document, consumer),
            })
            .collect()
    } else {
        tracing::info!(contract = %contract, "consumer fields apply to CHA output only");
        Vec::new()
    };

    let report = Report {
        contract,
        consumers,
        negative_kpis: check_non_negative_kpis(&document, contract),
    };

    match args.format {
        OutputFormat::Text => print_report(&args.file, &report),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        ),
    }

    Ok(if report.passed() { EXIT_OK } else { EXIT_INVALID })
}

fn print_report(file: &std::path::Path, report: &Report) {
    for entry in &report.consumers {
        let name = entry.consumer.as_str().to_uppercase();
        if entry.issues.is_empty() {
            println!("PASS: {name} fields present in {}", file.display());
        } else {
            println!("FAIL: {name}: {} issue(s)", entry.issues.len());
            for issue in &entry.issues {
                println!("{issue}");
            }
        }
    }
    if report.negative_kpis.is_empty() {
        println!("PASS: all {} KPIs non-negative", report.contract);
    } else {
        println!("FAIL: {} negative KPI(s)", report.negative_kpis.len());
        for issue in &report.negative_kpis {
            println!("{issue}");
        }
    }
}
