//! # Schema Lint
//!
//! Checks on the contract documents themselves, run before anything is
//! validated against them.
//!
//! ## Structural checks ([`lint_schema`])
//!
//! Every contract must carry `$schema`, `$id`, `type`, `properties` and a
//! `version` annotation. `$schema` should name draft-07 and `$id` should end
//! with the schema's filename. Anywhere in the schema, a `required` entry
//! must name a property declared next to it, and file-relative `$ref`s must
//! point at a schema that is actually loaded.
//!
//! ## Enum bindings ([`check_enum_bindings`])
//!
//! The closed value sets in `dhc-core` are hand-written mirrors of schema
//! `enum` keywords. [`ENUM_BINDINGS`] lists where each one lives; the check
//! fails when a schema and its Rust enum drift apart.

use std::collections::BTreeSet;

use dhc_core::{
    ComplianceStatus, ContractKind, ConvergenceStatus, NodeType, PipeCircuit, PreferredOption,
    SchemaVersion,
};
use serde::Serialize;
use serde_json::Value;

use crate::validate::SchemaValidator;

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema";

/// How bad a lint finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LintSeverity {
    Warning,
    Error,
}

/// One problem found in a schema document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    /// Schema filename.
    pub schema: String,
    /// JSON Pointer into the schema.
    pub pointer: String,
    pub severity: LintSeverity,
    pub message: String,
}

impl std::fmt::Display for LintFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            LintSeverity::Warning => "warning",
            LintSeverity::Error => "error",
        };
        let pointer = if self.pointer.is_empty() { "(root)" } else { &self.pointer };
        write!(f, "  {level}: {} {pointer}: {}", self.schema, self.message)
    }
}

struct Findings<'a> {
    schema: &'a str,
    items: Vec<LintFinding>,
}

impl Findings<'_> {
    fn push(&mut self, pointer: &str, severity: LintSeverity, message: impl Into<String>) {
        self.items.push(LintFinding {
            schema: self.schema.to_string(),
            pointer: pointer.to_string(),
            severity,
            message: message.into(),
        });
    }
}

/// Lint one schema document.
///
/// `known_schemas` are the filenames a file-relative `$ref` may point at;
/// pass an empty slice to skip the `$ref` check.
pub fn lint_schema(filename: &str, schema: &Value, known_schemas: &[&str]) -> Vec<LintFinding> {
    let mut findings = Findings {
        schema: filename,
        items: Vec::new(),
    };

    let Some(root) = schema.as_object() else {
        findings.push("", LintSeverity::Error, "schema is not a JSON object");
        return findings.items;
    };

    match root.get("$schema").and_then(Value::as_str) {
        None => findings.push("", LintSeverity::Error, "missing \"$schema\""),
        Some(uri) if !uri.trim_end_matches('#').eq(DRAFT_07) => findings.push(
            "/$schema",
            LintSeverity::Warning,
            format!("expected draft-07, found {uri:?}"),
        ),
        Some(_) => {}
    }

    match root.get("$id").and_then(Value::as_str) {
        None => findings.push("", LintSeverity::Error, "missing \"$id\""),
        Some(id) if !id.trim_end_matches('#').ends_with(filename) => findings.push(
            "/$id",
            LintSeverity::Warning,
            format!("$id {id:?} does not end with the filename"),
        ),
        Some(_) => {}
    }

    if !root.contains_key("type") {
        findings.push("", LintSeverity::Error, "missing \"type\"");
    }
    if !root.get("properties").is_some_and(Value::is_object) {
        findings.push("", LintSeverity::Error, "missing \"properties\" object");
    }

    match root.get("version").and_then(Value::as_str) {
        None => findings.push("", LintSeverity::Warning, "missing \"version\" annotation"),
        Some(v) => {
            if let Err(e) = SchemaVersion::parse(v) {
                findings.push("/version", LintSeverity::Error, e.to_string());
            }
        }
    }

    walk(schema, "", known_schemas, &mut findings);
    findings.items
}

/// Recursive checks on every subschema.
fn walk(node: &Value, pointer: &str, known_schemas: &[&str], findings: &mut Findings<'_>) {
    let Some(obj) = node.as_object() else {
        return;
    };

    if let Some(required) = obj.get("required").and_then(Value::as_array) {
        let declared: BTreeSet<&str> = obj
            .get("properties")
            .and_then(Value::as_object)
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default();
        for name in required.iter().filter_map(Value::as_str) {
            if !declared.contains(name) {
                findings.push(
                    &format!("{pointer}/required"),
                    LintSeverity::Error,
                    format!("required property {name:?} is not declared in \"properties\""),
                );
            }
        }
    }

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        let target = reference.split('#').next().unwrap_or("");
        if !target.is_empty() && !known_schemas.is_empty() {
            let filename = target.rsplit('/').next().unwrap_or(target);
            if !known_schemas.contains(&filename) {
                findings.push(
                    &format!("{pointer}/$ref"),
                    LintSeverity::Error,
                    format!("$ref target {filename:?} is not loaded"),
                );
            }
        }
    }

    for keyword in ["properties", "definitions"] {
        if let Some(children) = obj.get(keyword).and_then(Value::as_object) {
            for (name, child) in children {
                walk(child, &format!("{pointer}/{keyword}/{name}"), known_schemas, findings);
            }
        }
    }
    if let Some(items) = obj.get("items") {
        walk(items, &format!("{pointer}/items"), known_schemas, findings);
    }
}

/// Lint every schema loaded in `validator`, sorted by schema then pointer.
pub fn lint_all(validator: &SchemaValidator) -> Vec<LintFinding> {
    let names = validator.schema_names();
    let mut findings: Vec<LintFinding> = names
        .iter()
        .filter_map(|name| validator.get_schema(name).map(|schema| (name, schema)))
        .flat_map(|(name, schema)| lint_schema(name, schema, &names))
        .collect();
    findings.extend(check_enum_bindings(validator));
    findings.sort_by(|a, b| (&a.schema, &a.pointer).cmp(&(&b.schema, &b.pointer)));
    findings
}

/// Where a `dhc-core` value set appears in a contract.
#[derive(Debug, Clone, Copy)]
pub struct EnumBinding {
    pub contract: ContractKind,
    /// JSON Pointer to the `enum` array inside the schema.
    pub pointer: &'static str,
    /// Canonical values, as `dhc-core` spells them.
    pub values: fn() -> Vec<&'static str>,
}

/// Every schema `enum` mirrored by a Rust value set.
pub const ENUM_BINDINGS: &[EnumBinding] = &[
    EnumBinding {
        contract: ContractKind::ChaOutput,
        pointer: "/properties/metadata/properties/convergence_status/enum",
        values: ConvergenceStatus::canonical_values,
    },
    EnumBinding {
        contract: ContractKind::ChaOutput,
        pointer: "/properties/compliance/properties/overall_status/enum",
        values: ComplianceStatus::canonical_values,
    },
    EnumBinding {
        contract: ContractKind::ChaOutput,
        pointer: "/properties/compliance/properties/checks/items/properties/status/enum",
        values: check_status_values,
    },
    EnumBinding {
        contract: ContractKind::ChaOutput,
        pointer: "/properties/pipes/items/properties/circuit/enum",
        values: PipeCircuit::canonical_values,
    },
    EnumBinding {
        contract: ContractKind::ChaOutput,
        pointer: "/properties/nodes/items/properties/node_type/enum",
        values: NodeType::canonical_values,
    },
    EnumBinding {
        contract: ContractKind::KpiSummary,
        pointer: "/properties/recommendation/properties/preferred_option/enum",
        values: PreferredOption::canonical_values,
    },
];

// Individual checks can't be `not_evaluated`.
fn check_status_values() -> Vec<&'static str> {
    ComplianceStatus::ALL
        .iter()
        .filter(|s| **s != ComplianceStatus::NotEvaluated)
        .map(|s| s.as_str())
        .collect()
}

/// Compare each [`ENUM_BINDINGS`] entry with the loaded schema.
///
/// Contracts that are not loaded are skipped.
pub fn check_enum_bindings(validator: &SchemaValidator) -> Vec<LintFinding> {
    let mut findings = Vec::new();
    for binding in ENUM_BINDINGS {
        let filename = binding.contract.schema_file();
        let Some(schema) = validator.get_schema(filename) else {
            continue;
        };
        let expected: Vec<&str> = (binding.values)();
        let actual: Option<Vec<&str>> = schema
            .pointer(binding.pointer)
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_str).collect());

        let message = match actual {
            None => Some("enum is missing".to_string()),
            Some(actual) if actual != expected => Some(format!(
                "enum {actual:?} does not match value set {expected:?}"
            )),
            Some(_) => None,
        };
        if let Some(message) = message {
            findings.push(LintFinding {
                schema: filename.to_string(),
                pointer: binding.pointer.to_string(),
                severity: LintSeverity::Error,
                message,
            });
        }
    }
    findings
}
