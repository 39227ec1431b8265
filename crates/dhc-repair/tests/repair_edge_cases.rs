//! Repair pipeline on legacy flags, unknown versions and LFA documents.

use std::path::Path;

use dhc_core::ContractKind;
use dhc_repair::{RepairPipeline, RepairStep};
use dhc_schema::SchemaValidator;
use serde_json::{json, Value};

fn fixture(name: &str) -> Value {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap()
}

fn hourly(base: f64) -> Vec<Value> {
    (0..8760).map(|h| json!(base + (h % 24) as f64)).collect()
}

#[test]
fn string_converged_flag_migrates_to_converged() {
    let validator = SchemaValidator::builtin().unwrap();
    let mut doc = fixture("cha_output_v1.json");
    doc["metadata"]["converged"] = json!("true");

    let outcome = RepairPipeline::new(&validator).run(doc, None).unwrap();
    assert!(outcome.is_valid(), "{}", outcome.repaired);
    assert_eq!(outcome.document["metadata"]["convergence_status"], "converged");
    assert!(outcome.document["metadata"].get("converged").is_none());
}

#[test]
fn unreadable_converged_flag_stays_invalid() {
    let validator = SchemaValidator::builtin().unwrap();
    let mut doc = fixture("cha_output_v1.json");
    doc["metadata"]["converged"] = json!("perhaps");

    let outcome = RepairPipeline::new(&validator).run(doc, None).unwrap();
    assert!(!outcome.is_valid());
    assert!(outcome.repaired.has_violation_at("metadata.convergence_status"));
    assert_eq!(outcome.document["metadata"]["converged"], "perhaps");
}

#[test]
fn unknown_schema_version_is_not_relabelled() {
    let validator = SchemaValidator::builtin().unwrap();
    let mut doc = fixture("cha_output_v2.json");
    doc["metadata"]["schema_version"] = json!("3.0.0");

    let outcome = RepairPipeline::new(&validator).run(doc, None).unwrap();
    assert!(!outcome.is_valid());
    assert_eq!(outcome.document["metadata"]["schema_version"], "3.0.0");
    assert!(outcome.repaired.has_violation_at("metadata.schema_version"));
    assert!(!outcome.actions.iter().any(|a| a.step == RepairStep::Migrate));
}

#[test]
fn lfa_document_is_repaired_end_to_end() {
    let validator = SchemaValidator::builtin().unwrap();
    let mut demand = hourly(40.0);
    demand[5] = json!("41.5");
    demand[8759] = json!(" 12 ");
    let doc = json!({
        "metadata": {
            "created_at": "2025-03-14T09:30:00Z",
            "cluster_id": "ST010_HEINRICH_ZILLE_STRASSE"
        },
        "timestep": { "start": "2023-01-01T00:00:00Z" },
        "series": { "demand_kw": demand },
        "quantiles": { "q10": hourly(30.0), "q50": hourly(40.0), "q90": hourly(50.0) }
    });

    let outcome = RepairPipeline::new(&validator).run(doc, None).unwrap();
    assert_eq!(outcome.contract, ContractKind::LfaDemand);
    assert!(!outcome.initial.is_valid());
    assert!(outcome.is_valid(), "{}", outcome.repaired);

    let repaired = &outcome.document;
    assert_eq!(repaired["timestep"]["resolution"], "1h");
    assert_eq!(repaired["metadata"]["schema_version"], "1.0.0");
    assert_eq!(repaired["series"]["demand_kw"][5], 41.5);
    assert_eq!(repaired["series"]["demand_kw"][8759], 12);

    let step_at = |path: &str| {
        outcome
            .actions
            .iter()
            .find(|a| a.path == path)
            .map(|a| a.step)
    };
    assert_eq!(step_at("timestep.resolution"), Some(RepairStep::InsertDefault));
    assert_eq!(step_at("series.demand_kw[5]"), Some(RepairStep::CoerceType));
    assert!(!outcome.actions.iter().any(|a| a.step == RepairStep::Migrate));
}

#[test]
fn lfa_non_numeric_hour_is_reported() {
    let validator = SchemaValidator::builtin().unwrap();
    let mut demand = hourly(40.0);
    demand[100] = json!("n/a");
    let doc = json!({
        "metadata": {
            "schema_version": "1.0.0",
            "created_at": "2025-03-14T09:30:00Z",
            "cluster_id": "c1"
        },
        "timestep": { "start": "2023-01-01T00:00:00Z", "resolution": "1h" },
        "series": { "demand_kw": demand },
        "quantiles": { "q10": hourly(30.0), "q50": hourly(40.0), "q90": hourly(50.0) }
    });

    let outcome = RepairPipeline::new(&validator)
        .run(doc, Some(ContractKind::LfaDemand))
        .unwrap();
    assert!(!outcome.is_valid());
    assert!(outcome.repaired.has_violation_at("series.demand_kw[100]"));
    assert!(outcome.actions.is_empty(), "{:?}", outcome.actions);
}
