//! # Default Insertion
//!
//! Fills fields a producer left out when the contract has an unambiguous
//! value for them. Present values are never overwritten, including present
//! values that are wrong; those are for validation to report.
//!
//! | Contract | Field | Default |
//! |----------|-------|---------|
//! | all | `metadata.schema_version` | current contract version |
//! | CHA | `units.{length,pressure,temperature,power}` | `m`, `bar`, `degC`, `kW` |
//! | CHA | `crs.epsg`, `crs.name` | configured EPSG (25833, ETRS89 / UTM zone 33N) |
//! | CHA | `compliance.checks` | `[]` |
//! | CHA | `compliance.overall_status` | worst check status, `not_evaluated` without checks |
//! | LFA | `timestep.resolution` | `1h` |

use dhc_core::{ComplianceStatus, ContractKind, FieldPath};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::action::{RepairAction, RepairStep};

/// EPSG code for ETRS89 / UTM zone 33N.
pub const DEFAULT_CRS_EPSG: u32 = 25833;

const DEFAULT_UNITS: &[(&str, &str)] = &[
    ("units.length", "m"),
    ("units.pressure", "bar"),
    ("units.temperature", "degC"),
    ("units.power", "kW"),
];

/// Configurable default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultValues {
    pub crs_epsg: u32,
    /// Written only alongside an inserted `crs.epsg`.
    pub crs_name: Option<String>,
}

impl Default for DefaultValues {
    fn default() -> Self {
        Self {
            crs_epsg: DEFAULT_CRS_EPSG,
            crs_name: Some("ETRS89 / UTM zone 33N".to_string()),
        }
    }
}

struct Filler<'d> {
    document: &'d mut Value,
    actions: Vec<RepairAction>,
}

impl Filler<'_> {
    /// Set `path` to `value` unless it already exists. Returns whether the
    /// value was inserted.
    fn fill(&mut self, path: &str, value: Value, reason: &str) -> bool {
        let path = match FieldPath::parse(path) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("{e}");
                return false;
            }
        };
        if path.exists(self.document) {
            return false;
        }
        if let Err(e) = path.set(self.document, value.clone()) {
            tracing::warn!(path = %path, "default not inserted: {e}");
            return false;
        }
        self.actions.push(RepairAction::new(
            RepairStep::InsertDefault,
            &path,
            None,
            Some(value),
            reason,
        ));
        true
    }
}

/// Worst status among `compliance.checks[].status`, ignoring values that
/// are not compliance statuses.
fn aggregate_checks(document: &Value) -> ComplianceStatus {
    let statuses = document
        .pointer("/compliance/checks")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|check| check.get("status")?.as_str()?.parse::<ComplianceStatus>().ok());
    ComplianceStatus::aggregate(statuses)
}

/// Insert the defaults of `kind` that `document` lacks.
pub fn insert_defaults(
    document: &mut Value,
    kind: ContractKind,
    defaults: &DefaultValues,
) -> Vec<RepairAction> {
    if !document.is_object() {
        return Vec::new();
    }
    let mut filler = Filler {
        document,
        actions: Vec::new(),
    };

    filler.fill(
        "metadata.schema_version",
        json!(kind.current_version().to_string()),
        "current contract version",
    );

    match kind {
        ContractKind::ChaOutput => {
            for (path, unit) in DEFAULT_UNITS {
                filler.fill(path, json!(unit), "default unit");
            }
            if filler.fill("crs.epsg", json!(defaults.crs_epsg), "default coordinate reference system") {
                if let Some(name) = &defaults.crs_name {
                    filler.fill("crs.name", json!(name), "name of default coordinate reference system");
                }
            }
            filler.fill("compliance.checks", json!([]), "no compliance checks reported");
            let overall = aggregate_checks(filler.document);
            filler.fill(
                "compliance.overall_status",
                json!(overall.as_str()),
                "aggregated from check statuses",
            );
        }
        ContractKind::LfaDemand => {
            filler.fill("timestep.resolution", json!("1h"), "hourly series");
        }
        ContractKind::KpiSummary => {}
    }

    for action in &filler.actions {
        tracing::debug!(path = %action.path, "inserted default");
    }
    filler.actions
}
