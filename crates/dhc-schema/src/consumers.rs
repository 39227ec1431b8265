//! # Downstream Consumer Requirements
//!
//! Schema validity is necessary but not sufficient for the integration
//! code that reads CHA output. EAA and TCA pick specific KPI fields by
//! dotted path and treat them as non-negative quantities, some of which
//! (`kpis.network.*`) the schema leaves optional. This module checks a
//! document against those expectations directly.

use dhc_core::{ContractKind, FieldPath};
use serde::Serialize;
use serde_json::Value;

/// A downstream reader of CHA output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Consumer {
    Eaa,
    Tca,
}

impl Consumer {
    pub const ALL: &'static [Consumer] = &[Self::Eaa, Self::Tca];

    /// Dotted CHA paths this consumer reads.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Eaa => &[
                "kpis.hydraulic.max_velocity_ms",
                "kpis.hydraulic.max_pressure_drop_pa_per_m",
                "kpis.hydraulic.pump_power_kw",
                "kpis.thermal.total_heat_loss_kw",
                "kpis.thermal.heat_loss_percent",
            ],
            Self::Tca => &[
                "kpis.thermal.total_heat_loss_kw",
                "kpis.hydraulic.pump_power_kw",
                "kpis.network.total_length_m",
                "kpis.network.n_consumers",
            ],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eaa => "eaa",
            Self::Tca => "tca",
        }
    }
}

impl std::fmt::Display for Consumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Consumer {
    type Err = dhc_core::DhcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eaa" => Ok(Self::Eaa),
            "tca" => Ok(Self::Tca),
            _ => Err(dhc_core::DhcError::UnknownEnumValue {
                field: "consumer",
                value: s.to_string(),
                expected: "eaa, tca".to_string(),
            }),
        }
    }
}

/// What is wrong with a field a consumer reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    NotNumeric,
    Negative,
}

/// A field that does not meet a consumer's expectation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerIssue {
    /// Dotted path.
    pub path: String,
    pub kind: IssueKind,
    /// The offending value, when one is present.
    pub found: Option<Value>,
}

impl std::fmt::Display for ConsumerIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.kind, &self.found) {
            (IssueKind::Missing, _) => write!(f, "  {}: missing", self.path),
            (IssueKind::NotNumeric, Some(v)) => write!(f, "  {}: not a number ({v})", self.path),
            (IssueKind::Negative, Some(v)) => write!(f, "  {}: negative ({v})", self.path),
            (kind, None) => write!(f, "  {}: {kind:?}", self.path),
        }
    }
}

fn check_value(path: &str, value: Option<&Value>) -> Option<ConsumerIssue> {
    let issue = |kind, found: Option<&Value>| ConsumerIssue {
        path: path.to_string(),
        kind,
        found: found.cloned(),
    };
    match value {
        None => Some(issue(IssueKind::Missing, None)),
        Some(v) => match v.as_f64() {
            None => Some(issue(IssueKind::NotNumeric, Some(v))),
            Some(n) if n < 0.0 => Some(issue(IssueKind::Negative, Some(v))),
            Some(_) => None,
        },
    }
}

/// Check every field `consumer` reads: present, numeric, non-negative.
pub fn check_consumer(document: &Value, consumer: Consumer) -> Vec<ConsumerIssue> {
    let issues: Vec<ConsumerIssue> = consumer
        .required_fields()
        .iter()
        .filter_map(|path| {
            let value = FieldPath::parse(path).ok().and_then(|p| p.lookup(document));
            check_value(path, value)
        })
        .collect();
    if !issues.is_empty() {
        tracing::info!(consumer = %consumer, issues = issues.len(), "consumer requirements not met");
    }
    issues
}

/// KPI sections of each contract whose numeric leaves must be non-negative.
fn kpi_sections(kind: ContractKind) -> &'static [&'static str] {
    match kind {
        ContractKind::ChaOutput => &["kpis"],
        ContractKind::KpiSummary => &["economic", "technical", "environmental"],
        ContractKind::LfaDemand => &["summary"],
    }
}

/// Every numeric leaf under the KPI sections of `kind` must be `>= 0`.
///
/// Temperatures (keys ending in `temperature_c`) are exempt. Absent
/// sections are not reported; that is the schema's job.
pub fn check_non_negative_kpis(document: &Value, kind: ContractKind) -> Vec<ConsumerIssue> {
    let mut issues = Vec::new();
    for section in kpi_sections(kind) {
        let path = FieldPath::root().child(section);
        if let Some(value) = path.lookup(document) {
            collect_negative(value, &path, &mut issues);
        }
    }
    issues
}

fn collect_negative(value: &Value, path: &FieldPath, issues: &mut Vec<ConsumerIssue>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key.ends_with("temperature_c") {
                    continue;
                }
                collect_negative(child, &path.child(key), issues);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_negative(child, &path.index(i), issues);
            }
        }
        Value::Number(n) if n.as_f64().is_some_and(|f| f < 0.0) => issues.push(ConsumerIssue {
            path: path.to_string(),
            kind: IssueKind::Negative,
            found: Some(value.clone()),
        }),
        _ => {}
    }
}
