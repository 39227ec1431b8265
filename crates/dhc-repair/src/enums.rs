//! # Enum Normalization
//!
//! Maps off-contract spellings onto the members of a schema `enum`.
//!
//! Matching works on a normalized token: trimmed, lowercased, with `-` and
//! spaces folded to `_`. A value whose token equals the token of an allowed
//! member is a case variant and maps to that member (`"Plant"` → `plant`,
//! `"KW"` → `kW`). Otherwise the synonym table for the field is consulted
//! (`"Vorlauf"` → `supply`). A synonym is only applied when its target is
//! one of the schema's members at that location, so a table entry can never
//! introduce a value the contract rejects.
//!
//! Synonyms are keyed by the field's member name (`convergence_status`,
//! `status`, `circuit`). Booleans under an enum are looked up as `"true"`
//! and `"false"`.

use std::collections::BTreeMap;

use dhc_core::FieldPath;
use dhc_schema::SchemaValidator;
use serde_json::Value;

use crate::action::{RepairAction, RepairStep};
use crate::walk::SchemaWalk;

/// Built-in synonyms, per field. Keys are normalized tokens.
const BUILTIN_SYNONYMS: &[(&str, &[(&str, &str)])] = &[
    (
        "convergence_status",
        &[
            ("success", "converged"),
            ("succeeded", "converged"),
            ("ok", "converged"),
            ("true", "converged"),
            ("max_iter", "max_iterations"),
            ("maxiter", "max_iterations"),
            ("max_iter_reached", "max_iterations"),
            ("iteration_limit", "max_iterations"),
            ("error", "failed"),
            ("failure", "failed"),
            ("diverged", "failed"),
            ("not_converged", "failed"),
            ("false", "failed"),
        ],
    ),
    (
        "status",
        &[
            ("ok", "pass"),
            ("passed", "pass"),
            ("success", "pass"),
            ("true", "pass"),
            ("warn", "warning"),
            ("warnings", "warning"),
            ("failed", "fail"),
            ("failure", "fail"),
            ("error", "fail"),
            ("false", "fail"),
        ],
    ),
    (
        "overall_status",
        &[
            ("ok", "pass"),
            ("passed", "pass"),
            ("success", "pass"),
            ("warn", "warning"),
            ("warnings", "warning"),
            ("failed", "fail"),
            ("failure", "fail"),
            ("error", "fail"),
            ("n/a", "not_evaluated"),
            ("na", "not_evaluated"),
            ("none", "not_evaluated"),
            ("skipped", "not_evaluated"),
            ("not_checked", "not_evaluated"),
        ],
    ),
    (
        "circuit",
        &[
            ("flow", "supply"),
            ("forward", "supply"),
            ("feed", "supply"),
            ("vorlauf", "supply"),
            ("ruecklauf", "return"),
            ("rücklauf", "return"),
            ("backward", "return"),
            ("back", "return"),
        ],
    ),
    (
        "node_type",
        &[
            ("building", "consumer"),
            ("house", "consumer"),
            ("customer", "consumer"),
            ("substation", "consumer"),
            ("sink", "consumer"),
            ("source", "plant"),
            ("heat_source", "plant"),
            ("producer", "plant"),
            ("node", "junction"),
            ("joint", "junction"),
        ],
    ),
    (
        "preferred_option",
        &[
            ("dh", "district_heating"),
            ("district", "district_heating"),
            ("hp", "heat_pump"),
            ("none", "undecided"),
            ("unknown", "undecided"),
        ],
    ),
    (
        "temperature",
        &[
            ("celsius", "degC"),
            ("°c", "degC"),
            ("deg_c", "degC"),
            ("c", "degC"),
            ("kelvin", "K"),
        ],
    ),
    ("pressure", &[("pascal", "Pa")]),
    ("power", &[("watt", "W"), ("kilowatt", "kW")]),
    ("length", &[("meter", "m"), ("metre", "m"), ("meters", "m")]),
    ("resolution", &[("hourly", "1h"), ("1_h", "1h"), ("60min", "1h"), ("h", "1h")]),
];

/// Fold a raw value to its matching token.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Field → normalized synonym → canonical value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynonymTable {
    fields: BTreeMap<String, BTreeMap<String, String>>,
}

impl SynonymTable {
    /// An empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in synonyms.
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (field, pairs) in BUILTIN_SYNONYMS {
            for (synonym, canonical) in *pairs {
                table.insert(field, synonym, canonical);
            }
        }
        table
    }

    /// Add or replace a synonym. The synonym is normalized; the canonical
    /// value is stored verbatim.
    pub fn insert(&mut self, field: &str, synonym: &str, canonical: &str) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .insert(normalize_token(synonym), canonical.to_string());
    }

    /// Merge `other` into this table; entries in `other` win.
    pub fn extend(&mut self, other: &BTreeMap<String, BTreeMap<String, String>>) {
        for (field, pairs) in other {
            for (synonym, canonical) in pairs {
                self.insert(field, synonym, canonical);
            }
        }
    }

    /// Canonical value for a raw value of `field`, if one is listed.
    pub fn lookup(&self, field: &str, raw: &str) -> Option<&str> {
        self.fields
            .get(field)?
            .get(&normalize_token(raw))
            .map(String::as_str)
    }

    /// Fields with at least one synonym.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Every `(synonym, canonical)` pair listed for `field`.
    pub fn entries(&self, field: &str) -> Vec<(&str, &str)> {
        self.fields
            .get(field)
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(s, c)| (s.as_str(), c.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Resolves values against an allowed set using case folding and synonyms.
#[derive(Debug, Clone)]
pub struct EnumNormalizer {
    synonyms: SynonymTable,
}

impl Default for EnumNormalizer {
    fn default() -> Self {
        Self::new(SynonymTable::builtin())
    }
}

impl EnumNormalizer {
    pub fn new(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    /// The allowed member `raw` stands for, or `None` if it is already a
    /// member or nothing matches.
    pub fn resolve(&self, field: &str, raw: &str, allowed: &[&str]) -> Option<String> {
        if allowed.contains(&raw) {
            return None;
        }
        let token = normalize_token(raw);
        if let Some(member) = allowed.iter().find(|a| normalize_token(a) == token) {
            return Some((*member).to_string());
        }
        self.synonyms
            .lookup(field, raw)
            .filter(|canonical| allowed.contains(canonical))
            .map(str::to_string)
    }
}

/// Normalize every enum-constrained value in `document` against
/// `schema_file`, returning one action per rewritten value.
pub fn normalize_enums(
    document: &mut Value,
    schemas: &SchemaValidator,
    schema_file: &str,
    normalizer: &EnumNormalizer,
) -> Vec<RepairAction> {
    let mut actions = Vec::new();
    SchemaWalk::new(schemas).visit(
        schema_file,
        document,
        &mut |path: &FieldPath, schema: &Value, value: &mut Value| {
            let Some(allowed) = schema.get("enum").and_then(Value::as_array) else {
                return;
            };
            let allowed: Vec<&str> = allowed.iter().filter_map(Value::as_str).collect();
            let raw = match value {
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                _ => return,
            };
            let field = path.leaf_key().unwrap_or_default();
            if let Some(canonical) = normalizer.resolve(field, &raw, &allowed) {
                let before = std::mem::replace(value, Value::String(canonical));
                tracing::debug!(path = %path, from = %before, to = %value, "normalized enum value");
                actions.push(RepairAction::new(
                    RepairStep::NormalizeEnum,
                    path,
                    Some(before),
                    Some(value.clone()),
                    format!("{raw:?} is not a {field} value"),
                ));
            }
        },
    );
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhc_core::{ComplianceStatus, ConvergenceStatus, NodeType, PipeCircuit, PreferredOption};
    use serde_json::json;

    #[test]
    fn token_folds_case_space_and_dash() {
        assert_eq!(normalize_token("  Not-Converged "), "not_converged");
        assert_eq!(normalize_token("max iter"), "max_iter");
        assert_eq!(normalize_token("Rücklauf"), "rücklauf");
    }

    #[test]
    fn case_variants_map_to_member() {
        let n = EnumNormalizer::default();
        assert_eq!(n.resolve("power", "KW", &["W", "kW"]).as_deref(), Some("kW"));
        assert_eq!(
            n.resolve("node_type", "Plant", &["junction", "plant", "consumer"]).as_deref(),
            Some("plant")
        );
        assert_eq!(n.resolve("power", "kW", &["W", "kW"]), None);
    }

    #[test]
    fn synonyms_are_per_field() {
        let n = EnumNormalizer::default();
        let convergence = ConvergenceStatus::canonical_values();
        let compliance = ComplianceStatus::canonical_values();
        assert_eq!(n.resolve("convergence_status", "OK", &convergence).as_deref(), Some("converged"));
        assert_eq!(n.resolve("overall_status", "OK", &compliance).as_deref(), Some("pass"));
        assert_eq!(n.resolve("circuit", "Vorlauf", &["supply", "return"]).as_deref(), Some("supply"));
        assert_eq!(n.resolve("temperature", "°C", &["degC", "K"]).as_deref(), Some("degC"));
    }

    #[test]
    fn synonym_outside_allowed_set_is_ignored() {
        let n = EnumNormalizer::default();
        // check statuses have no not_evaluated member
        assert_eq!(n.resolve("overall_status", "skipped", &["pass", "warning", "fail"]), None);
        assert_eq!(n.resolve("circuit", "sideways", &["supply", "return"]), None);
    }

    #[test]
    fn builtin_targets_are_canonical() {
        let table = SynonymTable::builtin();
        let closed: &[(&str, Vec<&str>)] = &[
            ("convergence_status", ConvergenceStatus::canonical_values()),
            ("status", ComplianceStatus::canonical_values()),
            ("overall_status", ComplianceStatus::canonical_values()),
            ("circuit", PipeCircuit::canonical_values()),
            ("node_type", NodeType::canonical_values()),
            ("preferred_option", PreferredOption::canonical_values()),
        ];
        for (field, values) in closed {
            for (synonym, canonical) in table.entries(field) {
                assert!(values.contains(&canonical), "{field}: {synonym} -> {canonical}");
            }
        }
    }

    #[test]
    fn user_synonyms_extend_and_override() {
        let mut table = SynonymTable::builtin();
        let mut user = BTreeMap::new();
        user.insert(
            "circuit".to_string(),
            BTreeMap::from([("VL".to_string(), "supply".to_string())]),
        );
        user.insert(
            "status".to_string(),
            BTreeMap::from([("ok".to_string(), "warning".to_string())]),
        );
        table.extend(&user);
        assert_eq!(table.lookup("circuit", "vl"), Some("supply"));
        assert_eq!(table.lookup("status", "OK"), Some("warning"));
        assert_eq!(table.lookup("circuit", "vorlauf"), Some("supply"));
    }

    #[test]
    fn normalizes_nested_enum_values() {
        let schemas = SchemaValidator::builtin().unwrap();
        let mut doc = json!({
            "metadata": { "convergence_status": "Success" },
            "nodes": [{ "id": "a", "node_type": "building" }],
            "pipes": [{ "id": "p", "circuit": "Rücklauf" }],
            "compliance": { "overall_status": "OK", "checks": [{ "id": "v", "status": "passed" }] },
            "units": { "temperature": "Celsius", "power": "kw" }
        });
        let actions = normalize_enums(
            &mut doc,
            &schemas,
            "cha_output.schema.json",
            &EnumNormalizer::default(),
        );
        assert_eq!(doc["metadata"]["convergence_status"], "converged");
        assert_eq!(doc["nodes"][0]["node_type"], "consumer");
        assert_eq!(doc["pipes"][0]["circuit"], "return");
        assert_eq!(doc["compliance"]["overall_status"], "pass");
        assert_eq!(doc["compliance"]["checks"][0]["status"], "pass");
        assert_eq!(doc["units"]["temperature"], "degC");
        assert_eq!(doc["units"]["power"], "kW");
        assert_eq!(actions.len(), 7);
        assert!(actions.iter().all(|a| a.step == RepairStep::NormalizeEnum));
        assert!(actions.iter().any(|a| a.path == "pipes[0].circuit"));
    }

    #[test]
    fn boolean_convergence_flag_is_mapped() {
        let schemas = SchemaValidator::builtin().unwrap();
        let mut doc = json!({ "metadata": { "convergence_status": false } });
        normalize_enums(&mut doc, &schemas, "cha_output.schema.json", &EnumNormalizer::default());
        assert_eq!(doc["metadata"]["convergence_status"], "failed");
    }

    #[test]
    fn unknown_values_are_left_alone() {
        let schemas = SchemaValidator::builtin().unwrap();
        let mut doc = json!({ "metadata": { "convergence_status": "exploded" } });
        let actions = normalize_enums(&mut doc, &schemas, "cha_output.schema.json", &EnumNormalizer::default());
        assert!(actions.is_empty());
        assert_eq!(doc["metadata"]["convergence_status"], "exploded");
    }
}
