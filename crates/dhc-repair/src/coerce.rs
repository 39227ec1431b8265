//! # Type Coercion
//!
//! Schema-driven conversion of stringly-typed scalars. Where the schema
//! types a location as `number` or `integer`, a string that parses as a
//! finite number becomes that number; an integral float under `integer`
//! becomes an integer. Where it says `boolean`, `"true"`/`"false"` become
//! booleans. Locations that also allow `string` are never touched, and
//! strings that do not parse are left for re-validation to report.

use dhc_core::FieldPath;
use dhc_schema::SchemaValidator;
use serde_json::{Number, Value};

use crate::action::{RepairAction, RepairStep};
use crate::walk::SchemaWalk;

/// JSON types a schema node admits.
fn schema_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Parse a numeric string. With `integer_only`, fractional values are
/// rejected rather than truncated.
fn parse_number(raw: &str, integer_only: bool) -> Option<Number> {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    let f = trimmed.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if integer_only {
        return integral(f).map(Number::from);
    }
    Number::from_f64(f)
}

fn integral(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// The coerced form of `value`, if a coercion applies.
fn coerce_value(value: &Value, types: &[&str]) -> Option<(Value, &'static str)> {
    let wants_integer = types.contains(&"integer");
    let wants_number = types.contains(&"number");
    match value {
        Value::String(_) if types.contains(&"string") => None,
        Value::String(s) if wants_number || wants_integer => {
            parse_number(s, !wants_number).map(|n| (Value::Number(n), "numeric string"))
        }
        Value::String(s) if types.contains(&"boolean") => match s.trim().to_lowercase().as_str() {
            "true" => Some((Value::Bool(true), "boolean string")),
            "false" => Some((Value::Bool(false), "boolean string")),
            _ => None,
        },
        Value::Number(n) if wants_integer && !wants_number && !n.is_i64() && !n.is_u64() => n
            .as_f64()
            .and_then(integral)
            .map(|i| (Value::Number(Number::from(i)), "integral float")),
        _ => None,
    }
}

/// Coerce every typed scalar in `document` against `schema_file`.
pub fn coerce_types(
    document: &mut Value,
    schemas: &SchemaValidator,
    schema_file: &str,
) -> Vec<RepairAction> {
    let mut actions = Vec::new();
    SchemaWalk::new(schemas).visit(
        schema_file,
        document,
        &mut |path: &FieldPath, schema: &Value, value: &mut Value| {
            let types = schema_types(schema);
            if types.is_empty() {
                return;
            }
            if let Some((coerced, reason)) = coerce_value(value, &types) {
                let before = std::mem::replace(value, coerced);
                tracing::debug!(path = %path, from = %before, to = %value, "coerced value");
                actions.push(RepairAction::new(
                    RepairStep::CoerceType,
                    path,
                    Some(before),
                    Some(value.clone()),
                    format!("{reason} where {} expected", types.join(" or ")),
                ));
            }
        },
    );
    actions
}
