//! Parallel walk of a document and the schema describing it.
//!
//! Follows `properties` into objects and `items` into arrays, resolving
//! `$ref`s (same-file fragments and `file.schema.json#/pointer`) against
//! the validator's loaded schemas. Members the schema does not describe
//! are not visited.

use dhc_core::FieldPath;
use dhc_schema::SchemaValidator;
use serde_json::Value;

/// Chained `$ref`s longer than this are treated as unresolvable.
const MAX_REF_DEPTH: usize = 16;

pub(crate) struct SchemaWalk<'a> {
    schemas: &'a SchemaValidator,
}

impl<'a> SchemaWalk<'a> {
    pub(crate) fn new(schemas: &'a SchemaValidator) -> Self {
        Self { schemas }
    }

    /// Visit every described node of `document`, parents before children.
    ///
    /// The visitor receives the resolved schema node and may rewrite the
    /// value in place; children are read after the rewrite.
    pub(crate) fn visit<F>(&self, schema_file: &str, document: &mut Value, visitor: &mut F)
    where
        F: FnMut(&FieldPath, &Value, &mut Value),
    {
        let Some(root) = self.schemas.get_schema(schema_file) else {
            tracing::warn!(schema = schema_file, "schema not loaded; nothing to walk");
            return;
        };
        self.walk(root, root, document, &FieldPath::root(), visitor);
    }

    fn walk<F>(
        &self,
        root: &'a Value,
        schema: &'a Value,
        value: &mut Value,
        path: &FieldPath,
        visitor: &mut F,
    ) where
        F: FnMut(&FieldPath, &Value, &mut Value),
    {
        let Some((root, schema)) = self.resolve(root, schema) else {
            tracing::debug!(path = %path, "unresolvable $ref; subtree skipped");
            return;
        };

        visitor(path, schema, value);

        match value {
            Value::Object(map) => {
                let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                    return;
                };
                for (key, child) in map.iter_mut() {
                    if let Some(sub) = properties.get(key) {
                        self.walk(root, sub, child, &path.child(key), visitor);
                    }
                }
            }
            Value::Array(items) => {
                let Some(item_schema) = schema.get("items") else {
                    return;
                };
                for (i, item) in items.iter_mut().enumerate() {
                    self.walk(root, item_schema, item, &path.index(i), visitor);
                }
            }
            _ => {}
        }
    }

    /// Follow `$ref` until a schema node without one, returning the schema
    /// file root it lives in alongside it.
    fn resolve(&self, mut root: &'a Value, mut node: &'a Value) -> Option<(&'a Value, &'a Value)> {
        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
                return Some((root, node));
            };
            let (file, fragment) = reference.split_once('#').unwrap_or((reference, ""));
            if !file.is_empty() {
                let filename = file.rsplit('/').next().unwrap_or(file);
                root = self.schemas.get_schema(filename)?;
            }
            node = if fragment.is_empty() {
                root
            } else {
                root.pointer(fragment)?
            };
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn follows_refs_into_common_definitions() {
        let schemas = SchemaValidator::builtin().unwrap();
        let mut doc = json!({
            "metadata": { "iterations": 3, "cluster_id": "c" },
            "pipes": [{ "length_m": 1.0 }, { "length_m": 2.0 }],
            "unknown": { "x": 1 }
        });
        let mut seen = Vec::new();
        SchemaWalk::new(&schemas).visit(
            "cha_output.schema.json",
            &mut doc,
            &mut |path: &FieldPath, schema: &Value, _: &mut Value| {
                seen.push((path.to_string(), schema.get("type").cloned()));
            },
        );
        assert!(seen.contains(&("metadata.iterations".into(), Some(json!("integer")))));
        assert!(seen.contains(&("metadata.cluster_id".into(), Some(json!("string")))));
        assert!(seen.contains(&("pipes[1].length_m".into(), Some(json!("number")))));
        assert!(!seen.iter().any(|(p, _)| p.starts_with("unknown")));
    }

    #[test]
    fn visitor_rewrites_are_visible_to_children() {
        let schemas = SchemaValidator::builtin().unwrap();
        let mut doc = json!({ "crs": "25833" });
        SchemaWalk::new(&schemas).visit(
            "cha_output.schema.json",
            &mut doc,
            &mut |path: &FieldPath, _: &Value, value: &mut Value| {
                if path.to_string() == "crs" {
                    *value = json!({ "epsg": 25833 });
                }
            },
        );
        assert_eq!(doc["crs"]["epsg"], 25833);
    }
}
