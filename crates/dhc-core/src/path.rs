//! # Dotted Field Paths
//!
//! Downstream consumers describe the fields they read as dotted paths
//! (`kpis.hydraulic.max_velocity_ms`). [`FieldPath`] parses that notation
//! once and resolves it against a `serde_json::Value`.
//!
//! ## Syntax
//!
//! - Segments are separated by `.`.
//! - A segment made only of digits indexes an array when the current value
//!   is an array, and is an object key otherwise (`pipes.0.id`).
//! - Bracketed indices are accepted as well: `pipes[0].id`.
//! - Empty paths and empty segments (`a..b`, `.a`) are rejected.
//!
//! Validator output uses JSON Pointers (`/kpis/hydraulic`);
//! [`FieldPath::from_json_pointer`] converts them so every report speaks
//! the same dotted notation.

use serde_json::{Map, Value};
use std::str::FromStr;

use crate::error::DhcError;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member name.
    Key(String),
    /// Array position. Also matches an object key spelled as the number.
    Index(usize),
}

impl PathSegment {
    fn as_key(&self) -> String {
        match self {
            Self::Key(k) => k.clone(),
            Self::Index(i) => i.to_string(),
        }
    }
}

/// Parsed dotted path into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Parse dotted notation. See the module docs for the accepted syntax.
    pub fn parse(path: &str) -> Result<Self, DhcError> {
        let invalid = |reason: &str| DhcError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        if path.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for raw in path.split('.') {
            let (name, indices) = match raw.find('[') {
                Some(pos) => (&raw[..pos], &raw[pos..]),
                None => (raw, ""),
            };

            if name.is_empty() && indices.is_empty() {
                return Err(invalid("empty segment"));
            }
            if !name.is_empty() {
                segments.push(match name.parse::<usize>() {
                    Ok(i) if name.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(i),
                    _ => PathSegment::Key(name.to_string()),
                });
            }

            let mut rest = indices;
            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| invalid("unclosed '['"))?;
                let index = rest[1..close]
                    .parse::<usize>()
                    .map_err(|_| invalid("bracket index is not a non-negative integer"))?;
                segments.push(PathSegment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid("unexpected text after ']'"));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Convert an RFC 6901 JSON Pointer (`/pipes/0/id`) to a path.
    pub fn from_json_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|raw| {
                let key = raw.replace("~1", "/").replace("~0", "~");
                match key.parse::<usize>() {
                    Ok(i) if key.bytes().all(|b| b.is_ascii_digit()) => PathSegment::Index(i),
                    _ => PathSegment::Key(key),
                }
            })
            .collect();
        Self { segments }
    }

    /// Render as an RFC 6901 JSON Pointer.
    pub fn to_json_pointer(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("/{}", s.as_key().replace('~', "~0").replace('/', "~1")))
            .collect()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a member name.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self { segments }
    }

    /// Append an array index.
    pub fn index(&self, i: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Index(i));
        Self { segments }
    }

    /// Last member name, if the path ends in a key.
    pub fn leaf_key(&self) -> Option<&str> {
        match self.segments.last()? {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    /// Resolve against a document.
    pub fn lookup<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(document, |current, segment| step(current, segment))
    }

    /// Resolve against a document for mutation.
    pub fn lookup_mut<'a>(&self, document: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = document;
        for segment in &self.segments {
            current = step_mut(current, segment)?;
        }
        Some(current)
    }

    /// Whether the path resolves. A present `null` counts as existing.
    pub fn exists(&self, document: &Value) -> bool {
        self.lookup(document).is_some()
    }

    /// Write `value` at this path, creating missing intermediate objects.
    ///
    /// Never creates array slots and never replaces an existing non-object
    /// value with an object.
    pub fn set(&self, document: &mut Value, value: Value) -> Result<(), DhcError> {
        let Some((last, parents)) = self.segments.split_last() else {
            *document = value;
            return Ok(());
        };

        let mut current = document;
        for (depth, segment) in parents.iter().enumerate() {
            let here = || self.prefix(depth + 1).to_string();
            current = match (current, segment) {
                (Value::Array(items), PathSegment::Index(i)) => {
                    let len = items.len();
                    items.get_mut(*i).ok_or_else(|| DhcError::PathConflict {
                        path: here(),
                        reason: format!("index out of bounds (len {len})"),
                    })?
                }
                (Value::Object(map), segment) => map
                    .entry(segment.as_key())
                    .or_insert_with(|| Value::Object(Map::new())),
                (other, _) => {
                    return Err(DhcError::PathConflict {
                        path: here(),
                        reason: format!("parent is a {}, not an object", type_name(other)),
                    })
                }
            };
        }

        match (current, last) {
            (Value::Object(map), segment) => {
                map.insert(segment.as_key(), value);
                Ok(())
            }
            (Value::Array(items), PathSegment::Index(i)) if *i < items.len() => {
                items[*i] = value;
                Ok(())
            }
            (other, _) => Err(DhcError::PathConflict {
                path: self.to_string(),
                reason: format!("parent is a {}", type_name(other)),
            }),
        }
    }

    /// Remove the value at this path, returning it.
    pub fn remove(&self, document: &mut Value) -> Option<Value> {
        let (last, parents) = self.segments.split_last()?;
        let parent = Self { segments: parents.to_vec() }.lookup_mut(document)?;
        match (parent, last) {
            (Value::Object(map), segment) => map.remove(&segment.as_key()),
            (Value::Array(items), PathSegment::Index(i)) if *i < items.len() => {
                Some(items.remove(*i))
            }
            _ => None,
        }
    }

    fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments[..len.min(self.segments.len())].to_vec(),
        }
    }
}

fn step<'a>(current: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (current, segment) {
        (Value::Object(map), PathSegment::Key(k)) => map.get(k),
        (Value::Object(map), PathSegment::Index(i)) => map.get(&i.to_string()),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i),
        _ => None,
    }
}

fn step_mut<'a>(current: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (current, segment) {
        (Value::Object(map), PathSegment::Key(k)) => map.get_mut(k),
        (Value::Object(map), PathSegment::Index(i)) => map.get_mut(&i.to_string()),
        (Value::Array(items), PathSegment::Index(i)) => items.get_mut(*i),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl std::fmt::Display for FieldPath {
    /// Dotted form; array indices render as `[i]` (`pipes[0].id`).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(k) if i == 0 => write!(f, "{k}")?,
                PathSegment::Key(k) => write!(f, ".{k}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = DhcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Return the paths from `paths` that do not resolve in `document`.
///
/// Paths that fail to parse are reported as missing too, so a typo in a
/// consumer's field list can't silently pass.
pub fn missing_fields<'p>(document: &Value, paths: &[&'p str]) -> Vec<&'p str> {
    paths
        .iter()
        .copied()
        .filter(|p| {
            FieldPath::parse(p)
                .map(|path| !path.exists(document))
                .unwrap_or(true)
        })
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-z_]{1,12}".prop_map(PathSegment::Key),
            (0usize..50).prop_map(PathSegment::Index),
        ]
    }

    proptest! {
        /// Display output parses back to the same path.
        #[test]
        fn display_parse_roundtrip(
            first in "[a-z_]{1,12}",
            rest in prop::collection::vec(segment(), 0..6),
        ) {
            let mut segments = vec![PathSegment::Key(first)];
            segments.extend(rest);
            let path = FieldPath { segments };
            let reparsed = FieldPath::parse(&path.to_string()).unwrap();
            prop_assert_eq!(reparsed, path);
        }

        /// JSON Pointer rendering round-trips.
        #[test]
        fn json_pointer_roundtrip(segments in prop::collection::vec(segment(), 0..6)) {
            let path = FieldPath { segments };
            let back = FieldPath::from_json_pointer(&path.to_json_pointer());
            prop_assert_eq!(back, path);
        }
    }
}
