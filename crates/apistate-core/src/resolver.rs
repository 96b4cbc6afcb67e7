//! Evaluation of node expressions against JSON documents.
//!
//! The default [`PathResolver`] understands dot separated keys with optional
//! index suffixes: `user.first`, `names[1]`, `data[0].tags[2]`, or `[0]` for a
//! top-level array. An absent key is a resolution failure, never `nil`.

use std::fmt;

use serde_json::Value;

use crate::error::{CoreError, CoreResult};
use crate::value::JsonValue;

/// Resolves a path expression against a raw JSON document
pub trait NodeResolver: Send + Sync + fmt::Debug {
    fn resolve(&self, expression: &str, document: &[u8]) -> CoreResult<JsonValue>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve against an already decoded document.
    pub fn resolve_value(&self, expression: &str, root: &JsonValue) -> CoreResult<JsonValue> {
        let segments = parse_expression(expression)?;
        let mut current = root;

        for segment in &segments {
            current = match segment {
                Segment::Key(key) => match current {
                    Value::Object(map) => map.get(key.as_str()).ok_or_else(|| {
                        CoreError::resolution(expression, format!("key '{}' not found", key))
                    })?,
                    other => {
                        return Err(CoreError::resolution(
                            expression,
                            format!("cannot look up key '{}' in {}", key, kind_name(other)),
                        ))
                    }
                },
                Segment::Index(index) => match current {
                    Value::Array(items) => items.get(*index).ok_or_else(|| {
                        CoreError::resolution(
                            expression,
                            format!("index {} out of range for array of length {}", index, items.len()),
                        )
                    })?,
                    other => {
                        return Err(CoreError::resolution(
                            expression,
                            format!("cannot index {} with [{}]", kind_name(other), index),
                        ))
                    }
                },
            };
        }

        Ok(current.clone())
    }
}

impl NodeResolver for PathResolver {
    fn resolve(&self, expression: &str, document: &[u8]) -> CoreResult<JsonValue> {
        let root: Value = serde_json::from_slice(document).map_err(|e| {
            CoreError::resolution(expression, format!("document is not valid JSON: {}", e))
        })?;
        self.resolve_value(expression, &root)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse_expression(expression: &str) -> CoreResult<Vec<Segment>> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Err(CoreError::resolution(expression, "expression is empty"));
    }

    let mut segments = Vec::new();
    for part in trimmed.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(pos) => part.split_at(pos),
            None => (part, ""),
        };

        if key.is_empty() && rest.is_empty() {
            return Err(CoreError::resolution(expression, "empty path segment"));
        }
        if !key.is_empty() {
            segments.push(Segment::Key(key.to_string()));
        }

        while !rest.is_empty() {
            if !rest.starts_with('[') {
                return Err(CoreError::resolution(
                    expression,
                    format!("unexpected '{}' after index", rest),
                ));
            }
            let close = rest
                .find(']')
                .ok_or_else(|| CoreError::resolution(expression, "unclosed '['"))?;
            let index = rest[1..close].trim().parse::<usize>().map_err(|_| {
                CoreError::resolution(
                    expression,
                    format!("'{}' is not a valid array index", &rest[1..close]),
                )
            })?;
            segments.push(Segment::Index(index));
            rest = &rest[close + 1..];
        }
    }

    Ok(segments)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DOCUMENT: &[u8] = br#"{
        "user": {"first": "a", "middle": null, "age": 30},
        "names": ["a", "b"],
        "data": [{"id": 1, "tags": ["x", "y", "z"]}]
    }"#;

    #[test]
    fn test_resolve_nested_keys_and_indexes() {
        let resolver = PathResolver::new();

        assert_eq!(resolver.resolve("user.first", DOCUMENT).unwrap(), json!("a"));
        assert_eq!(resolver.resolve("user.age", DOCUMENT).unwrap(), json!(30));
        assert_eq!(resolver.resolve("names", DOCUMENT).unwrap(), json!(["a", "b"]));
        assert_eq!(resolver.resolve("names[1]", DOCUMENT).unwrap(), json!("b"));
        assert_eq!(resolver.resolve("data[0].tags[2]", DOCUMENT).unwrap(), json!("z"));
        assert_eq!(resolver.resolve(" user.first ", DOCUMENT).unwrap(), json!("a"));
    }

    #[test]
    fn test_null_value_differs_from_absent_key() {
        let resolver = PathResolver::new();

        assert_eq!(resolver.resolve("user.middle", DOCUMENT).unwrap(), json!(null));
        assert!(matches!(
            resolver.resolve("user.last", DOCUMENT),
            Err(CoreError::Resolution { ref expression, .. }) if expression == "user.last"
        ));
    }

    #[test]
    fn test_root_array_index() {
        let resolver = PathResolver::new();
        assert_eq!(resolver.resolve("[1].id", br#"[{"id": 1}, {"id": 2}]"#).unwrap(), json!(2));
    }

    #[test]
    fn test_resolution_failures() {
        let resolver = PathResolver::new();
        let failing = [
            "",
            "name",
            "names[5]",
            "user[0]",
            "names.first",
            "user..first",
            "names[x]",
            "names[0",
        ];

        for expression in failing {
            assert!(
                matches!(resolver.resolve(expression, DOCUMENT), Err(CoreError::Resolution { .. })),
                "expected '{}' to fail",
                expression
            );
        }
    }

    #[test]
    fn test_invalid_document() {
        let err = PathResolver::new().resolve("a", b"not json").unwrap_err();
        assert!(err.to_string().contains("document is not valid JSON"));
    }
}
