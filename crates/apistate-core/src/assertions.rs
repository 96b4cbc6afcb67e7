//! Type and value assertions on JSON nodes.
//!
//! Every assertion returns its failure to the caller; nothing here retries,
//! panics or aborts the run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cache::Cache;
use crate::duration::parse_duration;
use crate::error::{CoreError, CoreResult};
use crate::resolver::NodeResolver;
use crate::template::TemplateEngine;
use crate::value::{classify, JsonValue, SemanticType};

/// Split a comma separated list of node expressions, trimming whitespace.
pub fn split_expressions(expressions: &str) -> Vec<&str> {
    expressions
        .split(',')
        .map(str::trim)
        .filter(|expr| !expr.is_empty())
        .collect()
}

/// Assertion engine bound to a template engine and a node resolver
#[derive(Debug, Clone)]
pub struct AssertionEngine {
    templates: Arc<dyn TemplateEngine>,
    resolver: Arc<dyn NodeResolver>,
}

impl AssertionEngine {
    pub fn new(templates: Arc<dyn TemplateEngine>, resolver: Arc<dyn NodeResolver>) -> Self {
        Self { templates, resolver }
    }

    pub fn resolve_node(&self, expression: &str, document: &[u8]) -> CoreResult<JsonValue> {
        self.resolver.resolve(expression, document)
    }

    pub fn should_be(&self, expression: &str, value: &JsonValue, requested: &str) -> CoreResult<()> {
        let requested: SemanticType = requested.parse()?;
        let actual = classify(value);

        if actual != requested {
            return Err(CoreError::TypeMismatch {
                expression: expression.to_string(),
                requested,
                actual,
            });
        }
        Ok(())
    }

    pub fn should_not_be(
        &self,
        expression: &str,
        value: &JsonValue,
        requested: &str,
    ) -> CoreResult<()> {
        let rejected: SemanticType = requested.parse()?;

        if classify(value) == rejected {
            return Err(CoreError::UnexpectedType {
                expression: expression.to_string(),
                rejected,
            });
        }
        Ok(())
    }

    /// Compare a node with an expected literal of the requested type.
    ///
    /// The literal is template-expanded against `cache` before anything else.
    pub fn value_equals(
        &self,
        cache: &dyn Cache,
        expression: &str,
        value: &JsonValue,
        requested: &str,
        expected_literal: &str,
    ) -> CoreResult<()> {
        let expected = self.templates.resolve(expected_literal, cache)?;
        let semantic_type: SemanticType = requested.parse()?;

        let check = ValueCheck {
            expression,
            semantic_type,
            literal: &expected,
        };

        match semantic_type {
            SemanticType::String => {
                let actual = value.as_str().ok_or_else(|| check.wrong_kind(value))?;
                check.equal(actual == expected, actual)
            }
            SemanticType::Int => {
                let number = value.as_f64().ok_or_else(|| check.wrong_kind(value))?;
                let truncated = number.trunc() as i64;
                let wanted: i64 = expected.trim().parse().map_err(|_| check.invalid_literal())?;
                check.equal(truncated == wanted, truncated)
            }
            SemanticType::Float => {
                let actual = value.as_f64().ok_or_else(|| check.wrong_kind(value))?;
                let wanted: f64 = expected.trim().parse().map_err(|_| check.invalid_literal())?;
                check.equal(actual == wanted, actual)
            }
            SemanticType::Bool => {
                let actual = value.as_bool().ok_or_else(|| check.wrong_kind(value))?;
                let wanted: bool = expected.trim().parse().map_err(|_| check.invalid_literal())?;
                check.equal(actual == wanted, actual)
            }
            SemanticType::Nil => {
                if !value.is_null() {
                    return Err(check.wrong_kind(value));
                }
                match expected.trim() {
                    "nil" | "null" => Ok(()),
                    _ => Err(check.invalid_literal()),
                }
            }
            SemanticType::Map | SemanticType::Slice => {
                if classify(value) != semantic_type {
                    return Err(check.wrong_kind(value));
                }
                let wanted: Value =
                    serde_json::from_str(&expected).map_err(|_| check.invalid_literal())?;
                if classify(&wanted) != semantic_type {
                    return Err(check.invalid_literal());
                }
                check.equal(*value == wanted, value)
            }
        }
    }

    pub fn slice_length(&self, expression: &str, value: &JsonValue, expected: usize) -> CoreResult<()> {
        let items = value.as_array().ok_or_else(|| CoreError::NotASlice {
            expression: expression.to_string(),
            actual: classify(value),
        })?;

        if items.len() != expected {
            return Err(CoreError::LengthMismatch {
                expression: expression.to_string(),
                expected,
                actual: items.len(),
            });
        }
        Ok(())
    }

    /// Resolve every expression against `document`, collecting all failures.
    ///
    /// An empty list is a resolution failure rather than a vacuous success.
    pub fn nodes_exist<S: AsRef<str>>(&self, document: &[u8], expressions: &[S]) -> CoreResult<()> {
        if expressions.is_empty() {
            return Err(CoreError::resolution("", "no node expressions given"));
        }

        let failures: Vec<CoreError> = expressions
            .iter()
            .filter_map(|expr| self.resolver.resolve(expr.as_ref(), document).err())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MultiNode(failures))
        }
    }

    pub fn elapsed_within(
        &self,
        request_sent: DateTime<Utc>,
        response_received: DateTime<Utc>,
        max_duration: &str,
    ) -> CoreResult<()> {
        let limit = parse_duration(max_duration)?;
        // A response stamped before its request counts as zero elapsed time.
        let elapsed = (response_received - request_sent).to_std().unwrap_or_default();

        if elapsed > limit {
            return Err(CoreError::DurationExceeded { elapsed, limit });
        }
        Ok(())
    }
}

struct ValueCheck<'a> {
    expression: &'a str,
    semantic_type: SemanticType,
    literal: &'a str,
}

impl ValueCheck<'_> {
    fn wrong_kind(&self, value: &JsonValue) -> CoreError {
        CoreError::TypeMismatch {
            expression: self.expression.to_string(),
            requested: self.semantic_type,
            actual: classify(value),
        }
    }

    fn invalid_literal(&self) -> CoreError {
        CoreError::InvalidLiteral {
            expression: self.expression.to_string(),
            literal: self.literal.to_string(),
            semantic_type: self.semantic_type,
        }
    }

    fn equal(&self, matches: bool, actual: impl ToString) -> CoreResult<()> {
        if matches {
            return Ok(());
        }
        Err(CoreError::ValueMismatch {
            expression: self.expression.to_string(),
            semantic_type: self.semantic_type,
            expected: self.literal.to_string(),
            actual: actual.to_string(),
        })
    }
}
