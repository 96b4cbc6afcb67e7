//! Semantic classification of decoded JSON nodes.
//!
//! JSON carries a single numeric representation, so integers and floats are
//! told apart by numeric value: a number whose fractional part is exactly zero
//! is an `int` (`2.0` included), anything else is a `float`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::CoreError;

/// Dynamically typed JSON node as produced by a node resolver.
pub type JsonValue = Value;

/// Type names accepted by type and value assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Nil,
    String,
    Int,
    Float,
    Bool,
    Map,
    Slice,
}

impl SemanticType {
    pub const ALL: [SemanticType; 7] = [
        SemanticType::Nil,
        SemanticType::String,
        SemanticType::Int,
        SemanticType::Float,
        SemanticType::Bool,
        SemanticType::Map,
        SemanticType::Slice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Nil => "nil",
            SemanticType::String => "string",
            SemanticType::Int => "int",
            SemanticType::Float => "float",
            SemanticType::Bool => "bool",
            SemanticType::Map => "map",
            SemanticType::Slice => "slice",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SemanticType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnsupportedType(s.to_string()))
    }
}

/// Classify a JSON node into one of the seven semantic types.
pub fn classify(value: &JsonValue) -> SemanticType {
    match value {
        Value::Null => SemanticType::Nil,
        Value::Bool(_) => SemanticType::Bool,
        Value::String(_) => SemanticType::String,
        Value::Array(_) => SemanticType::Slice,
        Value::Object(_) => SemanticType::Map,
        Value::Number(n) => classify_number(n),
    }
}

fn classify_number(n: &Number) -> SemanticType {
    if n.is_i64() || n.is_u64() {
        return SemanticType::Int;
    }

    match n.as_f64() {
        Some(f) if f.fract() != 0.0 => SemanticType::Float,
        _ => SemanticType::Int,
    }
}

/// Canonical text of a JSON node when substituted into a template.
///
/// Strings are emitted verbatim (no quotes); integral floats lose their
/// fractional part so `2.0` renders as `2`.
pub fn to_template_string(value: &JsonValue) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(n),
        other => other.to_string(),
    }
}

// Integral floats beyond this magnitude keep serde_json's exponent formatting.
const MAX_EXACT_INTEGRAL_FLOAT: f64 = 9_007_199_254_740_992.0;

fn number_to_string(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGRAL_FLOAT {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}
