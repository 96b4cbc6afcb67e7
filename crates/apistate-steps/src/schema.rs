//! JSON schema validation of response bodies.
//!
//! Two validators are provided: one loads schemas from files referenced by
//! path, the other compiles an inline schema document.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonschema::JSONSchema;
use serde_json::Value;
use tracing::debug;

use crate::error::{StepError, StepResult};

/// Validates a JSON document against a schema identified by `schema`
pub trait SchemaValidator: Send + Sync + fmt::Debug {
    fn validate(&self, document: &[u8], schema: &str) -> StepResult<()>;
}

/// Treats `schema` as a file path, relative paths resolved against `schema_dir`
#[derive(Debug, Clone, Default)]
pub struct ReferenceSchemaValidator {
    schema_dir: Option<PathBuf>,
}

impl ReferenceSchemaValidator {
    pub fn new(schema_dir: Option<PathBuf>) -> Self {
        Self { schema_dir }
    }

    fn locate(&self, reference: &str) -> PathBuf {
        let reference = reference.strip_prefix("file://").unwrap_or(reference);
        let path = Path::new(reference);
        match &self.schema_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl SchemaValidator for ReferenceSchemaValidator {
    fn validate(&self, document: &[u8], schema: &str) -> StepResult<()> {
        let path = self.locate(schema);
        debug!(path = %path.display(), "Loading JSON schema");

        let raw = fs::read(&path).map_err(|e| {
            StepError::Schema(format!("could not read schema {}: {}", path.display(), e))
        })?;
        let schema: Value = serde_json::from_slice(&raw)
            .map_err(|e| StepError::Schema(format!("schema {} is not valid JSON: {}", path.display(), e)))?;

        validate_document(document, &schema)
    }
}

/// Treats `schema` as the schema document itself
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineSchemaValidator;

impl SchemaValidator for InlineSchemaValidator {
    fn validate(&self, document: &[u8], schema: &str) -> StepResult<()> {
        let schema: Value = serde_json::from_str(schema)
            .map_err(|e| StepError::Schema(format!("schema is not valid JSON: {}", e)))?;
        validate_document(document, &schema)
    }
}

fn validate_document(document: &[u8], schema: &Value) -> StepResult<()> {
    let compiled = JSONSchema::compile(schema)
        .map_err(|e| StepError::Schema(format!("invalid schema: {}", e)))?;

    let instance: Value = serde_json::from_slice(document)
        .map_err(|e| StepError::Schema(format!("document is not valid JSON: {}", e)))?;

    let messages: Vec<String> = match compiled.validate(&instance) {
        Ok(()) => return Ok(()),
        Err(errors) => errors
            .map(|error| format!("{} (at '{}')", error, error.instance_path))
            .collect(),
    };

    Err(StepError::Schema(messages.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const USER_SCHEMA: &str = r#"{
        "type": "object",
        "required": ["id", "name"],
        "properties": {
            "id": {"type": "integer"},
            "name": {"type": "string"}
        }
    }"#;

    #[test]
    fn test_inline_schema() {
        let validator = InlineSchemaValidator;

        assert!(validator.validate(br#"{"id": 1, "name": "john"}"#, USER_SCHEMA).is_ok());

        let err = validator.validate(br#"{"id": "1"}"#, USER_SCHEMA).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("name"), "{}", message);
        assert!(message.contains("/id"), "{}", message);
    }

    #[test]
    fn test_inline_schema_rejects_bad_inputs() {
        let validator = InlineSchemaValidator;
        assert!(matches!(
            validator.validate(b"{}", "not a schema"),
            Err(StepError::Schema(_))
        ));
        assert!(matches!(
            validator.validate(b"<html>", USER_SCHEMA),
            Err(StepError::Schema(_))
        ));
    }

    #[test]
    fn test_reference_schema_relative_to_schema_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("user.json")).unwrap();
        file.write_all(USER_SCHEMA.as_bytes()).unwrap();

        let validator = ReferenceSchemaValidator::new(Some(dir.path().to_path_buf()));
        assert!(validator.validate(br#"{"id": 1, "name": "a"}"#, "user.json").is_ok());
        assert!(validator.validate(br#"{"id": 1}"#, "user.json").is_err());

        let absolute = dir.path().join("user.json");
        let validator = ReferenceSchemaValidator::default();
        assert!(validator
            .validate(br#"{"id": 1, "name": "a"}"#, &absolute.to_string_lossy())
            .is_ok());
    }

    #[test]
    fn test_reference_schema_missing_file() {
        let validator = ReferenceSchemaValidator::default();
        let err = validator.validate(b"{}", "/definitely/missing/schema.json").unwrap_err();
        assert!(err.to_string().contains("could not read schema"));
    }
}
