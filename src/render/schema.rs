use serde_json::Value;

use super::error::{MalformedSchema, ParameterIssue, ParameterValidationError, SchemaError};
use crate::models::Params;

/// Validate a parameter set against a template's stored JSON Schema.
///
/// Templates without a schema (absent or blank text) accept any parameters.
/// Every failed constraint is collected, not only the first.
pub fn validate_params(schema: Option<&str>, params: &Params) -> Result<(), SchemaError> {
    let schema_text = match schema {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(()),
    };

    let schema: Value = serde_json::from_str(schema_text).map_err(|e| MalformedSchema {
        reason: format!("invalid JSON: {}", e),
    })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| MalformedSchema {
        reason: format!("invalid JSON Schema: {}", e),
    })?;

    let instance = Value::Object(params.clone());
    let issues: Vec<ParameterIssue> = validator
        .iter_errors(&instance)
        .map(|e| ParameterIssue {
            instance_path: e.instance_path.to_string(),
            schema_path: e.schema_path.to_string(),
            message: e.to_string(),
        })
        .collect();

    match ParameterValidationError::from_issues(issues) {
        None => Ok(()),
        Some(e) => Err(e.into()),
    }
}
