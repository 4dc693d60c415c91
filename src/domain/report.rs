use jsonschema::{Validator, validator_for};
use schemars::{JsonSchema, schema_for};
use serde_json::Value;

use crate::error::{ValidationIssue, ValidationReport};

/// A JSON Schema validator generated from a Rust type's `JsonSchema` impl.
pub(crate) struct SchemaCheck {
    validator: Result<Validator, String>,
}

impl SchemaCheck {
    pub(crate) fn for_type<T: JsonSchema>() -> Self {
        let validator = serde_json::to_value(schema_for!(T))
            .map_err(|err| err.to_string())
            .and_then(|schema| validator_for(&schema).map_err(|err| err.to_string()));
        Self { validator }
    }

    /// Collect every violation of `value`; an empty report means the value conforms.
    pub(crate) fn check(&self, value: &Value) -> ValidationReport {
        let validator = match &self.validator {
            Ok(validator) => validator,
            Err(message) => {
                return ValidationReport::single("", format!("schema unavailable: {message}"));
            }
        };
        if validator.is_valid(value) {
            return ValidationReport::default();
        }
        let issues = validator
            .iter_errors(value)
            .map(|error| ValidationIssue::new(error.instance_path.to_string(), error.to_string()))
            .collect();
        ValidationReport::new(issues)
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
